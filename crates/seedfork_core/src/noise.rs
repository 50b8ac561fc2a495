//! Lattice value noise seeded from a random source.

use crate::error::Result;
use crate::source::RandomSource;

#[derive(Clone, Debug)]
pub struct ValueNoise {
    size: usize,
    values: Vec<f64>,
    permutation: Vec<usize>,
}

impl ValueNoise {
    /// Draw a `size`-wide lattice and permutation table from `source`.
    pub fn from_source<R: RandomSource>(source: &mut R, size: usize) -> Result<Self> {
        let size = size.max(2);
        let values = (0..size).map(|_| source.float()).collect();
        let mut permutation: Vec<usize> = (0..size).collect();
        for index in (1..size).rev() {
            let swap = source.int(0, index as i64)? as usize;
            permutation.swap(index, swap);
        }
        Ok(Self {
            size,
            values,
            permutation,
        })
    }

    /// Smoothly interpolated value in `[0, 1)` at `(x, y)`.
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        let (x0, tx) = split(x);
        let (y0, ty) = split(y);
        let corner = |dx: i64, dy: i64| self.lattice(x0 + dx, y0 + dy);
        let top = lerp(corner(0, 0), corner(1, 0), smoothstep(tx));
        let bottom = lerp(corner(0, 1), corner(1, 1), smoothstep(tx));
        lerp(top, bottom, smoothstep(ty))
    }

    /// Fractal sum of `octaves` samples, normalised back into `[0, 1)`.
    pub fn fbm(&self, x: f64, y: f64, octaves: u8) -> f64 {
        let mut total = 0.0;
        let mut norm = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        for _ in 0..octaves.max(1) {
            total += self.sample(x * frequency, y * frequency) * amplitude;
            norm += amplitude;
            amplitude *= 0.5;
            frequency *= 2.0;
        }
        total / norm
    }

    fn lattice(&self, x: i64, y: i64) -> f64 {
        let size = self.size as i64;
        let px = self.permutation[x.rem_euclid(size) as usize];
        let index = self.permutation[(px as i64 + y).rem_euclid(size) as usize];
        self.values[index]
    }
}

fn split(coordinate: f64) -> (i64, f64) {
    let floor = coordinate.floor();
    (floor as i64, coordinate - floor)
}

fn smoothstep(t: f64) -> f64 {
    t * t * (3.0 - 2.0 * t)
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}
