//! The capability interface every random source satisfies.

use crate::ambient;
use crate::derive::{derive, fmix32};
use crate::error::{RandomError, Result};
use crate::stream::MODULUS;

/// Width of the raw draw range `[1, MODULUS - 1]`, as the unit-interval divisor.
const DRAW_SPAN: f64 = (MODULUS - 1) as f64;

/// Number of distinct raw draws.
const DRAW_VALUES: u128 = (MODULUS - 1) as u128;

/// Source of uniformly distributed values.
///
/// Implementors supply [`RandomSource::draw`]; every derived operation is
/// defined on top of it so all sources agree on how raw draws become values.
pub trait RandomSource {
    /// Advance and return a raw value in `[1, 2^31 - 2]`.
    fn draw(&mut self) -> u32;

    /// Uniform `f64` in `[0, 1)`.
    fn float(&mut self) -> f64 {
        f64::from(self.draw() - 1) / DRAW_SPAN
    }

    /// Uniform `f64` in `[min, max)`; `min == max` yields `min`.
    ///
    /// Both bounds must be finite. Interpolating the bounds directly keeps the
    /// result finite even when `max - min` overflows.
    fn range(&mut self, min: f64, max: f64) -> Result<f64> {
        if !(min <= max) || !min.is_finite() || !max.is_finite() {
            return Err(RandomError::InvalidRange { min, max });
        }
        if min == max {
            return Ok(min);
        }
        let t = self.float();
        let value = min * (1.0 - t) + max * t;
        Ok(value.max(min).min(next_below(max)))
    }

    /// Uniform integer in `[min, max]`, inclusive at both ends.
    fn int(&mut self, min: i64, max: i64) -> Result<i64> {
        if min > max {
            return Err(RandomError::InvalidRange {
                min: min as f64,
                max: max as f64,
            });
        }
        let span = i128::from(max) - i128::from(min) + 1;
        let offset = if span <= DRAW_VALUES as i128 {
            ((self.float() * span as f64) as i128).min(span - 1)
        } else {
            wide_offset(self, span as u128) as i128
        };
        Ok((i128::from(min) + offset) as i64)
    }

    /// True with probability `p`, clamped to `[0, 1]`. Always consumes one draw.
    fn chance(&mut self, p: f64) -> bool {
        let p = if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) };
        self.float() < p
    }

    /// Uniformly chosen element of `items`.
    fn pick<'a, T>(&mut self, items: &'a [T]) -> Result<&'a T>
    where
        Self: Sized,
    {
        if items.is_empty() {
            return Err(RandomError::EmptyInput);
        }
        let index = ((self.float() * items.len() as f64) as usize).min(items.len() - 1);
        Ok(&items[index])
    }

    /// Version-4 shaped identifier built from four draws salted by `namespace`.
    fn uuid(&mut self, namespace: &str) -> String {
        let mut bytes = [0u8; 16];
        for chunk in bytes.chunks_mut(4) {
            let word = fmix32(derive(self.draw(), namespace));
            chunk.copy_from_slice(&word.to_be_bytes());
        }
        bytes[6] = (bytes[6] & 0x0F) | 0x40;
        bytes[8] = (bytes[8] & 0x3F) | 0x80;
        let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
        format!(
            "{}-{}-{}-{}-{}",
            &hex[0..8],
            &hex[8..12],
            &hex[12..16],
            &hex[16..20],
            &hex[20..32]
        )
    }
}

/// Uniform offset in `[0, span)` for spans wider than a single draw.
///
/// Draws are combined as base-`DRAW_VALUES` digits and the top partial block
/// is rejected, so every offset is equally likely.
fn wide_offset<R: RandomSource + ?Sized>(source: &mut R, span: u128) -> u128 {
    let mut capacity = 1u128;
    let mut digits = 0;
    while capacity < span {
        capacity *= DRAW_VALUES;
        digits += 1;
    }
    let limit = capacity - capacity % span;
    loop {
        let mut value = 0u128;
        for _ in 0..digits {
            value = value * DRAW_VALUES + u128::from(source.draw() - 1);
        }
        if value < limit {
            return value % span;
        }
    }
}

/// Largest `f64` strictly below the finite value `x`.
fn next_below(x: f64) -> f64 {
    if x == 0.0 {
        -f64::from_bits(1)
    } else if x > 0.0 {
        f64::from_bits(x.to_bits() - 1)
    } else {
        f64::from_bits(x.to_bits() + 1)
    }
}

/// Fallback source backed by the process's ambient primitive.
///
/// Not reproducible. Every draw goes through [`ambient::random`], so the
/// non-determinism guard reports it when active.
#[derive(Clone, Copy, Debug, Default)]
pub struct AmbientSource;

impl RandomSource for AmbientSource {
    fn draw(&mut self) -> u32 {
        let scaled = (ambient::random() * DRAW_SPAN) as u32;
        scaled.min(MODULUS - 2) + 1
    }
}
