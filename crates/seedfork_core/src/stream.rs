//! Deterministic random stream utilities.
//!
//! Each [`Stream`] is a Lehmer (Park–Miller MINSTD) generator over the
//! Mersenne prime `2^31 - 1`. All arithmetic is exact integer math, so a stream
//! replays identically on every platform. Child streams are derived by label
//! without mutating the parent.

use std::cell::RefCell;
use std::rc::Rc;

use rand::RngCore;

use crate::derive::derive;
use crate::seed::normalize;
use crate::source::RandomSource;

/// Mersenne prime modulus `2^31 - 1`.
pub const MODULUS: u32 = 0x7FFF_FFFF;

/// Park–Miller multiplier.
pub const MULTIPLIER: u64 = 16_807;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Stream {
    /// Always in `[1, MODULUS - 1]`.
    state: u32,
    origin_seed: u32,
    label: String,
}

impl Stream {
    /// Construct a stream; zero seeds and multiples of the modulus are remapped.
    pub fn new(seed: u32, label: impl Into<String>) -> Self {
        let seed = normalize(i128::from(seed));
        Self {
            state: seed,
            origin_seed: seed,
            label: label.into(),
        }
    }

    /// Deterministically derive a child stream identified by `label`.
    ///
    /// The child depends only on this stream's origin seed, never on how much
    /// has been drawn from it.
    pub fn derive(&self, label: &str) -> Self {
        Self::new(derive(self.origin_seed, label), label)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn origin_seed(&self) -> u32 {
        self.origin_seed
    }

    pub fn state(&self) -> u32 {
        self.state
    }

    pub(crate) fn reset_to(&mut self, seed: u32) {
        self.state = normalize(i128::from(seed));
    }
}

impl RandomSource for Stream {
    fn draw(&mut self) -> u32 {
        self.state = ((u64::from(self.state) * MULTIPLIER) % u64::from(MODULUS)) as u32;
        self.state
    }
}

impl RngCore for Stream {
    fn next_u32(&mut self) -> u32 {
        let high = self.draw() & 0xFFFF;
        let low = self.draw() & 0xFFFF;
        (high << 16) | low
    }

    fn next_u64(&mut self) -> u64 {
        (u64::from(self.next_u32()) << 32) | u64::from(self.next_u32())
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.next_u32().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

/// Shared handle to a registry-owned stream.
///
/// Every handle for a label points at the same stream, so a replay issued
/// through the registry is visible to all holders. Handles are `!Send`.
#[derive(Clone, Debug)]
pub struct SharedStream(Rc<RefCell<Stream>>);

impl SharedStream {
    pub(crate) fn new(stream: Stream) -> Self {
        Self(Rc::new(RefCell::new(stream)))
    }

    pub fn label(&self) -> String {
        self.0.borrow().label.clone()
    }

    pub fn origin_seed(&self) -> u32 {
        self.0.borrow().origin_seed
    }

    pub fn state(&self) -> u32 {
        self.0.borrow().state
    }

    /// Detached copy of the stream at its current state.
    pub fn snapshot(&self) -> Stream {
        self.0.borrow().clone()
    }

    /// True when both handles refer to the same stream.
    pub fn ptr_eq(&self, other: &SharedStream) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn reset_to(&self, seed: u32) {
        self.0.borrow_mut().reset_to(seed);
    }
}

impl RandomSource for SharedStream {
    fn draw(&mut self) -> u32 {
        self.0.borrow_mut().draw()
    }
}

impl RngCore for SharedStream {
    fn next_u32(&mut self) -> u32 {
        self.0.borrow_mut().next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.0.borrow_mut().next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.0.borrow_mut().fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.0.borrow_mut().try_fill_bytes(dest)
    }
}
