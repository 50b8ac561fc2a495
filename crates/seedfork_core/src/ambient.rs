//! The process's ambient, non-seeded random primitive.
//!
//! Library code should never reach for this; it exists so that code which does
//! can be observed by the guard.

use std::sync::{PoisonError, RwLock};

pub type AmbientFn = fn() -> f64;

static CURRENT: RwLock<AmbientFn> = RwLock::new(platform_random);

/// Uniform `f64` in `[0, 1)` from whatever primitive is currently installed.
pub fn random() -> f64 {
    let primitive = current();
    primitive()
}

pub fn current() -> AmbientFn {
    *CURRENT.read().unwrap_or_else(PoisonError::into_inner)
}

/// Replace the primitive, returning the one it displaced.
pub fn swap(primitive: AmbientFn) -> AmbientFn {
    let mut slot = CURRENT.write().unwrap_or_else(PoisonError::into_inner);
    std::mem::replace(&mut *slot, primitive)
}

/// Replace the primitive only if `expected` is still installed.
pub fn swap_if_current(expected: AmbientFn, primitive: AmbientFn) -> bool {
    let mut slot = CURRENT.write().unwrap_or_else(PoisonError::into_inner);
    if *slot as usize != expected as usize {
        return false;
    }
    *slot = primitive;
    true
}

/// Thread-local OS-seeded generator from `rand`.
pub fn platform_random() -> f64 {
    rand::random::<f64>()
}
