use thiserror::Error;

/// Failures raised by stream operations.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum RandomError {
    /// A zero or non-finite seed reached a constructor. Never returned to
    /// callers; the seed is remapped and this value is only logged.
    #[error("invalid seed {seed}; remapped to {remapped}")]
    InvalidSeed { seed: String, remapped: u32 },
    #[error("invalid range: min {min} is greater than max {max}")]
    InvalidRange { min: f64, max: f64 },
    #[error("cannot pick from an empty sequence")]
    EmptyInput,
}

/// Ambient randomness was consumed while deterministic mode was active.
#[derive(Clone, Debug, Error)]
#[error("ambient random source used in deterministic mode (drift #{count})\n{trace}")]
pub struct DriftWarning {
    pub count: u64,
    pub trace: String,
}

pub type Result<T> = std::result::Result<T, RandomError>;
