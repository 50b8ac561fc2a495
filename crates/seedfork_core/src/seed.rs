use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::derive::seed_from_text;
use crate::error::RandomError;
use crate::stream::MODULUS;

/// Substitute for a zero or non-finite seed.
pub const DEFAULT_SEED: u32 = 0x2F6B_4A1D;

/// Text seed used when a session supplies no root seed.
pub const DEFAULT_SEED_LABEL: &str = "seedfork";

/// Root seed accepted at registry construction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RootSeed {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Default for RootSeed {
    fn default() -> Self {
        RootSeed::Text(DEFAULT_SEED_LABEL.to_string())
    }
}

impl RootSeed {
    /// Resolve to a valid Lehmer state, remapping invalid input.
    pub fn resolve(&self) -> u32 {
        self.checked().unwrap_or_else(|err| {
            warn!(%err, "remapped invalid root seed");
            match err {
                RandomError::InvalidSeed { remapped, .. } => remapped,
                _ => DEFAULT_SEED,
            }
        })
    }

    fn checked(&self) -> Result<u32, RandomError> {
        match self {
            RootSeed::Int(value) => checked_int(i128::from(*value)),
            RootSeed::Float(value) if value.is_finite() => checked_int(value.trunc() as i128),
            RootSeed::Float(value) => Err(RandomError::InvalidSeed {
                seed: value.to_string(),
                remapped: DEFAULT_SEED,
            }),
            RootSeed::Text(text) => Ok(seed_from_text(text)),
        }
    }
}

impl From<i64> for RootSeed {
    fn from(value: i64) -> Self {
        RootSeed::Int(value)
    }
}

impl From<u32> for RootSeed {
    fn from(value: u32) -> Self {
        RootSeed::Int(i64::from(value))
    }
}

impl From<f64> for RootSeed {
    fn from(value: f64) -> Self {
        RootSeed::Float(value)
    }
}

impl From<&str> for RootSeed {
    fn from(value: &str) -> Self {
        RootSeed::Text(value.to_string())
    }
}

impl From<String> for RootSeed {
    fn from(value: String) -> Self {
        RootSeed::Text(value)
    }
}

/// Reduce a raw integer seed into `[1, 2^31 - 2]`, remapping zero.
pub(crate) fn normalize(raw: i128) -> u32 {
    checked_int(raw).unwrap_or(DEFAULT_SEED)
}

fn checked_int(raw: i128) -> Result<u32, RandomError> {
    match raw.rem_euclid(i128::from(MODULUS)) {
        0 => Err(RandomError::InvalidSeed {
            seed: raw.to_string(),
            remapped: DEFAULT_SEED,
        }),
        reduced => Ok(reduced as u32),
    }
}
