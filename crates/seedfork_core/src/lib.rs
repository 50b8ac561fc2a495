//! Deterministic, forkable random streams.
//!
//! A [`ForkRegistry`] hands out named [`Stream`]s derived from one root seed.
//! Each fork advances independently, so subsystems can draw without perturbing
//! one another, and every fork can be replayed from a checkpoint. The
//! [`guard`] module reports any use of the process's ambient random source
//! while a session is meant to be deterministic.

pub mod ambient;
pub mod derive;
pub mod diag;
pub mod error;
pub mod guard;
pub mod ids;
pub mod io;
pub mod noise;
pub mod registry;
pub mod seed;
pub mod source;
pub mod stream;

pub use derive::derive;
pub use diag::{DiagnosticSink, TracingSink};
pub use error::{DriftWarning, RandomError};
pub use registry::ForkRegistry;
pub use seed::RootSeed;
pub use source::{AmbientSource, RandomSource};
pub use stream::{SharedStream, Stream};
