//! Diagnostic sink shared by the registry and the non-determinism guard.

use std::sync::Arc;

use tracing::{error, info, warn};

/// Destination for anomalies reported by checkpoint, replay and the guard.
pub trait DiagnosticSink: Send + Sync {
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
}

/// Default sink forwarding to the `tracing` subscriber.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn info(&self, message: &str) {
        info!(target: "seedfork", "{message}");
    }

    fn warn(&self, message: &str) {
        warn!(target: "seedfork", "{message}");
    }

    fn error(&self, message: &str) {
        error!(target: "seedfork", "{message}");
    }
}

pub fn default_sink() -> Arc<dyn DiagnosticSink> {
    Arc::new(TracingSink)
}
