//! Development-time detection of ambient randomness.
//!
//! [`install`] wraps the ambient primitive with a passthrough. While the guard
//! is active every ambient call is reported to the diagnostic sink with a
//! trimmed call-site trace, then forwarded unchanged. The guard never blocks
//! or alters a value.

use std::backtrace::Backtrace;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::ambient::{self, AmbientFn};
use crate::diag::{default_sink, DiagnosticSink};
use crate::error::DriftWarning;

const TRACE_DEPTH: usize = 12;

const INTERNAL_FRAMES: [&str; 4] = [
    "std::backtrace",
    "seedfork_core::guard",
    "seedfork_core::ambient",
    "__rust_begin_short_backtrace",
];

struct Installation {
    original: AmbientFn,
    sink: Arc<dyn DiagnosticSink>,
}

static INSTALLED: Mutex<Option<Installation>> = Mutex::new(None);
static ACTIVE: AtomicBool = AtomicBool::new(false);
static DRIFT: AtomicU64 = AtomicU64::new(0);

/// Control handle for the process-wide guard.
#[derive(Clone, Copy, Debug)]
#[must_use]
pub struct GuardHandle {
    _private: (),
}

/// Install the guard reporting to the `tracing` sink.
pub fn install() -> GuardHandle {
    install_with_sink(default_sink())
}

/// Install the guard reporting to `sink`. A second install returns a handle
/// to the existing wrapper and keeps the original sink.
pub fn install_with_sink(sink: Arc<dyn DiagnosticSink>) -> GuardHandle {
    let mut installed = INSTALLED.lock().unwrap_or_else(PoisonError::into_inner);
    if installed.is_none() {
        let original = ambient::swap(guarded);
        sink.info("non-determinism guard installed");
        *installed = Some(Installation { original, sink });
    }
    GuardHandle { _private: () }
}

impl GuardHandle {
    /// Start reporting ambient calls.
    pub fn activate(&self) {
        ACTIVE.store(true, Ordering::SeqCst);
    }

    /// Stop reporting; the wrapper stays in place.
    pub fn deactivate(&self) {
        ACTIVE.store(false, Ordering::SeqCst);
    }

    pub fn is_active(&self) -> bool {
        ACTIVE.load(Ordering::SeqCst)
    }

    pub fn is_installed(&self) -> bool {
        INSTALLED
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Ambient calls observed while active since process start.
    pub fn drift_count(&self) -> u64 {
        DRIFT.load(Ordering::SeqCst)
    }

    /// Remove the wrapper and hand the original primitive back. Idempotent.
    ///
    /// A primitive swapped in after install is left untouched.
    pub fn restore(&self) {
        let mut installed = INSTALLED.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(installation) = installed.take() {
            ACTIVE.store(false, Ordering::SeqCst);
            if ambient::swap_if_current(guarded, installation.original) {
                installation.sink.info("non-determinism guard restored");
            } else {
                installation
                    .sink
                    .warn("ambient primitive replaced after guard install; leaving replacement in place");
            }
        }
    }
}

fn guarded() -> f64 {
    let (original, sink) = {
        let installed = INSTALLED.lock().unwrap_or_else(PoisonError::into_inner);
        match installed.as_ref() {
            Some(installation) => (installation.original, Arc::clone(&installation.sink)),
            None => return ambient::platform_random(),
        }
    };
    if ACTIVE.load(Ordering::SeqCst) {
        let count = DRIFT.fetch_add(1, Ordering::SeqCst) + 1;
        let warning = DriftWarning {
            count,
            trace: call_site_trace(),
        };
        sink.warn(&warning.to_string());
    }
    original()
}

fn call_site_trace() -> String {
    Backtrace::force_capture()
        .to_string()
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with("at "))
        .filter(|line| !INTERNAL_FRAMES.iter().any(|frame| line.contains(frame)))
        .take(TRACE_DEPTH)
        .collect::<Vec<_>>()
        .join("\n")
}
