//! Test infrastructure for deterministic dispatch testing.
//!
//! Provides recording hooks and sinks that capture what the worker pool
//! and dispatcher produced, plus scripted task builders for exercising
//! retry and back-pressure paths without a real transport.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

use tracing_subscriber::EnvFilter;

pub mod actions;
pub mod hooks;
pub mod sink;

pub use actions::{counting_task, failing_task, flaky_task, gated_task, succeeding_task, TaskGate};
pub use hooks::{HookEvent, RecordingHooks};
pub use sink::RecordingSink;

/// Installs a test-writer tracing subscriber, once per process.
///
/// Honors `RUST_LOG` and falls back to `info`. Safe to call from every
/// test; later calls are no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
