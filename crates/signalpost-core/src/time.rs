//! Time abstraction for testable retry timing.
//!
//! The worker pool sleeps between retry attempts through an injected
//! [`Clock`] so tests can run the full backoff schedule without waiting.

use std::{
    future::Future,
    pin::Pin,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

/// Clock abstraction for duration measurement and delays.
///
/// Production code uses [`RealClock`]; tests can inject [`TestClock`] to
/// make backoff sleeps complete immediately.
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Returns the current instant for duration measurements.
    fn now(&self) -> Instant;

    /// Sleeps for the specified duration.
    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}

/// Real clock backed by system time and tokio's timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealClock;

impl RealClock {
    /// Creates a new real clock instance.
    pub fn new() -> Self {
        Self
    }
}

impl Clock for RealClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(tokio::time::sleep(duration))
    }
}

/// Test clock for deterministic time control.
///
/// `sleep` advances an internal counter and yields instead of waiting, so a
/// retry schedule of many seconds completes in microseconds while the total
/// slept duration stays observable through [`TestClock::elapsed`].
#[derive(Debug, Clone, Default)]
pub struct TestClock {
    /// Virtual elapsed time in nanoseconds since creation.
    elapsed_ns: Arc<AtomicU64>,
}

impl TestClock {
    /// Creates a new test clock with zero elapsed time.
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances the clock by the specified duration.
    pub fn advance(&self, duration: Duration) {
        let duration_ns =
            u64::try_from(duration.as_nanos().min(u128::from(u64::MAX))).unwrap_or(u64::MAX);
        self.elapsed_ns.fetch_add(duration_ns, Ordering::AcqRel);
    }

    /// Returns total virtual time slept or advanced since creation.
    pub fn elapsed(&self) -> Duration {
        Duration::from_nanos(self.elapsed_ns.load(Ordering::Acquire))
    }
}

impl Clock for TestClock {
    fn now(&self) -> Instant {
        // The base instant is irrelevant for duration measurements; only
        // differences between two `now` calls are observed.
        static BASE: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();
        let base = *BASE.get_or_init(Instant::now);
        base + self.elapsed()
    }

    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        self.advance(duration);
        // Yield so other tasks observe the advanced clock before we resume.
        Box::pin(tokio::task::yield_now())
    }
}
