//! Time sources for the admission gate.
//!
//! The gate never reads the system time directly. It asks a [`Clock`], so
//! tests can move time forward with [`MockClock`] instead of sleeping.

use std::time::Instant;

/// Source of monotonic time.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> Instant;
}

/// System clock implementation using `Instant::now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Create a new system clock.
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[cfg(any(test, feature = "test-helpers"))]
pub use mock::MockClock;

#[cfg(any(test, feature = "test-helpers"))]
mod mock {
    use super::Clock;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    /// Manually driven clock for tests.
    ///
    /// Clones share the same underlying instant, so a test can keep one
    /// handle and advance time for a gate that owns another.
    #[derive(Debug, Clone)]
    pub struct MockClock {
        current_time: Arc<Mutex<Instant>>,
    }

    impl MockClock {
        /// Create a mock clock starting at a specific instant.
        pub fn new(start: Instant) -> Self {
            Self {
                current_time: Arc::new(Mutex::new(start)),
            }
        }

        /// Advance the clock by a duration.
        pub fn advance(&self, duration: Duration) {
            *self.current_time.lock() += duration;
        }

        /// Set the clock to a specific instant.
        pub fn set(&self, instant: Instant) {
            *self.current_time.lock() = instant;
        }
    }

    impl Clock for MockClock {
        fn now(&self) -> Instant {
            *self.current_time.lock()
        }
    }
}
