//! Fixed window admission gate.

use parking_lot::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

use super::clock::{Clock, SystemClock};
use crate::error::{CrptError, Result};

/// Mutable window state, always accessed under the gate's lock.
#[derive(Debug)]
struct WindowState {
    /// Admissions granted in the current window
    count: u64,
    /// Instant at which the current window expires
    window_end: Instant,
}

/// Decides whether a submission may proceed in the current window.
///
/// At most `limit` admissions are granted per window. The window is rolled
/// forward lazily: an expired window is only noticed, and reset, by the next
/// caller that touches the gate. There is no background timer.
///
/// The expiry check, the reset and the increment run under one lock, so
/// concurrent callers can never be admitted past the limit.
pub struct AdmissionGate<C: Clock = SystemClock> {
    /// Maximum admissions per window
    limit: u64,
    /// Length of one window
    window: Duration,
    /// Counter and window end, guarded together
    state: Mutex<WindowState>,
    /// Time source
    clock: C,
}

impl AdmissionGate<SystemClock> {
    /// Create a gate backed by the system clock.
    pub fn new(limit: u64, window: Duration) -> Result<Self> {
        Self::with_clock(limit, window, SystemClock::new())
    }
}

impl<C: Clock> AdmissionGate<C> {
    /// Create a gate reading time from `clock`.
    ///
    /// Fails with [`CrptError::Config`] when `limit` or `window` is zero.
    pub fn with_clock(limit: u64, window: Duration, clock: C) -> Result<Self> {
        if limit == 0 {
            return Err(CrptError::Config(
                "rate limit must be greater than zero".to_string(),
            ));
        }
        if window.is_zero() {
            return Err(CrptError::Config(
                "rate limit window must be greater than zero".to_string(),
            ));
        }

        let window_end = clock.now().checked_add(window).ok_or_else(|| {
            CrptError::Config(format!("rate limit window {:?} is too large", window))
        })?;

        Ok(Self {
            limit,
            window,
            state: Mutex::new(WindowState {
                count: 0,
                window_end,
            }),
            clock,
        })
    }

    /// Try to take one admission from the current window.
    ///
    /// Returns `true` and counts the admission if the window still has room,
    /// `false` otherwise. A denial leaves the counter untouched.
    pub fn try_admit(&self) -> bool {
        self.admit().is_ok()
    }

    /// Try to take one admission, reporting the wait on denial.
    ///
    /// The decision and the returned time until reset come from the same
    /// critical section, so a denial never observes a different window than
    /// the one it reports.
    pub fn admit(&self) -> std::result::Result<(), Duration> {
        let mut state = self.state.lock();
        let now = self.clock.now();
        self.roll_window(&mut state, now);

        if state.count < self.limit {
            state.count += 1;
            trace!(count = state.count, limit = self.limit, "Admission granted");
            Ok(())
        } else {
            trace!(count = state.count, limit = self.limit, "Admission denied");
            Err(state.window_end.saturating_duration_since(now))
        }
    }

    /// Get the number of admissions granted in the current window.
    pub fn current_count(&self) -> u64 {
        let mut state = self.state.lock();
        let now = self.clock.now();
        self.roll_window(&mut state, now);
        state.count
    }

    /// Get the admissions still available in the current window.
    pub fn remaining(&self) -> u64 {
        self.limit.saturating_sub(self.current_count())
    }

    /// Get the limit for this gate.
    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Get the window length for this gate.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Get the duration until the current window resets.
    pub fn duration_until_reset(&self) -> Duration {
        let mut state = self.state.lock();
        let now = self.clock.now();
        self.roll_window(&mut state, now);
        state.window_end.saturating_duration_since(now)
    }

    /// Reset the window if it has expired.
    ///
    /// The new end is computed from `now`, not stepped from the old end, so
    /// a gate idle for many windows starts a fresh full window.
    fn roll_window(&self, state: &mut WindowState, now: Instant) {
        if now >= state.window_end {
            debug!(
                expired_count = state.count,
                limit = self.limit,
                "Rate limit window expired, resetting counter"
            );
            state.count = 0;
            state.window_end = saturating_add(now, self.window);
        }
    }
}

/// `start + duration`, clamped to the latest instant the platform can hold.
fn saturating_add(start: Instant, duration: Duration) -> Instant {
    if let Some(end) = start.checked_add(duration) {
        return end;
    }

    let mut end = start;
    let mut step = duration;
    while !step.is_zero() {
        match end.checked_add(step) {
            Some(next) => end = next,
            None => step /= 2,
        }
    }
    end
}

impl<C: Clock> std::fmt::Debug for AdmissionGate<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("AdmissionGate")
            .field("limit", &self.limit)
            .field("window", &self.window)
            .field("count", &state.count)
            .finish()
    }
}
