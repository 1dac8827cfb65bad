//! Time window units for rate limiting.

use std::time::Duration;

/// Unit a submission window is measured in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeWindow {
    Second,
    Minute,
    Hour,
    Day,
}

impl TimeWindow {
    /// Length of one unit.
    pub fn duration(&self) -> Duration {
        match self {
            TimeWindow::Second => Duration::from_secs(1),
            TimeWindow::Minute => Duration::from_secs(60),
            TimeWindow::Hour => Duration::from_secs(3600),
            TimeWindow::Day => Duration::from_secs(86400),
        }
    }

    /// Get the duration of `amount` consecutive units.
    pub fn times(&self, amount: u32) -> Duration {
        self.duration() * amount
    }
}
