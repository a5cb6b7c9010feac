//! Interval-based progress logging.

use log::info;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::metrics::format_count;

/// Default number of items between progress messages.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 1_000_000;

/// Logs a line every time a running count crosses a multiple of the interval.
///
/// The count is atomic, so one tracker can be shared between threads.
///
/// # Example
/// ```
/// use fgrealign_lib::progress::ProgressTracker;
///
/// let tracker = ProgressTracker::new("Read records").with_interval(100);
/// for _ in 0..250 {
///     tracker.add(1); // logs at 100 and 200
/// }
/// tracker.finish(); // logs "Read records 250 (complete)"
/// ```
pub struct ProgressTracker {
    interval: u64,
    message: String,
    count: AtomicU64,
}

impl ProgressTracker {
    /// Creates a tracker with the default interval.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            interval: DEFAULT_PROGRESS_INTERVAL,
            message: message.into(),
            count: AtomicU64::new(0),
        }
    }

    /// Sets the logging interval; zero is treated as one.
    #[must_use]
    pub fn with_interval(mut self, interval: u64) -> Self {
        self.interval = interval.max(1);
        self
    }

    /// Adds `additional` to the count, logging once per interval boundary crossed.
    ///
    /// Returns true if the count now sits exactly on a boundary.
    pub fn add(&self, additional: u64) -> bool {
        self.add_at(additional, String::new)
    }

    /// Like [`add`](Self::add), appending `location()` (e.g. the position of the last record)
    /// to each message. `location` is only called when a boundary is crossed.
    pub fn add_at<F: FnOnce() -> String>(&self, additional: u64, location: F) -> bool {
        let prev = self.count.fetch_add(additional, Ordering::Relaxed);
        let now = prev + additional;

        let milestones = (prev / self.interval + 1)..=(now / self.interval);
        if !milestones.is_empty() {
            let location = location();
            for milestone in milestones {
                let milestone = format_count(milestone * self.interval);
                if location.is_empty() {
                    info!("{} {milestone}", self.message);
                } else {
                    info!("{} {milestone} (last at {location})", self.message);
                }
            }
        }
        now > 0 && now.is_multiple_of(self.interval)
    }

    /// Logs the final count unless it was just logged as a milestone.
    pub fn finish(&self) {
        let count = self.count();
        if count > 0 && !count.is_multiple_of(self.interval) {
            info!("{} {} (complete)", self.message, format_count(count));
        }
    }

    /// Current count.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}
