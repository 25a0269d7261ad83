//! Signing timestamp source.

use chrono::{DateTime, Utc};

/// `strftime` pattern for the GMT date written onto unsigned-date requests,
/// e.g. `Thu, 17 Nov 2005 18:49:58 GMT`.
pub const LONG_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Source of the current signing time.
pub trait Clock: Send + Sync {
    /// The current time in UTC.
    fn now(&self) -> DateTime<Utc>;
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant, for reproducible signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(DateTime<Utc>);

impl FixedClock {
    /// Create a clock that always reports `at`.
    #[must_use]
    pub fn new(at: DateTime<Utc>) -> Self {
        Self(at)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Render a timestamp in [`LONG_DATE_FORMAT`].
#[must_use]
pub fn format_long_date(t: &DateTime<Utc>) -> String {
    t.format(LONG_DATE_FORMAT).to_string()
}
