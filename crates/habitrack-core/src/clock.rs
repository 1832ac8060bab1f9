//! Injected clock capability.
//!
//! All "what time is it" questions inside the library go through [`Clock`]
//! so that streak computation and completion recording are deterministic
//! under test. Production code uses [`SystemClock`]; tests pin the clock
//! with [`FixedClock`] to exercise today/yesterday boundary behavior.

use chrono::{DateTime, NaiveDate, Utc};

/// Source of the current time and current calendar date.
///
/// Calendar dates are always derived from the UTC timestamp; see the
/// crate-level documentation for the time-zone convention.
pub trait Clock: Send + Sync {
    /// Current instant in UTC.
    fn now(&self) -> DateTime<Utc>;

    /// Current calendar date under the UTC convention.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Wall-clock implementation backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock pinned to a fixed instant.
///
/// Intended for tests and replay scenarios where "today" must not move
/// while assertions run.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    instant: DateTime<Utc>,
}

impl FixedClock {
    /// Pin the clock at the given instant.
    pub fn at(instant: DateTime<Utc>) -> Self {
        Self { instant }
    }

    /// A copy of this clock advanced by the given number of days.
    pub fn plus_days(&self, days: i64) -> Self {
        Self {
            instant: self.instant + chrono::Duration::days(days),
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.instant
    }
}
