//! Time utilities for PackRank.
//!
//! All timestamps are Unix epoch microseconds (u64). Calendar questions
//! (which month a point belongs to, which day a streak covers) go through
//! `chrono` in UTC.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Datelike, NaiveDate, Utc};

pub const MICROS_PER_SECOND: u64 = 1_000_000;
pub const MICROS_PER_HOUR: u64 = 3_600 * MICROS_PER_SECOND;
pub const MICROS_PER_DAY: u64 = 24 * MICROS_PER_HOUR;

/// Return the current time as microseconds since Unix epoch.
pub fn now_micros() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0)
}

fn to_datetime(micros: u64) -> DateTime<Utc> {
    let secs = (micros / MICROS_PER_SECOND) as i64;
    let nsecs = ((micros % MICROS_PER_SECOND) * 1000) as u32;
    DateTime::from_timestamp(secs, nsecs).unwrap_or(DateTime::UNIX_EPOCH)
}

/// Convert microseconds to an RFC 3339 string.
pub fn micros_to_rfc3339(micros: u64) -> String {
    to_datetime(micros).to_rfc3339()
}

/// Calendar month key (`YYYY-MM`, UTC) for a timestamp.
pub fn month_key(micros: u64) -> String {
    let dt = to_datetime(micros);
    format!("{:04}-{:02}", dt.year(), dt.month())
}

/// Calendar day (UTC) for a timestamp.
pub fn day_of(micros: u64) -> NaiveDate {
    to_datetime(micros).date_naive()
}

/// Microseconds at midnight UTC starting `date`.
pub fn date_to_micros(date: NaiveDate) -> u64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp().max(0) as u64 * MICROS_PER_SECOND)
        .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Source of "now" for the engine.
pub trait Clock: Send + Sync {
    fn now_micros(&self) -> u64;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_micros(&self) -> u64 {
        now_micros()
    }
}

/// A clock that only moves when told to. Used for replay and tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start_micros: u64) -> Self {
        Self {
            now: AtomicU64::new(start_micros),
        }
    }

    /// Start at midnight UTC of the given calendar day.
    pub fn at_date(date: NaiveDate) -> Self {
        Self::new(date_to_micros(date))
    }

    pub fn set(&self, micros: u64) {
        self.now.store(micros, Ordering::SeqCst);
    }

    pub fn advance(&self, micros: u64) {
        self.now.fetch_add(micros, Ordering::SeqCst);
    }

    pub fn advance_days(&self, days: u64) {
        self.advance(days * MICROS_PER_DAY);
    }
}

impl Clock for ManualClock {
    fn now_micros(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}
