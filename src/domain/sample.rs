// Sample domain model
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

/// One (timestamp, value) pair. Timestamps always materialize as UTC.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

impl Sample {
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self { timestamp, value }
    }

    /// Reinterpret a naive timestamp as UTC, with no offset shift.
    pub fn from_naive(timestamp: NaiveDateTime, value: f64) -> Self {
        Self::new(timestamp.and_utc(), value)
    }

    /// Convert an aware timestamp to UTC, preserving the absolute instant.
    pub fn from_zoned<Tz: TimeZone>(timestamp: DateTime<Tz>, value: f64) -> Self {
        Self::new(timestamp.with_timezone(&Utc), value)
    }
}
