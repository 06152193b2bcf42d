//! Time-limit argument type and its resolution to milliseconds.

use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};

use crate::timeout::types::{TimeoutError, TimeoutResult};

/// A time limit, either a raw duration or a calendar deadline.
///
/// Callers rarely name this type: anything convertible into it (`i64`
/// milliseconds, `std::time::Duration`, `chrono::DateTime`) is accepted
/// wherever a limit is expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    /// Duration in milliseconds relative to the start instant.
    Millis(i64),
    /// Absolute calendar instant the limit expires at.
    At(DateTime<Utc>),
}

impl Limit {
    /// Resolve the limit to milliseconds relative to `start_ns`.
    ///
    /// Calendar instants are converted with truncating integer division, so
    /// sub-millisecond remainders are discarded. The result may be negative;
    /// rejecting that is the caller's policy, not this function's.
    pub(crate) fn resolve_ms(&self, start_ns: i64) -> TimeoutResult<i64> {
        match self {
            Limit::Millis(ms) => Ok(*ms),
            Limit::At(instant) => {
                let instant_ns = instant
                    .timestamp_nanos_opt()
                    .ok_or(TimeoutError::InstantOutOfRange)?;
                Ok((instant_ns - start_ns) / 1_000_000)
            }
        }
    }
}

impl From<i64> for Limit {
    fn from(ms: i64) -> Self {
        Limit::Millis(ms)
    }
}

// Lets bare integer literals work as limits.
impl From<i32> for Limit {
    fn from(ms: i32) -> Self {
        Limit::Millis(ms.into())
    }
}

impl From<Duration> for Limit {
    fn from(duration: Duration) -> Self {
        Limit::Millis(i64::try_from(duration.as_millis()).unwrap_or(i64::MAX))
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Limit {
    fn from(instant: DateTime<Tz>) -> Self {
        Limit::At(instant.with_timezone(&Utc))
    }
}
