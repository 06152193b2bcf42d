//! Timeout error definitions.

use thiserror::Error;

use crate::persist::StoreError;

/// Errors that can occur while constructing or querying a time limit.
#[derive(Debug, Error)]
pub enum TimeoutError {
    /// The limit resolved to a negative duration while past-safe mode is on.
    #[error("time limit resolved to {ms} ms; a past deadline is rejected unless past_safe is disabled")]
    NegativeDuration { ms: i64 },

    /// The calendar instant cannot be represented as i64 nanoseconds since epoch.
    #[error("calendar instant is outside the representable nanosecond range")]
    InstantOutOfRange,

    /// The persistence layer failed; the timer's correctness depends on this
    /// data, so the failure is surfaced rather than swallowed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for timeout operations.
pub type TimeoutResult<T> = Result<T, TimeoutError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TimeoutError::NegativeDuration { ms: -250 };
        assert!(err.to_string().contains("-250"));
        assert!(err.to_string().contains("past_safe"));
    }
}
