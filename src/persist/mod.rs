//! State persistence for recoverable time limits.
//!
//! A persistent [`crate::Timeout`] mirrors its `(start, timeout)` pair through
//! a [`StateStore`] under a caller-chosen key. The store, not memory, is
//! authoritative across process restarts: a record found at construction time
//! overrides the freshly supplied deadline.

pub mod file;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use file::JsonFileStore;

/// The persisted state of one time limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutRecord {
    /// Start instant, nanoseconds since the Unix epoch.
    pub start: i64,
    /// Duration in milliseconds relative to `start`.
    pub timeout: i64,
}

/// Errors from the persistence layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading, writing or deleting the backing storage failed.
    #[error("state store I/O failed for key {key:?}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// The stored record exists but cannot be decoded.
    #[error("corrupt state record for key {key:?}: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Keyed load/save/delete over [`TimeoutRecord`]s.
///
/// One key corresponds to one logical timer. There is no locking: two live
/// timers sharing a key will overwrite each other's state, so give each
/// logical timer its own key.
pub trait StateStore {
    /// Load the record for `key`, or `None` if nothing is stored.
    fn load(&self, key: &str) -> Result<Option<TimeoutRecord>, StoreError>;

    /// Write the record for `key`, creating or fully overwriting it.
    fn save(&self, key: &str, record: &TimeoutRecord) -> Result<(), StoreError>;

    /// Remove the record for `key`. Removing an absent record is not an error.
    fn delete(&self, key: &str) -> Result<(), StoreError>;
}
