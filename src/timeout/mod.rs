//! Time-limit tracking.
//!
//! # Data Flow
//! ```text
//! Timeout::new / builder:
//!     → limit.rs (resolve duration or calendar instant to ms)
//!     → tracker.rs (past-safe check, persistence recovery, write-back)
//! Queries (elapsed / remaining / is_expired):
//!     → wall-clock read, compared against the anchored start
//! ```
//!
//! # Design Decisions
//! - The limit argument is a sum type; an invalid kind cannot be passed
//! - A recovered persisted record always wins over a fresh deadline
//! - Expiry observation deletes the persisted record, idempotently

pub mod limit;
pub mod tracker;
pub mod types;

pub use limit::Limit;
pub use tracker::{Timeout, TimeoutBuilder};
pub use types::{TimeoutError, TimeoutResult};
