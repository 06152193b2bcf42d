//! Time limits with optional crash recovery.
//!
//! A [`Timeout`] records a start instant and a millisecond duration, answers
//! `elapsed` / `remaining` / `is_expired`, and can persist its state through a
//! [`StateStore`] so a deadline started before a process crash is still
//! judged correctly after restart.

pub mod persist;
pub mod timeout;

pub use persist::{JsonFileStore, StateStore, StoreError, TimeoutRecord};
pub use timeout::{Limit, Timeout, TimeoutBuilder, TimeoutError, TimeoutResult};
