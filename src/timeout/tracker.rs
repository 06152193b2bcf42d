//! The time-limit tracker.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, TimeZone, Utc};

use crate::persist::{JsonFileStore, StateStore, TimeoutRecord};
use crate::timeout::limit::Limit;
use crate::timeout::types::{TimeoutError, TimeoutResult};

/// Current wall-clock time, nanoseconds since the Unix epoch.
fn now_ns() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as i64
}

struct Persistence {
    store: Box<dyn StateStore>,
    key: String,
}

/// A time limit anchored at a start instant.
///
/// Queries derive elapsed/remaining milliseconds from the wall clock; the
/// only mutation point is [`reset`](Timeout::reset). A persistent timeout
/// additionally mirrors its state through a [`StateStore`], so a deadline
/// started before a crash is recovered and judged correctly after restart.
///
/// # Examples
///
/// ```no_run
/// use timelimit::Timeout;
///
/// let search_limit = Timeout::new(5000)?;
/// while !search_limit.is_expired()? {
///     // keep polling
/// }
/// # Ok::<(), timelimit::TimeoutError>(())
/// ```
pub struct Timeout {
    start_ns: i64,
    timeout_ms: i64,
    past_safe: bool,
    persistence: Option<Persistence>,
}

/// Builder for [`Timeout`] with non-default policy or persistence.
pub struct TimeoutBuilder {
    limit: Limit,
    past_safe: bool,
    persistence: Option<Persistence>,
}

impl TimeoutBuilder {
    /// When disabled, a limit that already lies in the past is accepted and
    /// the timeout is simply expired from the start. Enabled by default.
    pub fn past_safe(mut self, past_safe: bool) -> Self {
        self.past_safe = past_safe;
        self
    }

    /// Persist state under `key` in a [`JsonFileStore`] rooted at the current
    /// working directory.
    pub fn persist(self, key: impl Into<String>) -> Self {
        self.persist_with(JsonFileStore::default(), key)
    }

    /// Persist state under `key` in the given store.
    ///
    /// One key belongs to one logical timer; two live timers sharing a key
    /// overwrite each other's state.
    pub fn persist_with(mut self, store: impl StateStore + 'static, key: impl Into<String>) -> Self {
        self.persistence = Some(Persistence {
            store: Box::new(store),
            key: key.into(),
        });
        self
    }

    /// Capture the start instant, resolve the limit and, when persistent,
    /// run the recovery procedure.
    pub fn build(self) -> TimeoutResult<Timeout> {
        let mut timeout = Timeout {
            start_ns: now_ns(),
            timeout_ms: 0,
            past_safe: self.past_safe,
            persistence: self.persistence,
        };
        timeout.timeout_ms = timeout.resolve(self.limit)?;
        Ok(timeout)
    }
}

impl Timeout {
    /// Create a past-safe, non-persistent timeout.
    pub fn new(limit: impl Into<Limit>) -> TimeoutResult<Self> {
        Self::builder(limit).build()
    }

    /// Start building a timeout with explicit policy or persistence.
    pub fn builder(limit: impl Into<Limit>) -> TimeoutBuilder {
        TimeoutBuilder {
            limit: limit.into(),
            past_safe: true,
            persistence: None,
        }
    }

    /// Shared resolution procedure for construction and [`reset_with`].
    ///
    /// Order matters: the negative-duration check runs before any store
    /// access, so a rejected limit leaves persisted state untouched. When a
    /// record already exists for the key, the recovered pair overrides both
    /// the fresh start and the supplied limit, and the result is written back
    /// unconditionally.
    ///
    /// [`reset_with`]: Timeout::reset_with
    fn resolve(&mut self, limit: Limit) -> TimeoutResult<i64> {
        let mut timeout_ms = limit.resolve_ms(self.start_ns)?;
        if timeout_ms < 0 && self.past_safe {
            return Err(TimeoutError::NegativeDuration { ms: timeout_ms });
        }

        if let Some(persistence) = &self.persistence {
            if let Some(record) = persistence.store.load(&persistence.key)? {
                tracing::info!(
                    key = %persistence.key,
                    start = record.start,
                    timeout = record.timeout,
                    "recovered persisted deadline, overriding the supplied limit"
                );
                self.start_ns = record.start;
                timeout_ms = record.timeout;
            }
            persistence.store.save(
                &persistence.key,
                &TimeoutRecord {
                    start: self.start_ns,
                    timeout: timeout_ms,
                },
            )?;
        }

        Ok(timeout_ms)
    }

    /// Milliseconds passed since the start instant.
    pub fn elapsed(&self) -> i64 {
        (now_ns() - self.start_ns) / 1_000_000
    }

    /// Milliseconds left until expiry. Negative once expired; not clamped.
    pub fn remaining(&self) -> i64 {
        self.timeout_ms - self.elapsed()
    }

    /// Whether the limit has expired.
    ///
    /// On the expired side this also deletes the persisted record if one is
    /// still present, so a finished deadline is not resurrected by the next
    /// persistent construction. Repeated calls after expiry stay `Ok(true)`
    /// with the record already gone.
    pub fn is_expired(&self) -> TimeoutResult<bool> {
        if self.remaining() > 0 {
            return Ok(false);
        }
        if let Some(persistence) = &self.persistence {
            persistence.store.delete(&persistence.key)?;
        }
        Ok(true)
    }

    /// Re-anchor the start instant, keeping the configured duration.
    ///
    /// When persistent, the new pair is written out immediately (creating the
    /// record if it does not exist yet) without reading the store first: on
    /// this path the in-memory duration is authoritative, unlike during
    /// construction where a recovered record wins.
    pub fn reset(&mut self) -> TimeoutResult<()> {
        self.start_ns = now_ns();
        if let Some(persistence) = &self.persistence {
            persistence.store.save(
                &persistence.key,
                &TimeoutRecord {
                    start: self.start_ns,
                    timeout: self.timeout_ms,
                },
            )?;
        }
        Ok(())
    }

    /// Re-anchor the start instant and replace the duration.
    ///
    /// The new limit goes through the same resolution procedure as
    /// construction, including the past-safe check and, when persistent, the
    /// recovery-wins read before the write-back.
    pub fn reset_with(&mut self, limit: impl Into<Limit>) -> TimeoutResult<()> {
        self.start_ns = now_ns();
        self.timeout_ms = self.resolve(limit.into())?;
        Ok(())
    }

    /// The configured duration in milliseconds.
    pub fn limit_ms(&self) -> i64 {
        self.timeout_ms
    }

    /// The start instant as a calendar time.
    pub fn started_at(&self) -> DateTime<Utc> {
        Utc.timestamp_nanos(self.start_ns)
    }
}

impl fmt::Display for Timeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Timeout started at '{}' with a limit of {} ms",
            self.started_at().format("%Y-%m-%d %H:%M:%S%.3f UTC"),
            self.timeout_ms
        )
    }
}

impl fmt::Debug for Timeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timeout")
            .field("start_ns", &self.start_ns)
            .field("timeout_ms", &self.timeout_ms)
            .field("past_safe", &self.past_safe)
            .field(
                "persist_key",
                &self.persistence.as_ref().map(|p| p.key.as_str()),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use std::thread::sleep;
    use std::time::Duration;

    // Scheduling tolerance for wall-clock assertions.
    const SLACK_MS: i64 = 200;

    #[test]
    fn test_fresh_timeout_is_not_expired() {
        let timeout = Timeout::new(5000).unwrap();
        assert!(!timeout.is_expired().unwrap());
        assert!(timeout.remaining() > 5000 - SLACK_MS);
        assert!(timeout.remaining() <= 5000);
        assert!(timeout.elapsed() >= 0);
    }

    #[test]
    fn test_negative_limit_rejected_when_past_safe() {
        let err = Timeout::new(-1).unwrap_err();
        assert!(matches!(err, TimeoutError::NegativeDuration { ms: -1 }));
    }

    #[test]
    fn test_negative_limit_expires_immediately_without_past_safe() {
        let timeout = Timeout::builder(-500).past_safe(false).build().unwrap();
        assert!(timeout.is_expired().unwrap());
        assert!(timeout.remaining() <= -500);
    }

    #[test]
    fn test_calendar_deadline_round_trip() {
        let timeout = Timeout::new(Utc::now() + ChronoDuration::seconds(5)).unwrap();
        let remaining = timeout.remaining();
        assert!(remaining > 5000 - SLACK_MS);
        assert!(remaining <= 5000);
    }

    #[test]
    fn test_past_calendar_deadline_rejected() {
        let err = Timeout::new(Utc::now() - ChronoDuration::seconds(2)).unwrap_err();
        assert!(matches!(err, TimeoutError::NegativeDuration { .. }));
    }

    #[test]
    fn test_expires_after_the_limit() {
        let timeout = Timeout::new(50).unwrap();
        sleep(Duration::from_millis(80));
        assert!(timeout.is_expired().unwrap());
        assert!(timeout.remaining() < 0);
    }

    #[test]
    fn test_bare_reset_keeps_the_duration() {
        let mut timeout = Timeout::new(5000).unwrap();
        sleep(Duration::from_millis(30));
        timeout.reset().unwrap();

        assert!(timeout.elapsed() < SLACK_MS);
        assert_eq!(timeout.limit_ms(), 5000);
        assert!(timeout.remaining() > 5000 - SLACK_MS);
    }

    #[test]
    fn test_reset_with_replaces_the_duration() {
        let mut timeout = Timeout::new(50).unwrap();
        sleep(Duration::from_millis(80));
        assert!(timeout.is_expired().unwrap());

        timeout.reset_with(2000).unwrap();
        assert!(!timeout.is_expired().unwrap());
        assert_eq!(timeout.limit_ms(), 2000);
    }

    #[test]
    fn test_reset_with_checks_past_safe() {
        let mut timeout = Timeout::new(5000).unwrap();
        let err = timeout.reset_with(-10).unwrap_err();
        assert!(matches!(err, TimeoutError::NegativeDuration { ms: -10 }));
        // The original duration survives a rejected replacement.
        assert_eq!(timeout.limit_ms(), 5000);
    }

    #[test]
    fn test_display_shows_start_and_limit() {
        let timeout = Timeout::new(1500).unwrap();
        let rendered = timeout.to_string();
        assert!(rendered.contains("1500 ms"));
        assert!(rendered.contains("UTC"));
    }
}
