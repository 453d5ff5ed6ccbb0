//! Time source for policy expiration.
//!
//! Validation never calls `Utc::now()` directly; it asks the engine's
//! [`Clock`] whether the policy expiration has passed. Tests swap in a
//! [`MockClock`] pinned on either side of the expiration instant.

use chrono::{DateTime, Utc};

/// Source of the current instant.
pub trait Clock: Send + Sync {
    /// Current UTC instant.
    fn now_utc(&self) -> DateTime<Utc>;

    /// Whether `instant` lies strictly in the past. An expiration equal to
    /// "now" has not passed yet.
    fn has_passed(&self, instant: DateTime<Utc>) -> bool {
        self.now_utc() > instant
    }
}

/// Wall-clock time, used by every engine built outside tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to a chosen instant.
#[cfg(any(test, feature = "test-seams"))]
#[derive(Debug, Clone)]
pub struct MockClock {
    now: DateTime<Utc>,
}

#[cfg(any(test, feature = "test-seams"))]
impl MockClock {
    /// Pin the clock to `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    /// Pin the clock to an RFC 3339 timestamp. Panics on malformed input.
    pub fn from_rfc3339(timestamp: &str) -> Self {
        let now = DateTime::parse_from_rfc3339(timestamp)
            .unwrap_or_else(|e| panic!("bad RFC 3339 timestamp {:?}: {}", timestamp, e));
        Self::new(now.with_timezone(&Utc))
    }

    /// Shift the pinned instant; negative durations move it back.
    pub fn advance(&mut self, duration: chrono::Duration) {
        self.now += duration;
    }

    /// Re-pin the clock.
    pub fn set(&mut self, now: DateTime<Utc>) {
        self.now = now;
    }
}

#[cfg(any(test, feature = "test-seams"))]
impl Clock for MockClock {
    fn now_utc(&self) -> DateTime<Utc> {
        self.now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    const EXPIRATION: &str = "2025-12-31T23:59:59Z";

    fn expiration() -> DateTime<Utc> {
        MockClock::from_rfc3339(EXPIRATION).now_utc()
    }

    #[test]
    fn test_expiration_ahead_has_not_passed() {
        let clock = MockClock::new(expiration() - Duration::days(1));
        assert!(!clock.has_passed(expiration()));
    }

    #[test]
    fn test_expiration_at_now_has_not_passed() {
        let clock = MockClock::from_rfc3339(EXPIRATION);
        assert!(!clock.has_passed(expiration()));
    }

    #[test]
    fn test_expiration_passes_one_second_later() {
        let mut clock = MockClock::from_rfc3339(EXPIRATION);
        clock.advance(Duration::seconds(1));
        assert!(clock.has_passed(expiration()));
        assert_eq!(clock.now_utc().to_rfc3339(), "2026-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_set_moves_back_before_expiration() {
        let mut clock = MockClock::new(expiration() + Duration::hours(1));
        assert!(clock.has_passed(expiration()));
        clock.set(expiration() - Duration::hours(1));
        assert!(!clock.has_passed(expiration()));
    }

    #[test]
    fn test_system_clock_sees_past_and_future() {
        let clock = SystemClock;
        assert!(clock.has_passed(Utc::now() - Duration::days(1)));
        assert!(!clock.has_passed(Utc::now() + Duration::days(1)));
    }

    #[test]
    #[should_panic(expected = "bad RFC 3339 timestamp")]
    fn test_mock_clock_rejects_malformed_timestamp() {
        let _ = MockClock::from_rfc3339("31.12.2025");
    }
}
