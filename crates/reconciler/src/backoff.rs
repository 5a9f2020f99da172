//! Bounded exponential backoff for supervisor failures.

use std::time::Duration;

use gnb_core::ReconcilerSettings;
use tokio::time::Instant;

/// Calculate backoff duration for a given attempt.
///
/// Uses exponential backoff: `base * 2^attempt`, capped at `max`.
#[must_use]
pub fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    let backoff = base_ms.saturating_mul(2u64.saturating_pow(attempt));
    Duration::from_millis(backoff.min(max_ms))
}

/// What to do after a supervisor failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry number `attempt` of `max` is due at `at`.
    RetryAt { attempt: u32, max: u32, at: Instant },
    /// The retry bound is spent; wait for an external trigger.
    Exhausted,
}

/// Failure bookkeeping between passes.
#[derive(Debug, Clone, Default)]
pub struct RetryState {
    failures: u32,
    exhausted: bool,
    next_at: Option<Instant>,
}

impl RetryState {
    /// Count a failure and decide whether to retry.
    pub fn record_failure(&mut self, settings: &ReconcilerSettings, now: Instant) -> RetryDecision {
        self.failures = self.failures.saturating_add(1);
        if self.failures > settings.max_retries {
            self.exhausted = true;
            self.next_at = None;
            return RetryDecision::Exhausted;
        }

        let delay = calculate_backoff(
            self.failures.saturating_sub(1),
            settings.backoff_base_ms,
            settings.backoff_max_ms,
        );
        let at = now + delay;
        self.next_at = Some(at);
        RetryDecision::RetryAt {
            attempt: self.failures,
            max: settings.max_retries,
            at,
        }
    }

    /// Forget all failures.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// The scheduled retry is being taken now.
    pub fn take_due(&mut self) {
        self.next_at = None;
    }

    #[must_use]
    pub const fn next_at(&self) -> Option<Instant> {
        self.next_at
    }

    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    #[must_use]
    pub const fn failures(&self) -> u32 {
        self.failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(max_retries: u32) -> ReconcilerSettings {
        ReconcilerSettings {
            max_retries,
            backoff_base_ms: 100,
            backoff_max_ms: 1_000,
            ..ReconcilerSettings::default()
        }
    }

    #[test]
    fn test_calculate_backoff() {
        assert_eq!(calculate_backoff(0, 100, 1_000), Duration::from_millis(100));
        assert_eq!(calculate_backoff(1, 100, 1_000), Duration::from_millis(200));
        assert_eq!(calculate_backoff(3, 100, 1_000), Duration::from_millis(800));
        assert_eq!(calculate_backoff(4, 100, 1_000), Duration::from_millis(1_000));
        assert_eq!(calculate_backoff(64, 100, 1_000), Duration::from_millis(1_000));
    }

    #[test]
    fn test_retries_then_exhausts() {
        let settings = settings(2);
        let now = Instant::now();
        let mut retry = RetryState::default();

        assert_eq!(
            retry.record_failure(&settings, now),
            RetryDecision::RetryAt {
                attempt: 1,
                max: 2,
                at: now + Duration::from_millis(100)
            }
        );
        assert_eq!(
            retry.record_failure(&settings, now),
            RetryDecision::RetryAt {
                attempt: 2,
                max: 2,
                at: now + Duration::from_millis(200)
            }
        );
        assert_eq!(retry.record_failure(&settings, now), RetryDecision::Exhausted);
        assert!(retry.is_exhausted());
        assert!(retry.next_at().is_none());

        retry.reset();
        assert!(!retry.is_exhausted());
        assert_eq!(retry.failures(), 0);
    }

    #[test]
    fn test_zero_retries_exhausts_immediately() {
        let mut retry = RetryState::default();
        assert_eq!(
            retry.record_failure(&settings(0), Instant::now()),
            RetryDecision::Exhausted
        );
    }
}
