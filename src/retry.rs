//! Retry eligibility and exponential backoff.

use std::{
    collections::BTreeSet,
    time::{Duration, Instant},
};

use crate::ClientConfig;

/// Retry rules derived from a [`ClientConfig`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of retries after the initial attempt.
    pub max_retries: u32,
    /// Base backoff delay, doubled for every retry already performed.
    pub retry_delay: Duration,
    /// Optional ceiling applied to a single backoff delay.
    pub max_delay: Option<Duration>,
    /// Status codes that are worth retrying.
    pub retry_status_codes: BTreeSet<u16>,
}

impl RetryPolicy {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
            max_delay: config.max_retry_delay_ms.map(Duration::from_millis),
            retry_status_codes: config.retry_status_codes.iter().copied().collect(),
        }
    }

    /// Starts the retry bookkeeping for one logical call.
    pub fn begin(&self) -> RetryState {
        RetryState {
            retry_count: 0,
            max_retries: self.max_retries,
            started_at: Instant::now(),
        }
    }

    /// Whether a failed attempt should be retried.
    ///
    /// `status` is `None` when no response was received.
    pub fn should_retry(&self, state: &RetryState, status: Option<u16>) -> bool {
        if state.retry_count >= state.max_retries {
            return false;
        }
        match status {
            None => true,
            Some(status) => self.retry_status_codes.contains(&status),
        }
    }

    /// Delay before retry number `retry_count` (0-indexed): `retry_delay * 2^retry_count`.
    pub fn backoff(&self, retry_count: u32) -> Duration {
        let base_ms = u64::try_from(self.retry_delay.as_millis()).unwrap_or(u64::MAX);
        let multiplier = 1u64.checked_shl(retry_count).unwrap_or(u64::MAX);
        let delay = Duration::from_millis(base_ms.saturating_mul(multiplier));
        match self.max_delay {
            Some(ceiling) => delay.min(ceiling),
            None => delay,
        }
    }
}

/// Retry metadata of one logical call. Never shared between calls.
#[derive(Clone, Debug)]
pub struct RetryState {
    /// Retries performed so far; never exceeds `max_retries`.
    pub retry_count: u32,
    pub max_retries: u32,
    pub started_at: Instant,
}

impl RetryState {
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::RetryPolicy;
    use crate::ClientConfig;

    fn policy(max_retries: u32, delay_ms: u64) -> RetryPolicy {
        RetryPolicy::from_config(&ClientConfig {
            max_retries,
            retry_delay_ms: delay_ms,
            retry_status_codes: vec![429, 500, 503],
            ..ClientConfig::default()
        })
    }

    #[test]
    fn retries_listed_status_within_budget() {
        let policy = policy(2, 100);
        let state = policy.begin();
        assert!(policy.should_retry(&state, Some(503)));
        assert!(policy.should_retry(&state, Some(429)));
    }

    #[test]
    fn never_retries_unlisted_status() {
        let policy = policy(5, 100);
        let state = policy.begin();
        assert!(!policy.should_retry(&state, Some(404)));
        assert!(!policy.should_retry(&state, Some(400)));
    }

    #[test]
    fn retries_when_no_response_was_received() {
        let policy = policy(1, 100);
        assert!(policy.should_retry(&policy.begin(), None));
    }

    #[test]
    fn budget_exhaustion_is_terminal() {
        let policy = policy(2, 100);
        let mut state = policy.begin();
        state.retry_count = 2;
        assert!(!policy.should_retry(&state, Some(503)));
        assert!(!policy.should_retry(&state, None));
    }

    #[test]
    fn zero_budget_never_retries() {
        let policy = policy(0, 100);
        assert!(!policy.should_retry(&policy.begin(), None));
    }

    #[test]
    fn backoff_doubles_per_retry() {
        let policy = policy(3, 100);
        assert_eq!(policy.backoff(0), Duration::from_millis(100));
        assert_eq!(policy.backoff(1), Duration::from_millis(200));
        assert_eq!(policy.backoff(2), Duration::from_millis(400));
    }

    #[test]
    fn backoff_saturates_instead_of_overflowing() {
        let policy = policy(100, 1_000);
        assert_eq!(policy.backoff(80), Duration::from_millis(u64::MAX));
    }

    #[test]
    fn backoff_respects_ceiling() {
        let mut policy = policy(10, 100);
        policy.max_delay = Some(Duration::from_millis(250));
        assert_eq!(policy.backoff(1), Duration::from_millis(200));
        assert_eq!(policy.backoff(2), Duration::from_millis(250));
        assert_eq!(policy.backoff(9), Duration::from_millis(250));
    }
}
