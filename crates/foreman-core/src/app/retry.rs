//! Retry decisions: what happens to failed jobs, and when a failed
//! reconcile is delivered again.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::Job;

/// What an agent does with a job that ended `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryPolicy {
    /// Keep the job queued and re-execute it every cycle. `backoffLimit` is
    /// not consulted.
    #[default]
    Unbounded,

    /// Re-execute until `failed > backoffLimit`, then drop the job from the
    /// queue. It stays `Failed` in the store.
    BackoffLimit,
}

impl RetryPolicy {
    /// Should a just-failed job stay in the agent's queue?
    pub fn keep_queued(self, job: &Job) -> bool {
        match self {
            RetryPolicy::Unbounded => true,
            RetryPolicy::BackoffLimit => !job.backoff_exhausted(),
        }
    }
}

/// Exponential requeue delay for reconcile keys that failed with a
/// retryable error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequeuePolicy {
    /// Delay before the first redelivery.
    pub base_delay_ms: u64,

    /// Backoff multiplier.
    pub multiplier: f64,

    /// Upper bound on any single delay.
    pub max_delay_ms: u64,
}

impl Default for RequeuePolicy {
    fn default() -> Self {
        Self {
            base_delay_ms: 5,
            multiplier: 2.0,
            max_delay_ms: 60_000,
        }
    }
}

impl RequeuePolicy {
    /// Delay before redelivery number `attempts` (1-indexed).
    ///
    /// `base * multiplier^(attempts - 1)`, capped at `max_delay_ms`.
    pub fn next_delay(&self, attempts: u32) -> Duration {
        let base = self.base_delay_ms as f64;
        let exp = attempts.saturating_sub(1).min(i32::MAX as u32) as i32;
        let delay_ms = (base * self.multiplier.powi(exp)).min(self.max_delay_ms as f64);
        Duration::from_millis(delay_ms.max(0.0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn failed_job(limit: u32, failures: u32) -> Job {
        let mut job = Job::new("default", "a").with_backoff_limit(limit);
        job.mark_pending().unwrap();
        for _ in 0..failures {
            job.record_result(1).unwrap();
        }
        job
    }

    #[rstest]
    #[case::first_failure(0, 1, true)]
    #[case::many_failures(0, 50, true)]
    fn unbounded_always_keeps(#[case] limit: u32, #[case] failures: u32, #[case] keep: bool) {
        let job = failed_job(limit, failures);
        assert_eq!(RetryPolicy::Unbounded.keep_queued(&job), keep);
    }

    #[rstest]
    #[case::no_retries_allowed(0, 1, false)]
    #[case::within_limit(2, 2, true)]
    #[case::limit_exceeded(2, 3, false)]
    fn backoff_limit_drops_after_limit(
        #[case] limit: u32,
        #[case] failures: u32,
        #[case] keep: bool,
    ) {
        let job = failed_job(limit, failures);
        assert_eq!(RetryPolicy::BackoffLimit.keep_queued(&job), keep);
    }

    #[test]
    fn requeue_backoff_grows_and_caps() {
        let policy = RequeuePolicy {
            base_delay_ms: 100,
            multiplier: 2.0,
            max_delay_ms: 500,
        };
        assert_eq!(policy.next_delay(1), Duration::from_millis(100));
        assert_eq!(policy.next_delay(2), Duration::from_millis(200));
        assert_eq!(policy.next_delay(3), Duration::from_millis(400));
        assert_eq!(policy.next_delay(4), Duration::from_millis(500));
        assert_eq!(policy.next_delay(u32::MAX), Duration::from_millis(500));
    }

    #[test]
    fn retry_policy_parses_from_snake_case() {
        let p: RetryPolicy = serde_json::from_str("\"backoff_limit\"").unwrap();
        assert_eq!(p, RetryPolicy::BackoffLimit);
        assert_eq!(RetryPolicy::default(), RetryPolicy::Unbounded);
    }
}
