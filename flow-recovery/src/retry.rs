//! Retry attempt tracking and backoff arithmetic.

use dashmap::DashMap;
use std::time::Duration;

use crate::policy::RetryPolicy;

/// Builds the tracker key for an execution and optional node.
///
/// A missing node id means the retry targets the whole execution.
#[must_use]
pub fn retry_key(execution_id: &str, node_id: Option<&str>) -> String {
    format!("{execution_id}:{}", node_id.unwrap_or("execution"))
}

/// Computes the delay before a given attempt (0-indexed).
///
/// Exponential backoff doubles the base per recorded attempt, with
/// saturating arithmetic so pathological counts cannot overflow.
#[must_use]
pub fn backoff_delay(policy: &RetryPolicy, attempt: u32) -> Duration {
    let base = policy.retry_delay_ms;
    let millis = if policy.exponential_backoff {
        base.saturating_mul(2u64.saturating_pow(attempt))
    } else {
        base
    };
    Duration::from_millis(millis)
}

/// Process-wide per-key retry attempt counter.
///
/// Counts are monotonically increasing per key until reset via cleanup.
/// Concurrent access from different executions is safe because keys are
/// disjoint; racing increments of the same key must be prevented by the
/// caller's sequencing discipline.
#[derive(Debug, Default)]
pub struct RetryAttemptTracker {
    counts: DashMap<String, u32>,
}

impl RetryAttemptTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an attempt and returns the new count.
    pub fn increment(&self, key: &str) -> u32 {
        let mut entry = self.counts.entry(key.to_string()).or_insert(0);
        *entry += 1;
        *entry
    }

    /// Returns the current count, 0 if the key is unknown.
    #[must_use]
    pub fn get(&self, key: &str) -> u32 {
        self.counts.get(key).map_or(0, |entry| *entry)
    }

    /// Forgets a single key.
    pub fn reset(&self, key: &str) {
        self.counts.remove(key);
    }

    /// Forgets every key belonging to an execution.
    pub fn reset_execution(&self, execution_id: &str) {
        let prefix = format!("{execution_id}:");
        self.counts.retain(|key, _| !key.starts_with(&prefix));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_key_shapes() {
        assert_eq!(retry_key("e1", Some("n1")), "e1:n1");
        assert_eq!(retry_key("e1", None), "e1:execution");
    }

    #[test]
    fn test_backoff_exponential_sequence() {
        let policy = RetryPolicy::default()
            .with_retry_delay_ms(1000)
            .with_exponential_backoff(true);

        assert_eq!(backoff_delay(&policy, 0), Duration::from_millis(1000));
        assert_eq!(backoff_delay(&policy, 1), Duration::from_millis(2000));
        assert_eq!(backoff_delay(&policy, 2), Duration::from_millis(4000));
    }

    #[test]
    fn test_backoff_constant_when_disabled() {
        let policy = RetryPolicy::default()
            .with_retry_delay_ms(2000)
            .with_exponential_backoff(false);

        assert_eq!(backoff_delay(&policy, 0), Duration::from_millis(2000));
        assert_eq!(backoff_delay(&policy, 7), Duration::from_millis(2000));
    }

    #[test]
    fn test_backoff_saturates() {
        let policy = RetryPolicy::default().with_retry_delay_ms(u64::MAX / 2);
        let delay = backoff_delay(&policy, 63);
        assert_eq!(delay, Duration::from_millis(u64::MAX));
    }

    #[test]
    fn test_tracker_increment_and_get() {
        let tracker = RetryAttemptTracker::new();
        let key = retry_key("e1", Some("n1"));

        assert_eq!(tracker.get(&key), 0);
        assert_eq!(tracker.increment(&key), 1);
        assert_eq!(tracker.increment(&key), 2);
        assert_eq!(tracker.get(&key), 2);
    }

    #[test]
    fn test_tracker_reset_single_key() {
        let tracker = RetryAttemptTracker::new();
        tracker.increment("e1:n1");
        tracker.reset("e1:n1");
        assert_eq!(tracker.get("e1:n1"), 0);
    }

    #[test]
    fn test_reset_execution_sweeps_prefix_only() {
        let tracker = RetryAttemptTracker::new();
        tracker.increment(&retry_key("e1", Some("n1")));
        tracker.increment(&retry_key("e1", None));
        tracker.increment(&retry_key("e10", Some("n1")));
        tracker.increment(&retry_key("e2", Some("n1")));

        tracker.reset_execution("e1");

        assert_eq!(tracker.get("e1:n1"), 0);
        assert_eq!(tracker.get("e1:execution"), 0);
        // "e10" shares a string prefix but not a key prefix.
        assert_eq!(tracker.get("e10:n1"), 1);
        assert_eq!(tracker.get("e2:n1"), 1);
    }
}
