//! Retry policy and engine configuration.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::classify::ErrorKind;

/// Policy governing automatic retries.
///
/// The default instance is the engine-wide baseline; callers override a
/// subset per invocation via [`RetryPolicyOverride`]. The stop set always
/// takes precedence over the retryable set when both match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum retry attempts per key before the tracker refuses more.
    pub max_retries: u32,
    /// Base delay between attempts in milliseconds.
    pub retry_delay_ms: u64,
    /// Whether delay doubles with each recorded attempt.
    pub exponential_backoff: bool,
    /// Error kinds allow-listed for automatic retry.
    pub retryable_errors: HashSet<ErrorKind>,
    /// Error kinds that must never be retried, even if allow-listed.
    pub stop_errors: HashSet<ErrorKind>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay_ms: 1000,
            exponential_backoff: true,
            retryable_errors: HashSet::from([
                ErrorKind::NetworkError,
                ErrorKind::Timeout,
                ErrorKind::RateLimit,
                ErrorKind::ServiceUnavailable,
            ]),
            stop_errors: HashSet::from([
                ErrorKind::AuthenticationError,
                ErrorKind::AuthorizationError,
                ErrorKind::ConfigurationError,
                ErrorKind::ValidationError,
            ]),
        }
    }
}

impl RetryPolicy {
    /// Creates the default policy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum retries.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the base delay.
    #[must_use]
    pub fn with_retry_delay_ms(mut self, delay_ms: u64) -> Self {
        self.retry_delay_ms = delay_ms;
        self
    }

    /// Enables or disables exponential backoff.
    #[must_use]
    pub fn with_exponential_backoff(mut self, enabled: bool) -> Self {
        self.exponential_backoff = enabled;
        self
    }

    /// Replaces the retryable set.
    #[must_use]
    pub fn with_retryable_errors(mut self, kinds: HashSet<ErrorKind>) -> Self {
        self.retryable_errors = kinds;
        self
    }

    /// Replaces the stop set.
    #[must_use]
    pub fn with_stop_errors(mut self, kinds: HashSet<ErrorKind>) -> Self {
        self.stop_errors = kinds;
        self
    }

    /// Shallow-merges an override onto this policy.
    #[must_use]
    pub fn apply(&self, overrides: &RetryPolicyOverride) -> Self {
        Self {
            max_retries: overrides.max_retries.unwrap_or(self.max_retries),
            retry_delay_ms: overrides.retry_delay_ms.unwrap_or(self.retry_delay_ms),
            exponential_backoff: overrides
                .exponential_backoff
                .unwrap_or(self.exponential_backoff),
            retryable_errors: overrides
                .retryable_errors
                .clone()
                .unwrap_or_else(|| self.retryable_errors.clone()),
            stop_errors: overrides
                .stop_errors
                .clone()
                .unwrap_or_else(|| self.stop_errors.clone()),
        }
    }

    /// Returns true iff the kind is allow-listed and not deny-listed.
    #[must_use]
    pub fn is_retryable(&self, kind: ErrorKind) -> bool {
        self.retryable_errors.contains(&kind) && !self.stop_errors.contains(&kind)
    }
}

/// A partial policy: `None` fields fall back to the base policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicyOverride {
    /// Overrides [`RetryPolicy::max_retries`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
    /// Overrides [`RetryPolicy::retry_delay_ms`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_delay_ms: Option<u64>,
    /// Overrides [`RetryPolicy::exponential_backoff`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exponential_backoff: Option<bool>,
    /// Overrides [`RetryPolicy::retryable_errors`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retryable_errors: Option<HashSet<ErrorKind>>,
    /// Overrides [`RetryPolicy::stop_errors`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_errors: Option<HashSet<ErrorKind>>,
}

impl RetryPolicyOverride {
    /// Creates an empty override.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the max-retries override.
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// Sets the base-delay override.
    #[must_use]
    pub const fn with_retry_delay_ms(mut self, delay_ms: u64) -> Self {
        self.retry_delay_ms = Some(delay_ms);
        self
    }

    /// Sets the backoff override.
    #[must_use]
    pub const fn with_exponential_backoff(mut self, enabled: bool) -> Self {
        self.exponential_backoff = Some(enabled);
        self
    }
}

/// Engine-wide recovery configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryConfig {
    /// Baseline retry policy.
    pub policy: RetryPolicy,
    /// Minimum analysis confidence before `auto_recover` acts.
    pub auto_recover_confidence_threshold: f64,
    /// Actor name recorded on history entries written by the engine.
    pub actor: String,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            policy: RetryPolicy::default(),
            auto_recover_confidence_threshold: 0.7,
            actor: "recovery".to_string(),
        }
    }
}

impl RecoveryConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the baseline policy.
    #[must_use]
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the auto-recovery confidence threshold.
    #[must_use]
    pub const fn with_confidence_threshold(mut self, threshold: f64) -> Self {
        self.auto_recover_confidence_threshold = threshold;
        self
    }

    /// Sets the history actor name.
    #[must_use]
    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = actor.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.retry_delay_ms, 1000);
        assert!(policy.exponential_backoff);
        assert!(policy.retryable_errors.contains(&ErrorKind::NetworkError));
        assert!(policy.stop_errors.contains(&ErrorKind::AuthenticationError));
    }

    #[test]
    fn test_is_retryable_stop_set_wins() {
        let policy = RetryPolicy::default()
            .with_retryable_errors(HashSet::from([ErrorKind::Timeout]))
            .with_stop_errors(HashSet::from([ErrorKind::Timeout]));

        assert!(!policy.is_retryable(ErrorKind::Timeout));
    }

    #[test]
    fn test_is_retryable_defaults() {
        let policy = RetryPolicy::default();
        assert!(policy.is_retryable(ErrorKind::NetworkError));
        assert!(policy.is_retryable(ErrorKind::RateLimit));
        assert!(!policy.is_retryable(ErrorKind::AuthenticationError));
        assert!(!policy.is_retryable(ErrorKind::UnknownError));
    }

    #[test]
    fn test_override_shallow_merge() {
        let base = RetryPolicy::default();
        let merged = base.apply(
            &RetryPolicyOverride::new()
                .with_max_retries(5)
                .with_retry_delay_ms(5000),
        );

        assert_eq!(merged.max_retries, 5);
        assert_eq!(merged.retry_delay_ms, 5000);
        // Untouched fields keep the base values.
        assert!(merged.exponential_backoff);
        assert_eq!(merged.retryable_errors, base.retryable_errors);
    }

    #[test]
    fn test_empty_override_is_identity() {
        let base = RetryPolicy::default();
        assert_eq!(base.apply(&RetryPolicyOverride::default()), base);
    }

    #[test]
    fn test_config_defaults() {
        let config = RecoveryConfig::default();
        assert!((config.auto_recover_confidence_threshold - 0.7).abs() < f64::EPSILON);
        assert_eq!(config.actor, "recovery");
    }

    #[test]
    fn test_override_serde_roundtrip() {
        let overrides = RetryPolicyOverride::new().with_max_retries(1);
        let json = serde_json::to_string(&overrides).unwrap();
        let back: RetryPolicyOverride = serde_json::from_str(&json).unwrap();
        assert_eq!(back, overrides);
    }
}
