//! Strategy planning: classification in, concrete recovery action out.
//!
//! The plan is an ordered decision list; the first matching branch wins.

use crate::analysis::FailureContext;
use crate::checkpoint::RecoveryPoint;
use crate::classify::{ErrorKind, FailureCategory};
use crate::policy::RetryPolicyOverride;
use crate::strategy::RecoveryStrategy;

/// Proposes a recovery strategy for a classified failure.
///
/// `points` is the execution's recovery-point list in creation order; the
/// timeout branch restarts from the most recent point when one exists.
#[must_use]
pub fn plan_strategy(
    kind: ErrorKind,
    category: FailureCategory,
    retryable: bool,
    context: &FailureContext,
    points: &[RecoveryPoint],
) -> RecoveryStrategy {
    if category == FailureCategory::Transient && retryable {
        // Rate limiting gets a longer leash than other transient failures.
        let policy = if kind == ErrorKind::RateLimit {
            RetryPolicyOverride::new()
                .with_max_retries(5)
                .with_retry_delay_ms(5000)
                .with_exponential_backoff(true)
        } else {
            RetryPolicyOverride::new()
                .with_max_retries(3)
                .with_retry_delay_ms(1000)
                .with_exponential_backoff(true)
        };
        return RecoveryStrategy::Retry {
            node_id: context.node_id.clone(),
            from_checkpoint: None,
            policy: Some(policy),
        };
    }

    if category == FailureCategory::Configuration {
        return RecoveryStrategy::Manual {
            node_id: context.node_id.clone(),
            note: Some(format!("Fix required before resuming: {kind}")),
        };
    }

    if category == FailureCategory::Timeout {
        if let Some(latest) = points.last() {
            return RecoveryStrategy::Restart {
                from_checkpoint: Some(latest.node_id.clone()),
            };
        }
        // Single attempt, so no backoff multiplier is needed.
        return RecoveryStrategy::Retry {
            node_id: context.node_id.clone(),
            from_checkpoint: None,
            policy: Some(
                RetryPolicyOverride::new()
                    .with_max_retries(1)
                    .with_retry_delay_ms(2000)
                    .with_exponential_backoff(false),
            ),
        };
    }

    RecoveryStrategy::Manual {
        node_id: context.node_id.clone(),
        note: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::RecoveryPointStore;
    use serde_json::json;

    fn ctx(node_id: Option<&str>) -> FailureContext {
        FailureContext {
            node_id: node_id.map(str::to_string),
            ..FailureContext::default()
        }
    }

    #[test]
    fn test_transient_retryable_gets_retry() {
        let strategy = plan_strategy(
            ErrorKind::NetworkError,
            FailureCategory::Transient,
            true,
            &ctx(Some("n1")),
            &[],
        );

        match strategy {
            RecoveryStrategy::Retry {
                node_id,
                policy: Some(policy),
                ..
            } => {
                assert_eq!(node_id.as_deref(), Some("n1"));
                assert_eq!(policy.max_retries, Some(3));
                assert_eq!(policy.retry_delay_ms, Some(1000));
                assert_eq!(policy.exponential_backoff, Some(true));
            }
            other => panic!("expected retry, got {other:?}"),
        }
    }

    #[test]
    fn test_rate_limit_gets_longer_retry() {
        let strategy = plan_strategy(
            ErrorKind::RateLimit,
            FailureCategory::Transient,
            true,
            &ctx(Some("n1")),
            &[],
        );

        match strategy {
            RecoveryStrategy::Retry {
                policy: Some(policy),
                ..
            } => {
                assert_eq!(policy.max_retries, Some(5));
                assert_eq!(policy.retry_delay_ms, Some(5000));
            }
            other => panic!("expected retry, got {other:?}"),
        }
    }

    #[test]
    fn test_transient_not_retryable_falls_through_to_manual() {
        let strategy = plan_strategy(
            ErrorKind::ServiceUnavailable,
            FailureCategory::Transient,
            false,
            &ctx(Some("n1")),
            &[],
        );
        assert!(matches!(
            strategy,
            RecoveryStrategy::Manual { note: None, .. }
        ));
    }

    #[test]
    fn test_configuration_gets_manual_with_error_type_note() {
        let strategy = plan_strategy(
            ErrorKind::AuthenticationError,
            FailureCategory::Configuration,
            false,
            &ctx(Some("n1")),
            &[],
        );

        match strategy {
            RecoveryStrategy::Manual {
                node_id,
                note: Some(note),
            } => {
                assert_eq!(node_id.as_deref(), Some("n1"));
                assert!(note.contains("authentication_error"));
            }
            other => panic!("expected manual, got {other:?}"),
        }
    }

    #[test]
    fn test_timeout_without_checkpoint_gets_single_retry() {
        let strategy = plan_strategy(
            ErrorKind::Timeout,
            FailureCategory::Timeout,
            true,
            &ctx(Some("n1")),
            &[],
        );

        match strategy {
            RecoveryStrategy::Retry {
                policy: Some(policy),
                ..
            } => {
                assert_eq!(policy.max_retries, Some(1));
                assert_eq!(policy.retry_delay_ms, Some(2000));
                assert_eq!(policy.exponential_backoff, Some(false));
            }
            other => panic!("expected retry, got {other:?}"),
        }
    }

    #[test]
    fn test_timeout_with_checkpoint_restarts_from_latest() {
        let store = RecoveryPointStore::new();
        store.append("e1", "n1", json!({"step": 1}));
        store.append("e1", "n2", json!({"step": 2}));
        let points = store.list("e1");

        let strategy = plan_strategy(
            ErrorKind::Timeout,
            FailureCategory::Timeout,
            true,
            &ctx(Some("n3")),
            &points,
        );

        assert_eq!(
            strategy,
            RecoveryStrategy::Restart {
                from_checkpoint: Some("n2".to_string())
            }
        );
    }

    #[test]
    fn test_default_branch_is_manual() {
        let strategy = plan_strategy(
            ErrorKind::UnknownError,
            FailureCategory::Permanent,
            false,
            &ctx(None),
            &[],
        );
        assert_eq!(
            strategy,
            RecoveryStrategy::Manual {
                node_id: None,
                note: None
            }
        );
    }
}
