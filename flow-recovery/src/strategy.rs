//! Recovery strategy value objects.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::RecoveryError;
use crate::policy::RetryPolicyOverride;

/// A concrete, parameterized recovery action.
///
/// Exactly one variant is active at a time; the value is immutable once
/// planned. Operator-supplied strategies arrive as JSON and go through
/// [`RecoveryStrategy::from_value`], which rejects unknown `type` tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecoveryStrategy {
    /// Re-run the failing node after a backoff delay.
    Retry {
        /// The node to retry, if known.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        node_id: Option<String>,
        /// Checkpoint to resume from, if any.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from_checkpoint: Option<String>,
        /// Per-invocation policy override.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        policy: Option<RetryPolicyOverride>,
    },
    /// Mark the failing node as skipped and let the execution continue.
    Skip {
        /// The node to skip.
        node_id: String,
    },
    /// Reset the execution to run again, optionally from a checkpoint.
    Restart {
        /// Checkpoint node to restart from, if any.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from_checkpoint: Option<String>,
    },
    /// Pause the execution and wait for an operator.
    Manual {
        /// The node needing attention, if known.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        node_id: Option<String>,
        /// Free-form note for the operator.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        note: Option<String>,
    },
}

impl RecoveryStrategy {
    /// Creates a retry strategy for a node with no overrides.
    #[must_use]
    pub fn retry(node_id: impl Into<String>) -> Self {
        Self::Retry {
            node_id: Some(node_id.into()),
            from_checkpoint: None,
            policy: None,
        }
    }

    /// Creates a skip strategy for a node.
    #[must_use]
    pub fn skip(node_id: impl Into<String>) -> Self {
        Self::Skip {
            node_id: node_id.into(),
        }
    }

    /// Creates a restart strategy with no checkpoint.
    #[must_use]
    pub const fn restart() -> Self {
        Self::Restart {
            from_checkpoint: None,
        }
    }

    /// Creates a manual strategy with no target node.
    #[must_use]
    pub const fn manual() -> Self {
        Self::Manual {
            node_id: None,
            note: None,
        }
    }

    /// Returns the discriminant for logging and events.
    #[must_use]
    pub const fn kind(&self) -> StrategyKind {
        match self {
            Self::Retry { .. } => StrategyKind::Retry,
            Self::Skip { .. } => StrategyKind::Skip,
            Self::Restart { .. } => StrategyKind::Restart,
            Self::Manual { .. } => StrategyKind::Manual,
        }
    }

    /// Parses a strategy from operator-supplied JSON.
    ///
    /// # Errors
    ///
    /// Returns [`RecoveryError::InvalidStrategy`] when the `type` tag is
    /// unknown or the payload does not match the variant's shape.
    pub fn from_value(value: serde_json::Value) -> Result<Self, RecoveryError> {
        serde_json::from_value(value)
            .map_err(|err| RecoveryError::invalid_strategy(err.to_string()))
    }
}

/// Strategy discriminant, used in events and log fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Re-run after backoff.
    Retry,
    /// Skip the failing node.
    Skip,
    /// Reset and re-run the execution.
    Restart,
    /// Wait for an operator.
    Manual,
}

impl StrategyKind {
    /// Returns the snake_case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Retry => "retry",
            Self::Skip => "skip",
            Self::Restart => "restart",
            Self::Manual => "manual",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_discriminants() {
        assert_eq!(RecoveryStrategy::retry("n1").kind(), StrategyKind::Retry);
        assert_eq!(RecoveryStrategy::skip("n1").kind(), StrategyKind::Skip);
        assert_eq!(RecoveryStrategy::restart().kind(), StrategyKind::Restart);
        assert_eq!(RecoveryStrategy::manual().kind(), StrategyKind::Manual);
    }

    #[test]
    fn test_tagged_json_roundtrip() {
        let strategy = RecoveryStrategy::Retry {
            node_id: Some("n1".to_string()),
            from_checkpoint: None,
            policy: Some(RetryPolicyOverride::new().with_max_retries(5)),
        };

        let json = serde_json::to_value(&strategy).unwrap();
        assert_eq!(json["type"], "retry");
        assert_eq!(json["node_id"], "n1");

        let back = RecoveryStrategy::from_value(json).unwrap();
        assert_eq!(back, strategy);
    }

    #[test]
    fn test_unknown_tag_is_invalid_strategy() {
        let result = RecoveryStrategy::from_value(json!({"type": "rollback"}));
        assert!(matches!(
            result,
            Err(RecoveryError::InvalidStrategy { .. })
        ));
    }

    #[test]
    fn test_skip_requires_node_id() {
        let result = RecoveryStrategy::from_value(json!({"type": "skip"}));
        assert!(result.is_err());

        let ok = RecoveryStrategy::from_value(json!({"type": "skip", "node_id": "n2"})).unwrap();
        assert_eq!(ok, RecoveryStrategy::skip("n2"));
    }

    #[test]
    fn test_manual_optional_fields() {
        let parsed = RecoveryStrategy::from_value(json!({"type": "manual"})).unwrap();
        assert_eq!(parsed, RecoveryStrategy::manual());
    }
}
