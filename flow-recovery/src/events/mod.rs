//! Typed recovery lifecycle events and the sink they are published on.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};

use serde::{Deserialize, Serialize};

use crate::classify::{ErrorKind, FailureCategory};
use crate::strategy::StrategyKind;

/// A recovery lifecycle event.
///
/// Every event carries the execution id it concerns; kind-specific payload
/// fields mirror what the history log records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RecoveryEvent {
    /// A failure was analyzed and a strategy was suggested.
    FailureAnalyzed {
        /// The execution the failure occurred in.
        execution_id: String,
        /// Symbolic error type.
        error_type: ErrorKind,
        /// Broad failure category.
        category: FailureCategory,
        /// Diagnosis confidence.
        confidence: f64,
        /// Whether automatic retry is permitted.
        retryable: bool,
        /// The kind of strategy suggested.
        strategy: StrategyKind,
    },
    /// A recovery point was appended for the execution.
    RecoveryPointCreated {
        /// The execution the point belongs to.
        execution_id: String,
        /// The node whose state was snapshotted.
        node_id: String,
        /// The point's fingerprint.
        fingerprint: String,
    },
    /// A recovery strategy executed successfully.
    RecoverySuccessful {
        /// The recovered execution.
        execution_id: String,
        /// The strategy that ran.
        strategy: StrategyKind,
    },
    /// A recovery strategy ran but declined (e.g. retry limit reached).
    RecoveryFailed {
        /// The execution recovery was attempted for.
        execution_id: String,
        /// The strategy that declined.
        strategy: StrategyKind,
    },
    /// A recovery strategy hit an internal error.
    RecoveryError {
        /// The execution recovery was attempted for.
        execution_id: String,
        /// The error message.
        message: String,
    },
    /// Recovery bookkeeping for the execution was cleared.
    RecoveryDataCleanup {
        /// The cleaned-up execution.
        execution_id: String,
    },
}

impl RecoveryEvent {
    /// Returns the event name as used in the serialized `event` tag.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::FailureAnalyzed { .. } => "failure_analyzed",
            Self::RecoveryPointCreated { .. } => "recovery_point_created",
            Self::RecoverySuccessful { .. } => "recovery_successful",
            Self::RecoveryFailed { .. } => "recovery_failed",
            Self::RecoveryError { .. } => "recovery_error",
            Self::RecoveryDataCleanup { .. } => "recovery_data_cleanup",
        }
    }

    /// Returns the execution id the event concerns.
    #[must_use]
    pub fn execution_id(&self) -> &str {
        match self {
            Self::FailureAnalyzed { execution_id, .. }
            | Self::RecoveryPointCreated { execution_id, .. }
            | Self::RecoverySuccessful { execution_id, .. }
            | Self::RecoveryFailed { execution_id, .. }
            | Self::RecoveryError { execution_id, .. }
            | Self::RecoveryDataCleanup { execution_id } => execution_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_matches_serde_tag() {
        let event = RecoveryEvent::RecoverySuccessful {
            execution_id: "e1".to_string(),
            strategy: StrategyKind::Retry,
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], event.name());
        assert_eq!(json["strategy"], "retry");
    }

    #[test]
    fn test_execution_id_accessor() {
        let event = RecoveryEvent::RecoveryDataCleanup {
            execution_id: "e9".to_string(),
        };
        assert_eq!(event.execution_id(), "e9");
    }
}
