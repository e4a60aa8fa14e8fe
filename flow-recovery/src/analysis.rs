//! Failure analysis value objects.
//!
//! A [`FailureAnalysis`] is produced fresh on every
//! [`analyze_failure`](crate::orchestrator::RecoveryOrchestrator::analyze_failure)
//! call and is never persisted beyond being logged.

use serde::{Deserialize, Serialize};

use crate::classify::{ErrorKind, FailureCategory};
use crate::strategy::RecoveryStrategy;

/// Context extracted from the execution the error occurred in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureContext {
    /// The failing node's id, if one was identified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    /// The failing node's display name, resolved from the workflow.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_name: Option<String>,
    /// The raw error code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    /// The raw HTTP status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    /// Whether the error looked like a network-level failure.
    #[serde(default)]
    pub is_network_error: bool,
    /// Whether the error looked like resource exhaustion.
    #[serde(default)]
    pub is_resource_exhaustion: bool,
}

impl FailureContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the node id.
    #[must_use]
    pub fn with_node_id(mut self, node_id: impl Into<String>) -> Self {
        self.node_id = Some(node_id.into());
        self
    }

    /// Sets the node name.
    #[must_use]
    pub fn with_node_name(mut self, node_name: impl Into<String>) -> Self {
        self.node_name = Some(node_name.into());
        self
    }
}

/// The structured result of analyzing a failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureAnalysis {
    /// Symbolic error type.
    pub error_type: ErrorKind,
    /// Broad failure category.
    pub category: FailureCategory,
    /// Whether the active policy allows automatic retry.
    pub retryable: bool,
    /// Heuristic confidence in the diagnosis, in `[0, 1]`.
    pub confidence: f64,
    /// The strategy the planner proposes.
    pub suggested_strategy: RecoveryStrategy,
    /// Context extracted from the execution.
    pub context: FailureContext,
    /// Ordered remediation hints for display.
    pub recommendations: Vec<String>,
}

impl FailureAnalysis {
    /// The safe default returned when analysis itself fails.
    ///
    /// Analysis runs after something has already gone wrong, so it must
    /// never crash the caller; this value routes the execution to manual
    /// handling with low confidence.
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            error_type: ErrorKind::UnknownError,
            category: FailureCategory::Permanent,
            retryable: false,
            confidence: 0.1,
            suggested_strategy: RecoveryStrategy::manual(),
            context: FailureContext::default(),
            recommendations: vec![
                "Manual investigation required".to_string(),
                "Check system logs".to_string(),
            ],
        }
    }
}
