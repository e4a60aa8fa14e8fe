//! External collaborator interfaces and the minimal execution model.
//!
//! The recovery engine does not own execution state; it reads and
//! transitions records held by an external store through the seams below.
//! Only the fields this subsystem touches are modeled.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::checkpoint::RecoveryPoint;
use crate::errors::StoreError;

/// Lifecycle status of a workflow execution.
///
/// `Paused` is a non-terminal "awaiting operator" state used by the manual
/// recovery strategy, deliberately distinct from the terminal `Cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// Actively executing nodes.
    Running,
    /// Finished successfully (terminal).
    Success,
    /// Finished with an error (terminal).
    Error,
    /// Cancelled by a user (terminal).
    Cancelled,
    /// Paused awaiting manual intervention (non-terminal).
    Paused,
}

impl ExecutionStatus {
    /// Returns true for terminal states.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Error | Self::Cancelled)
    }
}

/// Lifecycle status of a single node execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    /// Not started yet.
    Waiting,
    /// Currently executing.
    Running,
    /// Completed successfully.
    Success,
    /// Failed.
    Error,
    /// Skipped by a recovery decision.
    Skipped,
}

/// A node definition inside a workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowNode {
    /// Stable node id.
    pub id: String,
    /// Display name.
    pub name: String,
}

/// The workflow a running execution was instantiated from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workflow {
    /// Workflow id.
    pub id: String,
    /// Node definitions.
    pub nodes: Vec<WorkflowNode>,
}

impl Workflow {
    /// Resolves a node's display name by id.
    #[must_use]
    pub fn node_name(&self, node_id: &str) -> Option<&str> {
        self.nodes
            .iter()
            .find(|node| node.id == node_id)
            .map(|node| node.name.as_str())
    }
}

/// The per-node execution record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeExecution {
    /// Record id.
    pub id: String,
    /// The workflow node this record belongs to.
    pub node_id: String,
    /// Current status.
    pub status: NodeStatus,
    /// When the node started.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    /// When the node finished.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    /// Error message, if the node failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Output payload, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<serde_json::Value>,
}

/// A workflow execution, as much of it as recovery needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Execution {
    /// Execution id.
    pub id: String,
    /// Current status.
    pub status: ExecutionStatus,
    /// The workflow definition.
    pub workflow: Workflow,
    /// Node execution records.
    pub node_executions: Vec<NodeExecution>,
    /// Terminal timestamp, if finished.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    /// Execution-level error annotation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Execution {
    /// Returns the first node execution in ERROR status, if any.
    #[must_use]
    pub fn first_error_node(&self) -> Option<&NodeExecution> {
        self.node_executions
            .iter()
            .find(|node| node.status == NodeStatus::Error)
    }
}

/// Selects node executions within one execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeExecutionFilter {
    /// The execution to select within.
    pub execution_id: String,
    /// Restrict to one node, if set.
    pub node_id: Option<String>,
    /// Restrict to one status, if set.
    pub status: Option<NodeStatus>,
}

impl NodeExecutionFilter {
    /// Selects all node executions of an execution.
    #[must_use]
    pub fn all(execution_id: impl Into<String>) -> Self {
        Self {
            execution_id: execution_id.into(),
            node_id: None,
            status: None,
        }
    }

    /// Restricts the filter to one node.
    #[must_use]
    pub fn with_node_id(mut self, node_id: impl Into<String>) -> Self {
        self.node_id = Some(node_id.into());
        self
    }

    /// Restricts the filter to one status.
    #[must_use]
    pub const fn with_status(mut self, status: NodeStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Returns true if a record matches this filter.
    #[must_use]
    pub fn matches(&self, node: &NodeExecution) -> bool {
        self.node_id
            .as_deref()
            .map_or(true, |id| node.node_id == id)
            && self.status.map_or(true, |status| node.status == status)
    }
}

/// A patch applied to matching node executions.
///
/// `clear_*` flags blank fields out explicitly, so a caller can distinguish
/// "leave untouched" from "set to nothing".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeExecutionPatch {
    /// New status, if set.
    pub status: Option<NodeStatus>,
    /// New output payload, if set.
    pub output: Option<serde_json::Value>,
    /// New error message, if set.
    pub error: Option<String>,
    /// New finished-at timestamp, if set.
    pub finished_at: Option<DateTime<Utc>>,
    /// Blank out the error field.
    pub clear_error: bool,
    /// Blank out the output field.
    pub clear_output: bool,
    /// Blank out both timestamps.
    pub clear_timestamps: bool,
}

impl NodeExecutionPatch {
    /// Creates an empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the status.
    #[must_use]
    pub const fn with_status(mut self, status: NodeStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Sets the output payload.
    #[must_use]
    pub fn with_output(mut self, output: serde_json::Value) -> Self {
        self.output = Some(output);
        self
    }

    /// Sets the finished-at timestamp.
    #[must_use]
    pub const fn with_finished_at(mut self, at: DateTime<Utc>) -> Self {
        self.finished_at = Some(at);
        self
    }

    /// Blanks error, output, and timestamps; used by restart.
    #[must_use]
    pub const fn clearing_state(mut self) -> Self {
        self.clear_error = true;
        self.clear_output = true;
        self.clear_timestamps = true;
        self
    }

    /// Applies this patch to a record in place.
    pub fn apply_to(&self, node: &mut NodeExecution) {
        if let Some(status) = self.status {
            node.status = status;
        }
        if self.clear_timestamps {
            node.started_at = None;
            node.finished_at = None;
        }
        if let Some(at) = self.finished_at {
            node.finished_at = Some(at);
        }
        if self.clear_error {
            node.error = None;
        }
        if let Some(ref error) = self.error {
            node.error = Some(error.clone());
        }
        if self.clear_output {
            node.output = None;
        }
        if let Some(ref output) = self.output {
            node.output = Some(output.clone());
        }
    }
}

/// The persistent store for executions and node executions.
///
/// `update_execution_status` replaces the terminal timestamp and error
/// annotation wholesale: passing `None` clears the stored value.
#[async_trait]
pub trait ExecutionStore: Send + Sync {
    /// Loads an execution with its workflow and node executions.
    async fn get_execution(&self, execution_id: &str) -> Result<Option<Execution>, StoreError>;

    /// Transitions an execution's status, replacing finish time and error.
    async fn update_execution_status(
        &self,
        execution_id: &str,
        status: ExecutionStatus,
        finished_at: Option<DateTime<Utc>>,
        error: Option<String>,
    ) -> Result<(), StoreError>;

    /// Patches all node executions matching the filter; returns the count.
    async fn update_node_executions(
        &self,
        filter: &NodeExecutionFilter,
        patch: &NodeExecutionPatch,
    ) -> Result<u64, StoreError>;

    /// Durably mirrors a recovery point (best effort, caller logs failure).
    async fn create_checkpoint_record(&self, point: &RecoveryPoint) -> Result<(), StoreError>;
}

/// Severity of a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryLevel {
    /// Informational.
    Info,
    /// Something degraded but recovery continues.
    Warn,
    /// Recovery itself failed.
    Error,
}

/// One entry in the execution's audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// The execution the entry belongs to.
    pub execution_id: String,
    /// Severity.
    pub level: HistoryLevel,
    /// Human-readable message.
    pub message: String,
    /// Related node, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    /// Structured payload, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
    /// Who wrote the entry.
    pub actor: String,
}

impl HistoryEntry {
    /// Creates an entry at the given level.
    #[must_use]
    pub fn new(
        execution_id: impl Into<String>,
        level: HistoryLevel,
        message: impl Into<String>,
    ) -> Self {
        Self {
            execution_id: execution_id.into(),
            level,
            message: message.into(),
            node_id: None,
            payload: None,
            actor: "recovery".to_string(),
        }
    }

    /// Creates an info entry.
    #[must_use]
    pub fn info(execution_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(execution_id, HistoryLevel::Info, message)
    }

    /// Creates a warn entry.
    #[must_use]
    pub fn warn(execution_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(execution_id, HistoryLevel::Warn, message)
    }

    /// Creates an error entry.
    #[must_use]
    pub fn error(execution_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(execution_id, HistoryLevel::Error, message)
    }

    /// Sets the related node.
    #[must_use]
    pub fn with_node_id(mut self, node_id: impl Into<String>) -> Self {
        self.node_id = Some(node_id.into());
        self
    }

    /// Sets an optional related node.
    #[must_use]
    pub fn with_node_id_opt(mut self, node_id: Option<String>) -> Self {
        self.node_id = node_id;
        self
    }

    /// Attaches a structured payload.
    #[must_use]
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Sets the actor name.
    #[must_use]
    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = actor.into();
        self
    }
}

/// The execution history/audit sink.
///
/// Fire and forget: implementations must never block or fail the recovery
/// logic. Errors are logged and suppressed.
pub trait HistoryLog: Send + Sync {
    /// Appends an entry.
    fn append(&self, entry: HistoryEntry);
}

/// Default history log that writes entries through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingHistoryLog;

impl HistoryLog for TracingHistoryLog {
    fn append(&self, entry: HistoryEntry) {
        match entry.level {
            HistoryLevel::Info => info!(
                execution_id = %entry.execution_id,
                node_id = ?entry.node_id,
                payload = ?entry.payload,
                actor = %entry.actor,
                "{}", entry.message
            ),
            HistoryLevel::Warn => warn!(
                execution_id = %entry.execution_id,
                node_id = ?entry.node_id,
                payload = ?entry.payload,
                actor = %entry.actor,
                "{}", entry.message
            ),
            HistoryLevel::Error => error!(
                execution_id = %entry.execution_id,
                node_id = ?entry.node_id,
                payload = ?entry.payload,
                actor = %entry.actor,
                "{}", entry.message
            ),
        }
    }
}
