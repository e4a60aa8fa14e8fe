//! Test doubles and fixtures.
//!
//! An in-memory execution store, a recording history log, and canned
//! executions/errors used across the crate's tests. Exposed publicly so
//! downstream engines can test their recovery wiring without a database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::checkpoint::RecoveryPoint;
use crate::classify::ClassifiableError;
use crate::errors::StoreError;
use crate::store::{
    Execution, ExecutionStatus, ExecutionStore, HistoryEntry, HistoryLog, NodeExecution,
    NodeExecutionFilter, NodeExecutionPatch, NodeStatus, Workflow, WorkflowNode,
};

/// An in-memory [`ExecutionStore`] backed by a locked map.
///
/// Checkpoint mirroring can be made to fail on demand, to exercise the
/// best-effort durable-mirror contract.
#[derive(Debug, Default)]
pub struct InMemoryExecutionStore {
    executions: Mutex<HashMap<String, Execution>>,
    checkpoints: Mutex<Vec<RecoveryPoint>>,
    fail_checkpoints: AtomicBool,
}

impl InMemoryExecutionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces an execution.
    pub fn put_execution(&self, execution: Execution) {
        self.executions
            .lock()
            .insert(execution.id.clone(), execution);
    }

    /// Returns a snapshot of an execution, if present.
    #[must_use]
    pub fn execution(&self, execution_id: &str) -> Option<Execution> {
        self.executions.lock().get(execution_id).cloned()
    }

    /// Returns all durably mirrored checkpoints.
    #[must_use]
    pub fn checkpoint_records(&self) -> Vec<RecoveryPoint> {
        self.checkpoints.lock().clone()
    }

    /// Makes subsequent checkpoint mirroring fail (or succeed again).
    pub fn set_fail_checkpoints(&self, fail: bool) {
        self.fail_checkpoints.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ExecutionStore for InMemoryExecutionStore {
    async fn get_execution(&self, execution_id: &str) -> Result<Option<Execution>, StoreError> {
        Ok(self.executions.lock().get(execution_id).cloned())
    }

    async fn update_execution_status(
        &self,
        execution_id: &str,
        status: ExecutionStatus,
        finished_at: Option<DateTime<Utc>>,
        error: Option<String>,
    ) -> Result<(), StoreError> {
        let mut executions = self.executions.lock();
        let execution = executions
            .get_mut(execution_id)
            .ok_or_else(|| StoreError::unavailable(format!("no execution {execution_id}")))?;

        execution.status = status;
        execution.finished_at = finished_at;
        execution.error = error;
        Ok(())
    }

    async fn update_node_executions(
        &self,
        filter: &NodeExecutionFilter,
        patch: &NodeExecutionPatch,
    ) -> Result<u64, StoreError> {
        let mut executions = self.executions.lock();
        let execution = executions
            .get_mut(&filter.execution_id)
            .ok_or_else(|| StoreError::unavailable(format!("no execution {}", filter.execution_id)))?;

        let mut matched = 0;
        for node in &mut execution.node_executions {
            if filter.matches(node) {
                patch.apply_to(node);
                matched += 1;
            }
        }
        Ok(matched)
    }

    async fn create_checkpoint_record(&self, point: &RecoveryPoint) -> Result<(), StoreError> {
        if self.fail_checkpoints.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable("checkpoint table offline"));
        }
        self.checkpoints.lock().push(point.clone());
        Ok(())
    }
}

/// A [`HistoryLog`] that records entries for assertions.
#[derive(Debug, Default)]
pub struct RecordingHistoryLog {
    entries: Mutex<Vec<HistoryEntry>>,
}

impl RecordingHistoryLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all recorded entries.
    #[must_use]
    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.entries.lock().clone()
    }

    /// Returns the recorded messages in order.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .map(|entry| entry.message.clone())
            .collect()
    }
}

impl HistoryLog for RecordingHistoryLog {
    fn append(&self, entry: HistoryEntry) {
        self.entries.lock().push(entry);
    }
}

/// Builds an execution whose node `node_id` is in ERROR status.
#[must_use]
pub fn execution_with_error_node(execution_id: &str, node_id: &str) -> Execution {
    Execution {
        id: execution_id.to_string(),
        status: ExecutionStatus::Error,
        workflow: Workflow {
            id: "wf-1".to_string(),
            nodes: vec![
                WorkflowNode {
                    id: node_id.to_string(),
                    name: format!("Node {node_id}"),
                },
                WorkflowNode {
                    id: "other".to_string(),
                    name: "Other node".to_string(),
                },
            ],
        },
        node_executions: vec![NodeExecution {
            id: format!("ne-{node_id}"),
            node_id: node_id.to_string(),
            status: NodeStatus::Error,
            started_at: Some(Utc::now()),
            finished_at: Some(Utc::now()),
            error: Some("upstream failure".to_string()),
            output: None,
        }],
        finished_at: Some(Utc::now()),
        error: Some("node failed".to_string()),
    }
}

/// Builds an execution with no failing node.
#[must_use]
pub fn execution_without_error_node(execution_id: &str) -> Execution {
    let mut execution = execution_with_error_node(execution_id, "n1");
    execution.node_executions.clear();
    execution
}

/// A connection-refused error, the canonical retryable failure.
#[must_use]
pub fn connection_refused() -> ClassifiableError {
    ClassifiableError::new()
        .with_code("ECONNREFUSED")
        .with_message("connect ECONNREFUSED 10.0.0.1:443")
}

/// An unauthorized error, the canonical configuration failure.
#[must_use]
pub fn unauthorized() -> ClassifiableError {
    ClassifiableError::new()
        .with_status(401)
        .with_message("Request failed with status 401")
}
