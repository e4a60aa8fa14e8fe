//! Recovery points and the checkpoint fingerprint utility.
//!
//! The in-memory store is authoritative for the current process lifetime;
//! durable mirroring is a best-effort concern handled by the orchestrator.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Computes a short deterministic fingerprint of a state snapshot.
///
/// Equal JSON values produce equal fingerprints; `serde_json` serializes
/// object keys in sorted order, so key ordering in the input does not leak
/// into the digest.
#[must_use]
pub fn fingerprint(state: &serde_json::Value) -> String {
    let json = serde_json::to_string(state).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..8])
}

/// A resumable marker saved by the execution engine.
///
/// Immutable once created; owned collectively by the execution it belongs
/// to and dropped when that execution reaches a terminal state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryPoint {
    /// Unique id of this point.
    pub id: Uuid,
    /// The execution this point belongs to.
    pub execution_id: String,
    /// The node whose state was snapshotted.
    pub node_id: String,
    /// Creation time in Unix milliseconds.
    pub created_at_ms: i64,
    /// Opaque state snapshot.
    pub state: serde_json::Value,
    /// Deterministic digest of `state`, for identity and dedup checks.
    pub fingerprint: String,
}

/// Append-only, per-execution recovery point store.
///
/// Keys are execution ids; points for one execution are kept in creation
/// order, so "most recent" is always the last element. Concurrent access
/// from different executions is safe; concurrent mutation of the same key
/// is the caller's sequencing discipline.
#[derive(Debug, Default)]
pub struct RecoveryPointStore {
    points: DashMap<String, Vec<RecoveryPoint>>,
}

impl RecoveryPointStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a point for an execution and returns it.
    pub fn append(
        &self,
        execution_id: impl Into<String>,
        node_id: impl Into<String>,
        state: serde_json::Value,
    ) -> RecoveryPoint {
        let execution_id = execution_id.into();
        let point = RecoveryPoint {
            id: Uuid::new_v4(),
            execution_id: execution_id.clone(),
            node_id: node_id.into(),
            created_at_ms: chrono::Utc::now().timestamp_millis(),
            fingerprint: fingerprint(&state),
            state,
        };

        self.points
            .entry(execution_id)
            .or_default()
            .push(point.clone());

        point
    }

    /// Returns all points for an execution in creation order.
    #[must_use]
    pub fn list(&self, execution_id: &str) -> Vec<RecoveryPoint> {
        self.points
            .get(execution_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Returns the most recent point for an execution, if any.
    #[must_use]
    pub fn latest(&self, execution_id: &str) -> Option<RecoveryPoint> {
        self.points
            .get(execution_id)
            .and_then(|entry| entry.last().cloned())
    }

    /// Drops all points for an execution.
    pub fn clear(&self, execution_id: &str) {
        self.points.remove(execution_id);
    }

    /// Returns the number of points held for an execution.
    #[must_use]
    pub fn len(&self, execution_id: &str) -> usize {
        self.points
            .get(execution_id)
            .map_or(0, |entry| entry.len())
    }

    /// Returns true if no points are held for an execution.
    #[must_use]
    pub fn is_empty(&self, execution_id: &str) -> bool {
        self.len(execution_id) == 0
    }
}
