//! The recovery orchestrator: the façade the execution engine calls.
//!
//! `analyze_failure` turns a raw error into a [`FailureAnalysis`];
//! `recover_execution` supervises one strategy execution; `auto_recover`
//! chains the two behind a confidence/retryability gate. All three are
//! total: recovery code runs after something has already failed, so nothing
//! here escapes to the caller as an error - failures become logged fallback
//! values and emitted events.

use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::analysis::{FailureAnalysis, FailureContext};
use crate::cancellation::CancellationToken;
use crate::checkpoint::{RecoveryPoint, RecoveryPointStore};
use crate::classify::{
    categorize, classify, confidence_score, is_network_error, is_resource_exhaustion, recommend,
    ClassifiableError,
};
use crate::errors::RecoveryError;
use crate::events::{EventSink, NoOpEventSink, RecoveryEvent};
use crate::planner::plan_strategy;
use crate::policy::{RecoveryConfig, RetryPolicyOverride};
use crate::retry::{backoff_delay, retry_key, RetryAttemptTracker};
use crate::store::{
    ExecutionStatus, ExecutionStore, HistoryEntry, HistoryLog, NodeExecutionFilter,
    NodeExecutionPatch, NodeStatus, TracingHistoryLog,
};
use crate::strategy::RecoveryStrategy;

/// Supervises failure analysis and recovery for workflow executions.
///
/// One orchestrator serves many executions. Recovery operations for a
/// single execution must be invoked sequentially by the caller; operations
/// for different executions may run concurrently, the internal keyed maps
/// are safe under disjoint keys.
pub struct RecoveryOrchestrator {
    store: Arc<dyn ExecutionStore>,
    history: Arc<dyn HistoryLog>,
    sink: Arc<dyn EventSink>,
    points: RecoveryPointStore,
    attempts: RetryAttemptTracker,
    config: RecoveryConfig,
    cancel: Arc<CancellationToken>,
}

impl RecoveryOrchestrator {
    /// Creates an orchestrator over an execution store with default
    /// history log, event sink, and configuration.
    #[must_use]
    pub fn new(store: Arc<dyn ExecutionStore>) -> Self {
        Self {
            store,
            history: Arc::new(TracingHistoryLog),
            sink: Arc::new(NoOpEventSink),
            points: RecoveryPointStore::new(),
            attempts: RetryAttemptTracker::new(),
            config: RecoveryConfig::default(),
            cancel: Arc::new(CancellationToken::new()),
        }
    }

    /// Sets the history log.
    #[must_use]
    pub fn with_history(mut self, history: Arc<dyn HistoryLog>) -> Self {
        self.history = history;
        self
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Sets the configuration.
    #[must_use]
    pub fn with_config(mut self, config: RecoveryConfig) -> Self {
        self.config = config;
        self
    }

    /// Shares a cancellation token that aborts in-flight backoff waits.
    #[must_use]
    pub fn with_cancellation(mut self, token: Arc<CancellationToken>) -> Self {
        self.cancel = token;
        self
    }

    /// Analyzes a failure and proposes a recovery strategy.
    ///
    /// Total: on any internal error (execution missing, store down) this
    /// logs the cause and returns [`FailureAnalysis::fallback`] rather than
    /// crashing the caller.
    pub async fn analyze_failure(
        &self,
        execution_id: &str,
        raw_error: &ClassifiableError,
    ) -> FailureAnalysis {
        match self.try_analyze(execution_id, raw_error).await {
            Ok(analysis) => analysis,
            Err(err) => {
                error!(
                    execution_id = %execution_id,
                    error = %err,
                    "Failure analysis failed, returning fallback"
                );
                self.history.append(
                    HistoryEntry::error(execution_id, "Failure analysis failed")
                        .with_payload(json!({"error": err.to_string()}))
                        .with_actor(self.config.actor.clone()),
                );
                FailureAnalysis::fallback()
            }
        }
    }

    async fn try_analyze(
        &self,
        execution_id: &str,
        raw_error: &ClassifiableError,
    ) -> Result<FailureAnalysis, RecoveryError> {
        let execution = self
            .store
            .get_execution(execution_id)
            .await?
            .ok_or_else(|| RecoveryError::not_found(execution_id))?;

        let failed_node = execution.first_error_node();
        let node_id = failed_node.map(|node| node.node_id.clone());
        let node_name = node_id
            .as_deref()
            .and_then(|id| execution.workflow.node_name(id))
            .map(str::to_string);

        let error_type = classify(raw_error);
        let category = categorize(raw_error, error_type);
        let retryable = self.config.policy.is_retryable(error_type);
        let confidence = confidence_score(raw_error, node_id.as_deref());

        let context = FailureContext {
            node_id,
            node_name,
            error_code: raw_error.code.clone(),
            http_status: raw_error.status,
            is_network_error: is_network_error(raw_error),
            is_resource_exhaustion: is_resource_exhaustion(raw_error),
        };

        let points = self.points.list(execution_id);
        let suggested_strategy =
            plan_strategy(error_type, category, retryable, &context, &points);
        let recommendations = recommend(category, &context);

        info!(
            execution_id = %execution_id,
            error_type = error_type.as_str(),
            category = category.as_str(),
            retryable,
            confidence,
            strategy = suggested_strategy.kind().as_str(),
            "Failure analyzed"
        );
        self.history.append(
            HistoryEntry::info(execution_id, "Failure analyzed")
                .with_node_id_opt(context.node_id.clone())
                .with_payload(json!({
                    "error_type": error_type.as_str(),
                    "category": category.as_str(),
                    "retryable": retryable,
                    "confidence": confidence,
                    "strategy": suggested_strategy.kind().as_str(),
                }))
                .with_actor(self.config.actor.clone()),
        );
        self.sink
            .emit(&RecoveryEvent::FailureAnalyzed {
                execution_id: execution_id.to_string(),
                error_type,
                category,
                confidence,
                retryable,
                strategy: suggested_strategy.kind(),
            })
            .await;

        Ok(FailureAnalysis {
            error_type,
            category,
            retryable,
            confidence,
            suggested_strategy,
            context,
            recommendations,
        })
    }

    /// Executes a recovery strategy; returns whether it succeeded.
    ///
    /// Total: internal errors are caught, logged, emitted as
    /// `recovery_error`, and reported as `false`.
    pub async fn recover_execution(
        &self,
        execution_id: &str,
        strategy: RecoveryStrategy,
    ) -> bool {
        let kind = strategy.kind();
        info!(
            execution_id = %execution_id,
            strategy = kind.as_str(),
            "Attempting recovery"
        );
        self.history.append(
            HistoryEntry::info(execution_id, "Attempting recovery")
                .with_payload(json!({"strategy": kind.as_str()}))
                .with_actor(self.config.actor.clone()),
        );

        match self.execute_strategy(execution_id, strategy).await {
            Ok(true) => {
                info!(execution_id = %execution_id, strategy = kind.as_str(), "Recovery successful");
                self.history.append(
                    HistoryEntry::info(execution_id, "Recovery successful")
                        .with_payload(json!({"strategy": kind.as_str()}))
                        .with_actor(self.config.actor.clone()),
                );
                self.sink
                    .emit(&RecoveryEvent::RecoverySuccessful {
                        execution_id: execution_id.to_string(),
                        strategy: kind,
                    })
                    .await;
                true
            }
            Ok(false) => {
                warn!(execution_id = %execution_id, strategy = kind.as_str(), "Recovery failed");
                self.history.append(
                    HistoryEntry::warn(execution_id, "Recovery failed")
                        .with_payload(json!({"strategy": kind.as_str()}))
                        .with_actor(self.config.actor.clone()),
                );
                self.sink
                    .emit(&RecoveryEvent::RecoveryFailed {
                        execution_id: execution_id.to_string(),
                        strategy: kind,
                    })
                    .await;
                false
            }
            Err(err) => {
                error!(
                    execution_id = %execution_id,
                    strategy = kind.as_str(),
                    error = %err,
                    "Recovery errored"
                );
                self.history.append(
                    HistoryEntry::error(execution_id, "Recovery errored")
                        .with_payload(json!({
                            "strategy": kind.as_str(),
                            "error": err.to_string(),
                        }))
                        .with_actor(self.config.actor.clone()),
                );
                self.sink
                    .emit(&RecoveryEvent::RecoveryError {
                        execution_id: execution_id.to_string(),
                        message: err.to_string(),
                    })
                    .await;
                false
            }
        }
    }

    async fn execute_strategy(
        &self,
        execution_id: &str,
        strategy: RecoveryStrategy,
    ) -> Result<bool, RecoveryError> {
        match strategy {
            RecoveryStrategy::Retry {
                node_id, policy, ..
            } => {
                self.execute_retry(execution_id, node_id.as_deref(), policy.as_ref())
                    .await
            }
            RecoveryStrategy::Skip { node_id } => {
                self.execute_skip(execution_id, &node_id).await
            }
            RecoveryStrategy::Restart { from_checkpoint } => {
                self.execute_restart(execution_id, from_checkpoint.as_deref())
                    .await
            }
            RecoveryStrategy::Manual { node_id, note } => {
                self.execute_manual(execution_id, node_id.as_deref(), note.as_deref())
                    .await
            }
        }
    }

    async fn execute_retry(
        &self,
        execution_id: &str,
        node_id: Option<&str>,
        overrides: Option<&RetryPolicyOverride>,
    ) -> Result<bool, RecoveryError> {
        let policy = match overrides {
            Some(overrides) => self.config.policy.apply(overrides),
            None => self.config.policy.clone(),
        };
        let key = retry_key(execution_id, node_id);
        let count = self.attempts.get(&key);

        if count >= policy.max_retries {
            warn!(
                execution_id = %execution_id,
                key = %key,
                attempts = count,
                max_retries = policy.max_retries,
                "Retry limit reached"
            );
            self.history.append(
                HistoryEntry::warn(execution_id, "Retry limit reached")
                    .with_node_id_opt(node_id.map(str::to_string))
                    .with_payload(json!({
                        "attempts": count,
                        "max_retries": policy.max_retries,
                    }))
                    .with_actor(self.config.actor.clone()),
            );
            return Ok(false);
        }

        let delay = backoff_delay(&policy, count);
        let attempt = self.attempts.increment(&key);
        info!(
            execution_id = %execution_id,
            key = %key,
            attempt,
            delay_ms = delay.as_millis() as u64,
            "Retrying after backoff"
        );
        self.history.append(
            HistoryEntry::info(execution_id, "Retrying after backoff")
                .with_node_id_opt(node_id.map(str::to_string))
                .with_payload(json!({
                    "attempt": attempt,
                    "delay_ms": delay.as_millis() as u64,
                }))
                .with_actor(self.config.actor.clone()),
        );

        // Cooperative suspension: only this call waits. A cancelled token
        // aborts the wait instead of resuming the execution.
        tokio::select! {
            () = tokio::time::sleep(delay) => {}
            () = self.cancel.cancelled() => {
                warn!(
                    execution_id = %execution_id,
                    reason = ?self.cancel.reason(),
                    "Retry backoff cancelled"
                );
                return Ok(false);
            }
        }

        let annotation = format!(
            "Retry attempt {attempt} of {} for {}",
            policy.max_retries,
            node_id.unwrap_or("execution"),
        );
        self.store
            .update_execution_status(execution_id, ExecutionStatus::Running, None, Some(annotation))
            .await?;

        // Resuming node execution from here is the engine's responsibility.
        Ok(true)
    }

    async fn execute_skip(
        &self,
        execution_id: &str,
        node_id: &str,
    ) -> Result<bool, RecoveryError> {
        let now = Utc::now();
        let filter = NodeExecutionFilter::all(execution_id)
            .with_node_id(node_id)
            .with_status(NodeStatus::Error);
        let patch = NodeExecutionPatch::new()
            .with_status(NodeStatus::Skipped)
            .with_output(json!({
                "skipped": true,
                "reason": "Node skipped during recovery",
                "skipped_at": now.to_rfc3339(),
            }))
            .with_finished_at(now);

        let skipped = self.store.update_node_executions(&filter, &patch).await?;
        info!(
            execution_id = %execution_id,
            node_id = %node_id,
            skipped,
            "Skipped failed node executions"
        );
        Ok(true)
    }

    async fn execute_restart(
        &self,
        execution_id: &str,
        from_checkpoint: Option<&str>,
    ) -> Result<bool, RecoveryError> {
        self.store
            .update_execution_status(execution_id, ExecutionStatus::Running, None, None)
            .await?;

        let filter = NodeExecutionFilter::all(execution_id).with_status(NodeStatus::Error);
        let patch = NodeExecutionPatch::new()
            .with_status(NodeStatus::Waiting)
            .clearing_state();
        let reset = self.store.update_node_executions(&filter, &patch).await?;

        if let Some(checkpoint) = from_checkpoint {
            // State restoration from the checkpoint is the engine's job;
            // this only records where the restart resumes from.
            info!(
                execution_id = %execution_id,
                checkpoint = %checkpoint,
                "Restarting from checkpoint"
            );
            self.history.append(
                HistoryEntry::info(execution_id, "Restarting from checkpoint")
                    .with_node_id(checkpoint)
                    .with_actor(self.config.actor.clone()),
            );
        }

        debug!(execution_id = %execution_id, reset, "Reset failed node executions");
        Ok(true)
    }

    async fn execute_manual(
        &self,
        execution_id: &str,
        node_id: Option<&str>,
        note: Option<&str>,
    ) -> Result<bool, RecoveryError> {
        self.history.append(
            HistoryEntry::warn(execution_id, "Manual intervention requested")
                .with_node_id_opt(node_id.map(str::to_string))
                .with_payload(json!({"note": note}))
                .with_actor(self.config.actor.clone()),
        );
        self.store
            .update_execution_status(
                execution_id,
                ExecutionStatus::Paused,
                None,
                Some("manual_intervention_required".to_string()),
            )
            .await?;
        Ok(true)
    }

    /// Analyzes a failure and recovers automatically when the gate passes.
    ///
    /// Both conditions are required: confidence at or above the configured
    /// threshold AND a retryable classification. Confidence alone never
    /// authorizes automatic action.
    pub async fn auto_recover(&self, execution_id: &str, raw_error: &ClassifiableError) -> bool {
        let analysis = self.analyze_failure(execution_id, raw_error).await;

        if analysis.confidence < self.config.auto_recover_confidence_threshold
            || !analysis.retryable
        {
            info!(
                execution_id = %execution_id,
                confidence = analysis.confidence,
                retryable = analysis.retryable,
                threshold = self.config.auto_recover_confidence_threshold,
                "Skipping automatic recovery"
            );
            self.history.append(
                HistoryEntry::info(execution_id, "Skipping automatic recovery")
                    .with_payload(json!({
                        "confidence": analysis.confidence,
                        "retryable": analysis.retryable,
                    }))
                    .with_actor(self.config.actor.clone()),
            );
            return false;
        }

        self.recover_execution(execution_id, analysis.suggested_strategy)
            .await
    }

    /// Records a resumable marker for an execution.
    ///
    /// The in-memory store is authoritative; the durable mirror is best
    /// effort and its failure is logged as a warning, never propagated.
    pub async fn create_recovery_point(
        &self,
        execution_id: &str,
        node_id: &str,
        state: serde_json::Value,
    ) -> RecoveryPoint {
        let point = self.points.append(execution_id, node_id, state);

        if let Err(err) = self.store.create_checkpoint_record(&point).await {
            warn!(
                execution_id = %execution_id,
                node_id = %node_id,
                error = %err,
                "Failed to mirror recovery point durably"
            );
            self.history.append(
                HistoryEntry::warn(execution_id, "Recovery point not mirrored durably")
                    .with_node_id(node_id)
                    .with_payload(json!({"error": err.to_string()}))
                    .with_actor(self.config.actor.clone()),
            );
        }

        self.sink
            .emit(&RecoveryEvent::RecoveryPointCreated {
                execution_id: execution_id.to_string(),
                node_id: node_id.to_string(),
                fingerprint: point.fingerprint.clone(),
            })
            .await;

        point
    }

    /// Drops all recovery bookkeeping for an execution.
    ///
    /// The engine must call this once an execution reaches a terminal
    /// state to bound memory growth.
    pub async fn cleanup_recovery_data(&self, execution_id: &str) {
        self.points.clear(execution_id);
        self.attempts.reset_execution(execution_id);
        debug!(execution_id = %execution_id, "Recovery data cleaned up");
        self.sink
            .emit(&RecoveryEvent::RecoveryDataCleanup {
                execution_id: execution_id.to_string(),
            })
            .await;
    }

    /// Returns the recovery points held for an execution.
    #[must_use]
    pub fn recovery_points(&self, execution_id: &str) -> Vec<RecoveryPoint> {
        self.points.list(execution_id)
    }

    /// Returns the recorded attempt count for a retry key.
    #[must_use]
    pub fn retry_attempts(&self, key: &str) -> u32 {
        self.attempts.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{ErrorKind, FailureCategory};
    use crate::events::CollectingEventSink;
    use crate::testing::{
        connection_refused, execution_with_error_node, unauthorized, InMemoryExecutionStore,
        RecordingHistoryLog,
    };

    struct Harness {
        store: Arc<InMemoryExecutionStore>,
        history: Arc<RecordingHistoryLog>,
        sink: Arc<CollectingEventSink>,
        orchestrator: RecoveryOrchestrator,
    }

    fn harness() -> Harness {
        let store = Arc::new(InMemoryExecutionStore::new());
        let history = Arc::new(RecordingHistoryLog::new());
        let sink = Arc::new(CollectingEventSink::new());
        let orchestrator = RecoveryOrchestrator::new(Arc::clone(&store) as Arc<dyn ExecutionStore>)
            .with_history(Arc::clone(&history) as Arc<dyn HistoryLog>)
            .with_event_sink(Arc::clone(&sink) as Arc<dyn EventSink>);
        Harness {
            store,
            history,
            sink,
            orchestrator,
        }
    }

    #[tokio::test]
    async fn test_analyze_missing_execution_returns_fallback() {
        let h = harness();
        let analysis = h
            .orchestrator
            .analyze_failure("missing", &connection_refused())
            .await;

        assert_eq!(analysis.error_type, ErrorKind::UnknownError);
        assert!((analysis.confidence - 0.1).abs() < f64::EPSILON);
        assert!(h
            .history
            .messages()
            .contains(&"Failure analysis failed".to_string()));
        // No failure_analyzed event for a fallback analysis.
        assert!(h.sink.is_empty());
    }

    #[tokio::test]
    async fn test_analyze_connection_refused() {
        let h = harness();
        h.store.put_execution(execution_with_error_node("e1", "n1"));

        let analysis = h
            .orchestrator
            .analyze_failure("e1", &connection_refused())
            .await;

        assert_eq!(analysis.error_type, ErrorKind::NetworkError);
        assert_eq!(analysis.category, FailureCategory::Transient);
        assert!(analysis.retryable);
        assert!(analysis.confidence >= 0.8);
        assert_eq!(analysis.context.node_id.as_deref(), Some("n1"));
        assert_eq!(analysis.context.node_name.as_deref(), Some("Node n1"));
        assert!(analysis.context.is_network_error);

        match analysis.suggested_strategy {
            RecoveryStrategy::Retry {
                ref node_id,
                policy: Some(ref policy),
                ..
            } => {
                assert_eq!(node_id.as_deref(), Some("n1"));
                assert_eq!(policy.max_retries, Some(3));
                assert_eq!(policy.retry_delay_ms, Some(1000));
            }
            ref other => panic!("expected retry, got {other:?}"),
        }

        assert_eq!(h.sink.names(), ["failure_analyzed"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_updates_status_and_annotates() {
        let h = harness();
        h.store.put_execution(execution_with_error_node("e1", "n1"));

        let recovered = h
            .orchestrator
            .recover_execution("e1", RecoveryStrategy::retry("n1"))
            .await;

        assert!(recovered);
        let execution = h.store.execution("e1").unwrap();
        assert_eq!(execution.status, ExecutionStatus::Running);
        assert!(execution.error.unwrap().contains("Retry attempt 1"));
        assert_eq!(h.orchestrator.retry_attempts("e1:n1"), 1);
        assert_eq!(h.sink.names(), ["recovery_successful"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_cutoff_stops_counting() {
        let h = harness();
        h.store.put_execution(execution_with_error_node("e1", "n1"));

        for _ in 0..3 {
            assert!(
                h.orchestrator
                    .recover_execution("e1", RecoveryStrategy::retry("n1"))
                    .await
            );
        }

        let refused = h
            .orchestrator
            .recover_execution("e1", RecoveryStrategy::retry("n1"))
            .await;

        assert!(!refused);
        // Counter is untouched by the refused attempt.
        assert_eq!(h.orchestrator.retry_attempts("e1:n1"), 3);
        assert_eq!(h.sink.names().last(), Some(&"recovery_failed"));
        assert!(h
            .history
            .messages()
            .contains(&"Retry limit reached".to_string()));
    }

    #[tokio::test]
    async fn test_skip_marks_error_nodes_skipped() {
        let h = harness();
        h.store.put_execution(execution_with_error_node("e1", "n1"));

        let recovered = h
            .orchestrator
            .recover_execution("e1", RecoveryStrategy::skip("n1"))
            .await;

        assert!(recovered);
        let node = &h.store.execution("e1").unwrap().node_executions[0];
        assert_eq!(node.status, NodeStatus::Skipped);
        let output = node.output.as_ref().unwrap();
        assert_eq!(output["skipped"], true);
        assert!(output["skipped_at"].is_string());
    }

    #[tokio::test]
    async fn test_restart_resets_execution_and_nodes() {
        let h = harness();
        h.store.put_execution(execution_with_error_node("e1", "n1"));

        let recovered = h
            .orchestrator
            .recover_execution(
                "e1",
                RecoveryStrategy::Restart {
                    from_checkpoint: Some("n1".to_string()),
                },
            )
            .await;

        assert!(recovered);
        let execution = h.store.execution("e1").unwrap();
        assert_eq!(execution.status, ExecutionStatus::Running);
        assert!(execution.finished_at.is_none());
        assert!(execution.error.is_none());

        let node = &execution.node_executions[0];
        assert_eq!(node.status, NodeStatus::Waiting);
        assert!(node.started_at.is_none());
        assert!(node.error.is_none());
        assert!(node.output.is_none());

        assert!(h
            .history
            .messages()
            .contains(&"Restarting from checkpoint".to_string()));
    }

    #[tokio::test]
    async fn test_manual_pauses_execution() {
        let h = harness();
        h.store.put_execution(execution_with_error_node("e1", "n1"));

        let recovered = h
            .orchestrator
            .recover_execution(
                "e1",
                RecoveryStrategy::Manual {
                    node_id: Some("n1".to_string()),
                    note: Some("credentials expired".to_string()),
                },
            )
            .await;

        assert!(recovered);
        let execution = h.store.execution("e1").unwrap();
        assert_eq!(execution.status, ExecutionStatus::Paused);
        assert_eq!(
            execution.error.as_deref(),
            Some("manual_intervention_required")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_recover_never_throws_on_store_failure() {
        let h = harness();
        // No execution inserted: the status update will fail inside retry.
        let recovered = h
            .orchestrator
            .recover_execution("ghost", RecoveryStrategy::retry("n1"))
            .await;

        assert!(!recovered);
        assert_eq!(h.sink.names().last(), Some(&"recovery_error"));
    }

    #[tokio::test]
    async fn test_auto_recover_skips_low_confidence() {
        let h = harness();
        let mut execution = execution_with_error_node("e1", "n1");
        execution.node_executions.clear();
        h.store.put_execution(execution);

        // ECONNRESET is not in the confidence hard-failure set and there is
        // no failing node, so confidence stays at 0.5.
        let error = ClassifiableError::new().with_code("ECONNRESET");
        let recovered = h.orchestrator.auto_recover("e1", &error).await;

        assert!(!recovered);
        // Analysis happened, but no recovery attempt followed.
        assert_eq!(h.sink.names(), ["failure_analyzed"]);
        let execution = h.store.execution("e1").unwrap();
        assert_eq!(execution.status, ExecutionStatus::Error);
    }

    #[tokio::test]
    async fn test_auto_recover_skips_low_confidence_even_when_retryable() {
        let h = harness();
        h.store.put_execution(execution_with_error_node("e1", "n1"));

        // A bare timeout message: retryable, but no hard-failure code and
        // no known status, so confidence is 0.5 + 0.1 = 0.6.
        let error = ClassifiableError::from_message("upstream gateway timeout");
        let analysis = h.orchestrator.analyze_failure("e1", &error).await;
        assert_eq!(analysis.error_type, ErrorKind::Timeout);
        assert!(analysis.retryable);
        assert!(analysis.confidence < 0.7);

        let recovered = h.orchestrator.auto_recover("e1", &error).await;

        assert!(!recovered);
        // Two analyses ran; neither was followed by a recovery attempt.
        assert_eq!(h.sink.names(), ["failure_analyzed", "failure_analyzed"]);
        assert_eq!(h.orchestrator.retry_attempts("e1:n1"), 0);
    }

    #[tokio::test]
    async fn test_auto_recover_skips_non_retryable_even_with_high_confidence() {
        let h = harness();
        h.store.put_execution(execution_with_error_node("e1", "n1"));

        // 401 + known node: confidence 0.8, but authentication errors are
        // in the stop set.
        let recovered = h.orchestrator.auto_recover("e1", &unauthorized()).await;

        assert!(!recovered);
        assert_eq!(h.sink.names(), ["failure_analyzed"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_recover_runs_suggested_retry() {
        let h = harness();
        h.store.put_execution(execution_with_error_node("e1", "n1"));

        let recovered = h
            .orchestrator
            .auto_recover("e1", &connection_refused())
            .await;

        assert!(recovered);
        assert_eq!(h.sink.names(), ["failure_analyzed", "recovery_successful"]);
        assert_eq!(h.orchestrator.retry_attempts("e1:n1"), 1);
    }

    #[tokio::test]
    async fn test_recovery_point_mirror_failure_is_non_fatal() {
        let h = harness();
        h.store.put_execution(execution_with_error_node("e1", "n1"));
        h.store.set_fail_checkpoints(true);

        let point = h
            .orchestrator
            .create_recovery_point("e1", "n1", json!({"cursor": 7}))
            .await;

        // In-memory append is authoritative despite the mirror failure.
        assert_eq!(h.orchestrator.recovery_points("e1"), vec![point]);
        assert!(h.store.checkpoint_records().is_empty());
        assert_eq!(h.sink.names(), ["recovery_point_created"]);
        assert!(h
            .history
            .messages()
            .contains(&"Recovery point not mirrored durably".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_clears_points_and_counters() {
        let h = harness();
        h.store.put_execution(execution_with_error_node("e1", "n1"));

        h.orchestrator
            .create_recovery_point("e1", "n1", json!({}))
            .await;
        h.orchestrator
            .recover_execution("e1", RecoveryStrategy::retry("n1"))
            .await;
        assert_eq!(h.orchestrator.retry_attempts("e1:n1"), 1);

        h.orchestrator.cleanup_recovery_data("e1").await;

        assert!(h.orchestrator.recovery_points("e1").is_empty());
        assert_eq!(h.orchestrator.retry_attempts("e1:n1"), 0);
        assert_eq!(h.sink.names().last(), Some(&"recovery_data_cleanup"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_aborts_backoff_wait() {
        let store = Arc::new(InMemoryExecutionStore::new());
        store.put_execution(execution_with_error_node("e1", "n1"));
        let token = Arc::new(CancellationToken::new());
        let orchestrator =
            RecoveryOrchestrator::new(Arc::clone(&store) as Arc<dyn ExecutionStore>)
                .with_cancellation(Arc::clone(&token));

        token.cancel("user cancelled the execution");
        let recovered = orchestrator
            .recover_execution("e1", RecoveryStrategy::retry("n1"))
            .await;

        assert!(!recovered);
        // The execution was never transitioned back to RUNNING.
        assert_eq!(store.execution("e1").unwrap().status, ExecutionStatus::Error);
    }
}
