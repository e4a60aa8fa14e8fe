//! # flow-recovery
//!
//! Failure classification and execution recovery for workflow engines.
//!
//! When a workflow execution fails, this crate answers three questions:
//! what went wrong ([`classify`]), how sure are we ([`classify::confidence_score`]),
//! and what should happen next ([`planner::plan_strategy`]). The
//! [`RecoveryOrchestrator`] ties the answers together and executes the
//! chosen strategy against a pluggable [`ExecutionStore`].
//!
//! ## Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//! use flow_recovery::prelude::*;
//!
//! # async fn demo(store: Arc<dyn ExecutionStore>) {
//! let orchestrator = RecoveryOrchestrator::new(store)
//!     .with_event_sink(Arc::new(LoggingEventSink::info()));
//!
//! let error = ClassifiableError::new()
//!     .with_code("ECONNREFUSED")
//!     .with_message("connect ECONNREFUSED 10.0.0.1:443");
//!
//! let analysis = orchestrator.analyze_failure("exec-1", &error).await;
//! if analysis.retryable {
//!     orchestrator
//!         .recover_execution("exec-1", analysis.suggested_strategy)
//!         .await;
//! }
//! # }
//! ```
//!
//! ## Design notes
//!
//! - The orchestrator's public methods are total: they log and degrade
//!   instead of returning errors, because they run after something has
//!   already failed.
//! - Classification is an ordered rule list; specific signals (explicit
//!   timeout codes) outrank generic ones (a 5xx status).
//! - `auto_recover` acts only when confidence meets the threshold AND the
//!   error is retryable.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod cancellation;
pub mod checkpoint;
pub mod classify;
pub mod errors;
pub mod events;
pub mod orchestrator;
pub mod planner;
pub mod policy;
pub mod retry;
pub mod store;
pub mod strategy;
pub mod testing;


pub use analysis::{FailureAnalysis, FailureContext};
pub use cancellation::CancellationToken;
pub use checkpoint::{fingerprint, RecoveryPoint, RecoveryPointStore};
pub use classify::{
    categorize, classify, confidence_score, is_network_error, is_resource_exhaustion, recommend,
    ClassifiableError, ErrorKind, FailureCategory,
};
pub use errors::{RecoveryError, StoreError};
pub use events::{
    CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink, RecoveryEvent,
};
pub use orchestrator::RecoveryOrchestrator;
pub use planner::plan_strategy;
pub use policy::{RecoveryConfig, RetryPolicy, RetryPolicyOverride};
pub use retry::{backoff_delay, retry_key, RetryAttemptTracker};
pub use store::{
    Execution, ExecutionStatus, ExecutionStore, HistoryEntry, HistoryLevel, HistoryLog,
    NodeExecution, NodeExecutionFilter, NodeExecutionPatch, NodeStatus, TracingHistoryLog,
    Workflow, WorkflowNode,
};
pub use strategy::{RecoveryStrategy, StrategyKind};

/// Commonly used types, importable in one line.
pub mod prelude {
    pub use crate::analysis::{FailureAnalysis, FailureContext};
    pub use crate::cancellation::CancellationToken;
    pub use crate::checkpoint::{RecoveryPoint, RecoveryPointStore};
    pub use crate::classify::{ClassifiableError, ErrorKind, FailureCategory};
    pub use crate::errors::{RecoveryError, StoreError};
    pub use crate::events::{EventSink, LoggingEventSink, NoOpEventSink, RecoveryEvent};
    pub use crate::orchestrator::RecoveryOrchestrator;
    pub use crate::policy::{RecoveryConfig, RetryPolicy, RetryPolicyOverride};
    pub use crate::store::{
        Execution, ExecutionStatus, ExecutionStore, HistoryLog, NodeStatus,
    };
    pub use crate::strategy::{RecoveryStrategy, StrategyKind};
}
