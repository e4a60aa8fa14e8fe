//! Error types for the flow-recovery engine.
//!
//! The public orchestrator methods are total: they return values or
//! `false`/fallback sentinels and never propagate these errors to callers.
//! The taxonomy below is what flows through the internal `Result` pipeline
//! and into logs and emitted events.

use thiserror::Error;

/// Errors raised by the external execution store.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The store could not be reached or refused the operation.
    #[error("Execution store unavailable: {reason}")]
    Unavailable {
        /// Why the store was unavailable.
        reason: String,
    },

    /// A record could not be serialized for persistence.
    #[error("Serialization failed: {reason}")]
    Serialization {
        /// Why serialization failed.
        reason: String,
    },
}

impl StoreError {
    /// Creates an unavailable error.
    #[must_use]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// Creates a serialization error.
    #[must_use]
    pub fn serialization(reason: impl Into<String>) -> Self {
        Self::Serialization {
            reason: reason.into(),
        }
    }
}

/// The main error type for recovery operations.
#[derive(Debug, Error)]
pub enum RecoveryError {
    /// The execution was not found in the store.
    #[error("Execution not found: {execution_id}")]
    ExecutionNotFound {
        /// The missing execution id.
        execution_id: String,
    },

    /// A recovery strategy could not be understood.
    #[error("Invalid recovery strategy: {reason}")]
    InvalidStrategy {
        /// Why the strategy was rejected.
        reason: String,
    },

    /// The execution store failed.
    #[error("{0}")]
    Storage(#[from] StoreError),

    /// A generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RecoveryError {
    /// Creates a not-found error for an execution id.
    #[must_use]
    pub fn not_found(execution_id: impl Into<String>) -> Self {
        Self::ExecutionNotFound {
            execution_id: execution_id.into(),
        }
    }

    /// Creates an invalid strategy error.
    #[must_use]
    pub fn invalid_strategy(reason: impl Into<String>) -> Self {
        Self::InvalidStrategy {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = RecoveryError::not_found("exec-1");
        assert_eq!(err.to_string(), "Execution not found: exec-1");
    }

    #[test]
    fn test_store_error_converts() {
        let err: RecoveryError = StoreError::unavailable("connection refused").into();
        assert!(matches!(err, RecoveryError::Storage(_)));
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_invalid_strategy_display() {
        let err = RecoveryError::invalid_strategy("unknown type tag 'rollback'");
        assert!(err.to_string().contains("rollback"));
    }
}
