//! Normalized error shape and symbolic error kinds.
//!
//! Raw runtime failures arrive from many places (transport layers, node
//! handlers, upstream services) with ad-hoc shapes. Callers adapt them into
//! a [`ClassifiableError`] before classification so the rule engine only
//! ever sees the three optional signals it cares about: a short error code,
//! an HTTP status, and a free-form message.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A raw error normalized for classification.
///
/// All fields are optional; an empty error classifies as
/// [`ErrorKind::UnknownError`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiableError {
    /// Short machine-readable code (e.g. `ECONNREFUSED`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// HTTP status code, if the failure came from an HTTP call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Human-readable error message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ClassifiableError {
    /// Creates an empty error.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an error from a message only.
    #[must_use]
    pub fn from_message(message: impl Into<String>) -> Self {
        Self {
            code: None,
            status: None,
            message: Some(message.into()),
        }
    }

    /// Sets the error code.
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Sets the HTTP status.
    #[must_use]
    pub const fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Sets the message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Returns the error code, or an empty string if absent.
    #[must_use]
    pub fn code_str(&self) -> &str {
        self.code.as_deref().unwrap_or("")
    }

    /// Returns the lowercased message, or an empty string if absent.
    #[must_use]
    pub fn message_lower(&self) -> String {
        self.message
            .as_deref()
            .unwrap_or("")
            .to_ascii_lowercase()
    }
}

impl fmt::Display for ClassifiableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.code, self.status, &self.message) {
            (Some(code), _, Some(msg)) => write!(f, "{code}: {msg}"),
            (Some(code), _, None) => write!(f, "{code}"),
            (None, Some(status), Some(msg)) => write!(f, "HTTP {status}: {msg}"),
            (None, Some(status), None) => write!(f, "HTTP {status}"),
            (None, None, Some(msg)) => write!(f, "{msg}"),
            (None, None, None) => write!(f, "unknown error"),
        }
    }
}

/// Symbolic error type produced by classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// DNS or connection-level network failure.
    NetworkError,
    /// The operation timed out.
    Timeout,
    /// Credentials were missing or rejected.
    AuthenticationError,
    /// The caller lacked permission.
    AuthorizationError,
    /// The upstream service applied rate limiting.
    RateLimit,
    /// The upstream service reported a server-side failure.
    ServiceUnavailable,
    /// The request itself was rejected (4xx other than auth/rate).
    ClientError,
    /// Input failed validation.
    ValidationError,
    /// The node or credential configuration is wrong.
    ConfigurationError,
    /// Nothing matched; the safe fallback.
    UnknownError,
}

impl ErrorKind {
    /// Returns the snake_case name used in logs and payloads.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NetworkError => "network_error",
            Self::Timeout => "timeout",
            Self::AuthenticationError => "authentication_error",
            Self::AuthorizationError => "authorization_error",
            Self::RateLimit => "rate_limit",
            Self::ServiceUnavailable => "service_unavailable",
            Self::ClientError => "client_error",
            Self::ValidationError => "validation_error",
            Self::ConfigurationError => "configuration_error",
            Self::UnknownError => "unknown_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Broad failure category derived from an [`ErrorKind`] and error context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    /// Likely to succeed on retry without intervention.
    Transient,
    /// Will not succeed without a change.
    Permanent,
    /// Requires a configuration or credential fix.
    Configuration,
    /// Timed out; a restart from a checkpoint may help.
    Timeout,
    /// Resource exhaustion (memory, disk, quota).
    Resource,
}

impl FailureCategory {
    /// Returns the snake_case name used in logs and payloads.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Transient => "transient",
            Self::Permanent => "permanent",
            Self::Configuration => "configuration",
            Self::Timeout => "timeout",
            Self::Resource => "resource",
        }
    }
}

impl fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
