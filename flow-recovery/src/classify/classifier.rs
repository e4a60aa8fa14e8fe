//! Ordered classification rules.
//!
//! Rule order is a public contract, not an implementation detail: rules can
//! overlap (a 500 with a "timeout" message must classify as `timeout`, which
//! is checked before the generic 5xx rule), so first match wins.

use super::{ClassifiableError, ErrorKind, FailureCategory};

/// Error codes that indicate a network-level failure.
const NETWORK_CODES: [&str; 4] = ["ENOTFOUND", "ECONNREFUSED", "ETIMEDOUT", "ECONNRESET"];

/// Maps a normalized error to its symbolic kind.
///
/// Pure and total: never panics, and any shape that matches no rule
/// resolves to [`ErrorKind::UnknownError`].
#[must_use]
pub fn classify(error: &ClassifiableError) -> ErrorKind {
    let code = error.code_str();
    let message = error.message_lower();

    if matches!(code, "ENOTFOUND" | "ECONNREFUSED") {
        return ErrorKind::NetworkError;
    }
    if code == "ETIMEDOUT" || message.contains("timeout") {
        return ErrorKind::Timeout;
    }
    if error.status == Some(401) || message.contains("authentication") {
        return ErrorKind::AuthenticationError;
    }
    if error.status == Some(403) || message.contains("authorization") {
        return ErrorKind::AuthorizationError;
    }
    if error.status == Some(429) {
        return ErrorKind::RateLimit;
    }
    if let Some(status) = error.status {
        if status >= 500 {
            return ErrorKind::ServiceUnavailable;
        }
        if status >= 400 {
            return ErrorKind::ClientError;
        }
    }
    if message.contains("validation") {
        return ErrorKind::ValidationError;
    }
    if message.contains("configuration") {
        return ErrorKind::ConfigurationError;
    }

    ErrorKind::UnknownError
}

/// Maps an error and its kind to a broad failure category.
///
/// `Timeout` keeps its own category and is never folded into the wider
/// transient bucket; the resource-exhaustion heuristic is only consulted
/// once the kind-based buckets have not matched.
#[must_use]
pub fn categorize(error: &ClassifiableError, kind: ErrorKind) -> FailureCategory {
    match kind {
        ErrorKind::Timeout => FailureCategory::Timeout,
        ErrorKind::NetworkError | ErrorKind::RateLimit | ErrorKind::ServiceUnavailable => {
            FailureCategory::Transient
        }
        ErrorKind::AuthenticationError
        | ErrorKind::AuthorizationError
        | ErrorKind::ConfigurationError => FailureCategory::Configuration,
        ErrorKind::ClientError | ErrorKind::ValidationError | ErrorKind::UnknownError => {
            if is_resource_exhaustion(error) {
                FailureCategory::Resource
            } else {
                FailureCategory::Permanent
            }
        }
    }
}

/// Returns true for connection-level failure codes.
///
/// Note: this set includes `ECONNRESET`, which the confidence scorer's
/// hard-failure set deliberately does not.
#[must_use]
pub fn is_network_error(error: &ClassifiableError) -> bool {
    NETWORK_CODES.contains(&error.code_str())
}

/// Returns true when the message suggests resource exhaustion.
#[must_use]
pub fn is_resource_exhaustion(error: &ClassifiableError) -> bool {
    let message = error.message_lower();
    message.contains("memory") || message.contains("disk space") || message.contains("quota exceeded")
}
