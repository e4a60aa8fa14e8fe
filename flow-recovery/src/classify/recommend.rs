//! Remediation hints keyed off category and context.
//!
//! The output order is part of the contract: category advice first, then
//! network-specific tips, then server-error tips. Display surfaces show the
//! list as-is.

use super::FailureCategory;
use crate::analysis::FailureContext;

/// Builds the ordered remediation list for a failure.
///
/// Returns the single fallback hint when no block fired.
#[must_use]
pub fn recommend(category: FailureCategory, context: &FailureContext) -> Vec<String> {
    let mut hints: Vec<String> = Vec::new();

    match category {
        FailureCategory::Transient => {
            hints.push("Wait for the upstream service to recover before retrying".to_string());
            hints.push("Enable automatic retry with exponential backoff".to_string());
            hints.push("Check the status page of the upstream service".to_string());
        }
        FailureCategory::Configuration => {
            hints.push("Verify credentials are valid and not expired".to_string());
            hints.push("Review the node's configuration parameters".to_string());
            hints.push("Re-authenticate and update stored credentials".to_string());
        }
        FailureCategory::Timeout => {
            hints.push("Increase the node timeout setting".to_string());
            hints.push("Check upstream service latency".to_string());
            hints.push("Consider splitting the work into smaller batches".to_string());
        }
        FailureCategory::Permanent | FailureCategory::Resource => {}
    }

    if context.is_network_error {
        hints.push("Check network connectivity from the worker host".to_string());
        hints.push("Verify DNS resolution and firewall rules".to_string());
    }

    if context.http_status.is_some_and(|s| s >= 500) {
        hints.push("The remote service reported an internal error".to_string());
        hints.push("Retry later or contact the service provider".to_string());
    }

    if hints.is_empty() {
        hints.push("Review error details and logs".to_string());
    }

    hints
}
