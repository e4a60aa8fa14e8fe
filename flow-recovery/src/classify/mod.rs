//! Error normalization, classification, confidence scoring, and
//! remediation hints.
//!
//! Classification is a pure ordered rule list over a normalized
//! [`ClassifiableError`]; everything downstream (category, retryability,
//! confidence, recommendations) derives from the same normalized shape.

mod classifier;
mod confidence;
mod error;
mod recommend;

pub use classifier::{categorize, classify, is_network_error, is_resource_exhaustion};
pub use confidence::confidence_score;
pub use error::{ClassifiableError, ErrorKind, FailureCategory};
pub use recommend::recommend;
