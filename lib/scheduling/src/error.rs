//! Error types for the scheduling crate.

use std::fmt;

/// Errors from the scheduling stores.
#[derive(Debug)]
pub enum StoreError {
    /// The record does not exist.
    NotFound {
        /// Entity kind, e.g. "doctor".
        entity: &'static str,
        /// The identifier that failed to resolve.
        id: String,
    },
    /// The backing storage failed.
    StorageFailed {
        /// Failure description.
        reason: String,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::StorageFailed { reason } => write!(f, "storage failed: {reason}"),
        }
    }
}

impl std::error::Error for StoreError {}
