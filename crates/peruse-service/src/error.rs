//! Error types for the peruse-service crate.

use peruse_store::StoreError;
use thiserror::Error;

/// Alias for `Result<T, ServiceError>`.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors surfaced by the application services.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// User input failed a validation rule. Raised before any write;
    /// names the offending field and the violated constraint.
    #[error("invalid {field}: {reason}")]
    Validation {
        field: &'static str,
        reason: String,
    },

    /// An error propagated from the storage engine, unmodified.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServiceError {
    /// Shorthand for a validation failure.
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }
}
