use lockbox_storage::StoreError;
use thiserror::Error;

/// Failure of a sharing operation. Every variant carries a human-readable detail.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SharingError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl SharingError {
    /// Stable machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            SharingError::InvalidArgument(_) => "invalid_argument",
            SharingError::NotFound(_) => "not_found",
            SharingError::Forbidden(_) => "forbidden",
            SharingError::Conflict(_) => "conflict",
            SharingError::Internal(_) => "internal",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            SharingError::InvalidArgument(m)
            | SharingError::NotFound(m)
            | SharingError::Forbidden(m)
            | SharingError::Conflict(m)
            | SharingError::Internal(m) => m,
        }
    }
}

/// Wrap a store failure that has no more specific meaning at the call site.
pub(crate) fn internal(context: &str, e: StoreError) -> SharingError {
    SharingError::Internal(format!("{}: {}", context, e))
}
