//! Storage abstraction for lockbox.
//!
//! Backend crates (e.g., lockbox-store-sqlite) implement the [`Store`] trait so the
//! sharing engine doesn't depend on any specific database engine or schema details.

mod store;
mod types;

pub use store::*;
pub use types::*;

use thiserror::Error;

/// Uniform error type for all storage backends.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found")]
    NotFound,
    #[error("already exists")]
    AlreadyExists,
    #[error("backend error: {0}")]
    Backend(String),
}

/// Result of a single-document update: how many documents matched the filter
/// and how many were actually changed.
///
/// `matched == 1 && modified == 0` means the write was a no-op (e.g. a set-insert
/// of a value that was already present).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WriteOutcome {
    pub matched: u64,
    pub modified: u64,
}

impl WriteOutcome {
    pub fn unmatched() -> Self {
        Self::default()
    }

    pub fn is_matched(&self) -> bool {
        self.matched > 0
    }

    pub fn is_modified(&self) -> bool {
        self.modified > 0
    }
}
