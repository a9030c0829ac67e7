//! Sharing rules for lockbox: group membership, category shares, group lifecycle and
//! the legacy per-credential group shares.
//!
//! Every operation re-reads the state it needs from the [`Store`], checks
//! authorization and invariants, performs one mutation and returns the resulting
//! state. Nothing is cached between calls.

mod categories;
mod credentials;
mod error;
mod groups;
pub mod membership;

use std::sync::Arc;

use lockbox_storage::{Group, GroupId, Store, StoreError};

pub use categories::ShareFilters;
pub use credentials::CredentialDraft;
pub use error::SharingError;
pub use groups::GroupDeletion;

use error::internal;

/// Entry point to every sharing operation, generic over the storage backend.
pub struct Sharing<S: ?Sized> {
    store: Arc<S>,
}

impl<S: ?Sized> Clone for Sharing<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: Store + ?Sized> Sharing<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    async fn load_group(&self, group_id: &GroupId) -> Result<Group, SharingError> {
        self.store.get_group(group_id).await.map_err(|e| match e {
            StoreError::NotFound => SharingError::NotFound("Group not found".to_string()),
            _ => internal("Failed to get group", e),
        })
    }
}
