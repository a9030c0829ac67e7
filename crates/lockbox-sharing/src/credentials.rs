//! Credential entries and their legacy per-credential group shares.

use lockbox_storage::{
    CategoryShareFilter, CreateCredentialParams, Credential, CredentialId, GroupId,
    HistoryAction, HistoryEntry, Store, StoreError, UserId,
};
use tracing::info;

use crate::error::internal;
use crate::{Sharing, SharingError};

/// Client-supplied fields of a new credential entry.
#[derive(Clone, Debug, Default)]
pub struct CredentialDraft {
    pub title: String,
    pub username: String,
    pub password: String,
    pub url: String,
    pub notes: String,
    pub category: Option<String>,
}

impl<S: Store + ?Sized> Sharing<S> {
    async fn load_credential(&self, credential_id: &CredentialId) -> Result<Credential, SharingError> {
        self.store
            .get_credential(credential_id)
            .await
            .map_err(|e| match e {
                StoreError::NotFound => SharingError::NotFound("Credential not found".to_string()),
                _ => internal("Failed to get credential", e),
            })
    }

    /// Whether the actor may read the credential: they own it, or belong to a group
    /// it reaches through a category share or its own group list.
    async fn can_view(&self, actor: &UserId, credential: &Credential) -> Result<bool, SharingError> {
        if credential.is_owned_by(actor) {
            return Ok(true);
        }

        let groups = self
            .store
            .list_user_groups(actor)
            .await
            .map_err(|e| internal("Failed to list groups", e))?;
        if groups.iter().any(|g| credential.is_shared_with(&g.id)) {
            return Ok(true);
        }

        let (Some(owner_id), Some(category)) = (credential.effective_owner(), &credential.category)
        else {
            return Ok(false);
        };
        let shares = self
            .store
            .list_category_shares(&CategoryShareFilter {
                owner_id: Some(owner_id.clone()),
                group_id: None,
                category_name: Some(category.clone()),
            })
            .await
            .map_err(|e| internal("Failed to list category shares", e))?;

        Ok(shares
            .iter()
            .any(|s| groups.iter().any(|g| g.id == s.group_id)))
    }

    pub async fn create_credential(
        &self,
        actor: &UserId,
        draft: CredentialDraft,
    ) -> Result<Credential, SharingError> {
        let title = draft.title.trim();
        if title.is_empty() {
            return Err(SharingError::InvalidArgument(
                "Title is required".to_string(),
            ));
        }
        let category = draft
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);

        let credential = self
            .store
            .create_credential(&CreateCredentialParams {
                owner_id: actor.clone(),
                title: title.to_string(),
                username: draft.username,
                password: draft.password,
                url: draft.url,
                notes: draft.notes,
                category,
            })
            .await
            .map_err(|e| internal("Failed to create credential", e))?;

        info!(credential_id = %credential.id, owner_id = %actor, "credential created");
        Ok(credential)
    }

    /// Read a credential the actor can see. Deleted entries are not found.
    pub async fn get_credential(
        &self,
        actor: &UserId,
        credential_id: &CredentialId,
    ) -> Result<Credential, SharingError> {
        let credential = self.load_credential(credential_id).await?;
        if credential.is_deleted {
            return Err(SharingError::NotFound("Credential not found".to_string()));
        }
        if !self.can_view(actor, &credential).await? {
            return Err(SharingError::Forbidden(
                "No access to this credential".to_string(),
            ));
        }
        Ok(credential)
    }

    /// The actor's own entries followed by entries shared with them.
    pub async fn list_credentials(&self, actor: &UserId) -> Result<Vec<Credential>, SharingError> {
        let mut credentials = self
            .store
            .list_owned_credentials(actor)
            .await
            .map_err(|e| internal("Failed to list credentials", e))?;
        let shared = self
            .store
            .list_credentials_shared_with(actor)
            .await
            .map_err(|e| internal("Failed to list shared credentials", e))?;
        credentials.extend(shared);
        Ok(credentials)
    }

    /// Soft-delete a credential. Owner only.
    pub async fn delete_credential(
        &self,
        actor: &UserId,
        credential_id: &CredentialId,
    ) -> Result<(), SharingError> {
        let credential = self.load_credential(credential_id).await?;
        if credential.is_deleted {
            return Err(SharingError::NotFound("Credential not found".to_string()));
        }
        if !credential.is_owned_by(actor) {
            return Err(SharingError::Forbidden(
                "Only the owner can delete a credential".to_string(),
            ));
        }

        let outcome = self
            .store
            .soft_delete_credential(credential_id, &HistoryEntry::new(HistoryAction::Deleted, actor))
            .await
            .map_err(|e| internal("Failed to delete credential", e))?;
        if !outcome.is_matched() {
            return Err(SharingError::NotFound("Credential not found".to_string()));
        }

        info!(credential_id = %credential_id, owner_id = %actor, "credential deleted");
        Ok(())
    }

    /// Add a group to the credential's group list.
    ///
    /// Allowed for the credential's owner and for admins of the group. Sharing with a
    /// group already on the list succeeds without writing.
    pub async fn share_with_group(
        &self,
        actor: &UserId,
        credential_id: &CredentialId,
        group_id: &GroupId,
    ) -> Result<Credential, SharingError> {
        let credential = self.load_credential(credential_id).await?;
        if credential.is_deleted {
            return Err(SharingError::InvalidArgument(
                "Cannot share a deleted credential".to_string(),
            ));
        }

        let group = self.load_group(group_id).await?;
        if !credential.is_owned_by(actor) && !group.is_admin(actor) {
            return Err(SharingError::Forbidden(
                "Only the owner or a group admin can share this credential".to_string(),
            ));
        }

        if credential.is_shared_with(group_id) {
            return Ok(credential);
        }

        let entry = HistoryEntry::new(HistoryAction::SharedWithGroup, actor)
            .with_group(group_id, Some(&group.name));
        let outcome = self
            .store
            .add_credential_group(credential_id, group_id, &entry)
            .await
            .map_err(|e| internal("Failed to share credential", e))?;
        if !outcome.is_matched() {
            return Err(SharingError::InvalidArgument(
                "Cannot share a deleted credential".to_string(),
            ));
        }

        info!(credential_id = %credential_id, group_id = %group_id, actor = %actor, "credential shared with group");
        self.load_credential(credential_id).await
    }

    /// Remove a group from the credential's group list.
    ///
    /// The group may no longer exist; its id can still be removed by the owner.
    pub async fn unshare_from_group(
        &self,
        actor: &UserId,
        credential_id: &CredentialId,
        group_id: &GroupId,
    ) -> Result<Credential, SharingError> {
        let credential = self.load_credential(credential_id).await?;
        if credential.is_deleted {
            return Err(SharingError::InvalidArgument(
                "Cannot unshare a deleted credential".to_string(),
            ));
        }

        let group = match self.store.get_group(group_id).await {
            Ok(group) => Some(group),
            Err(StoreError::NotFound) => None,
            Err(e) => return Err(internal("Failed to get group", e)),
        };
        let is_group_admin = group.as_ref().is_some_and(|g| g.is_admin(actor));
        if !credential.is_owned_by(actor) && !is_group_admin {
            return Err(SharingError::Forbidden(
                "Only the owner or a group admin can unshare this credential".to_string(),
            ));
        }

        if !credential.is_shared_with(group_id) {
            return Err(SharingError::NotFound(
                "Credential is not shared with this group".to_string(),
            ));
        }

        let entry = HistoryEntry::new(HistoryAction::UnsharedFromGroup, actor)
            .with_group(group_id, group.as_ref().map(|g| g.name.as_str()));
        let outcome = self
            .store
            .remove_credential_group(credential_id, group_id, &entry)
            .await
            .map_err(|e| internal("Failed to unshare credential", e))?;
        if !outcome.is_matched() {
            return Err(SharingError::InvalidArgument(
                "Cannot unshare a deleted credential".to_string(),
            ));
        }

        info!(credential_id = %credential_id, group_id = %group_id, actor = %actor, "credential unshared from group");
        self.load_credential(credential_id).await
    }
}
