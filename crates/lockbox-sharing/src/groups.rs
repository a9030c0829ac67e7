//! Group lifecycle: create, rename, read, delete.

use lockbox_storage::{CategoryShareFilter, CreateGroupParams, Group, GroupId, Store, UserId};
use tracing::{info, warn};

use crate::error::internal;
use crate::{Sharing, SharingError};

/// Result of deleting a group.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GroupDeletion {
    pub group_id: GroupId,
    pub removed_category_shares: u64,
    /// Credential references to the group stripped before deletion. Zero when that
    /// step failed and was skipped.
    pub stripped_credential_refs: u64,
}

fn group_name(name: &str) -> Result<&str, SharingError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(SharingError::InvalidArgument(
            "Group name is required".to_string(),
        ));
    }
    Ok(name)
}

impl<S: Store + ?Sized> Sharing<S> {
    /// Create a group owned by the actor, who becomes its only (admin) member.
    pub async fn create_group(&self, actor: &UserId, name: &str) -> Result<Group, SharingError> {
        let name = group_name(name)?;

        let group = self
            .store
            .create_group(&CreateGroupParams {
                name: name.to_string(),
                owner_id: actor.clone(),
            })
            .await
            .map_err(|e| internal("Failed to create group", e))?;

        info!(group_id = %group.id, owner_id = %actor, "group created");
        Ok(group)
    }

    pub async fn rename_group(
        &self,
        actor: &UserId,
        group_id: &GroupId,
        name: &str,
    ) -> Result<Group, SharingError> {
        let name = group_name(name)?;
        let group = self.load_group(group_id).await?;

        if !group.is_admin(actor) {
            return Err(SharingError::Forbidden(
                "Only the group owner or an admin can rename the group".to_string(),
            ));
        }

        let outcome = self
            .store
            .rename_group(group_id, name)
            .await
            .map_err(|e| internal("Failed to rename group", e))?;
        if !outcome.is_matched() {
            return Err(SharingError::NotFound("Group not found".to_string()));
        }

        info!(group_id = %group_id, renamed_by = %actor, "group renamed");
        self.load_group(group_id).await
    }

    /// Groups the actor is a member of.
    pub async fn list_groups(&self, actor: &UserId) -> Result<Vec<Group>, SharingError> {
        self.store
            .list_user_groups(actor)
            .await
            .map_err(|e| internal("Failed to list groups", e))
    }

    /// Read a group. Only its members may see it.
    pub async fn get_group(&self, actor: &UserId, group_id: &GroupId) -> Result<Group, SharingError> {
        let group = self.load_group(group_id).await?;
        if !group.is_member(actor) {
            return Err(SharingError::Forbidden(
                "Not a member of this group".to_string(),
            ));
        }
        Ok(group)
    }

    /// Delete a group. Owner only.
    ///
    /// Runs as an ordered sequence of idempotent steps rather than one transaction:
    /// 1. strip the group from credentials' group lists (failure is logged and skipped);
    /// 2. delete the group record;
    /// 3. delete the group's category shares.
    ///
    /// If step 3 fails the group is already gone; [`Sharing::sweep_orphaned_shares`]
    /// finishes the job.
    pub async fn delete_group(
        &self,
        actor: &UserId,
        group_id: &GroupId,
    ) -> Result<GroupDeletion, SharingError> {
        let group = self.load_group(group_id).await?;

        if !group.is_owner(actor) {
            return Err(SharingError::Forbidden(
                "Only the group owner can delete the group".to_string(),
            ));
        }

        let stripped_credential_refs = match self.store.remove_group_from_credentials(group_id).await
        {
            Ok(n) => n,
            Err(e) => {
                warn!(group_id = %group_id, error = %e, "failed to strip group from credentials, continuing");
                0
            }
        };

        let deleted = self.store.delete_group(group_id).await.map_err(|e| {
            SharingError::Internal(format!("Failed to delete group record: {}", e))
        })?;
        if deleted == 0 {
            return Err(SharingError::NotFound("Group not found".to_string()));
        }

        let removed_category_shares = self
            .store
            .delete_category_shares(&CategoryShareFilter::group(group_id))
            .await
            .map_err(|e| {
                SharingError::Internal(format!(
                    "Group deleted but failed to delete its category shares: {}",
                    e
                ))
            })?;

        info!(
            group_id = %group_id,
            owner_id = %actor,
            removed_category_shares,
            stripped_credential_refs,
            "group deleted"
        );

        Ok(GroupDeletion {
            group_id: *group_id,
            removed_category_shares,
            stripped_credential_refs,
        })
    }
}
