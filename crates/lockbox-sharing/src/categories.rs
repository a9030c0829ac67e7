//! Category sharing: grant a group's members visibility into every credential an
//! owner has tagged with a category.

use lockbox_storage::{
    CategoryShare, CategoryShareFilter, CreateCategoryShareParams, GroupId, Store, StoreError,
    UserId,
};
use tracing::info;

use crate::error::internal;
use crate::{Sharing, SharingError};

/// Optional filters for [`Sharing::list_shares`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShareFilters {
    pub owner_id: Option<UserId>,
    pub group_id: Option<GroupId>,
    pub category_name: Option<String>,
}

fn category(name: &str) -> Result<&str, SharingError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(SharingError::InvalidArgument(
            "Category name is required".to_string(),
        ));
    }
    Ok(name)
}

impl<S: Store + ?Sized> Sharing<S> {
    /// Share the actor's `category_name` with a group.
    ///
    /// The target group's membership isn't checked: anyone may share their own
    /// category with any existing group.
    pub async fn share_category(
        &self,
        actor: &UserId,
        category_name: &str,
        group_id: &GroupId,
    ) -> Result<CategoryShare, SharingError> {
        let category_name = category(category_name)?;
        self.load_group(group_id).await?;

        let existing = self
            .store
            .list_category_shares(&CategoryShareFilter::triple(actor, category_name, group_id))
            .await
            .map_err(|e| internal("Failed to check existing shares", e))?;
        if !existing.is_empty() {
            return Err(SharingError::Conflict(
                "Category is already shared with this group".to_string(),
            ));
        }

        let share = self
            .store
            .create_category_share(&CreateCategoryShareParams {
                owner_id: actor.clone(),
                category_name: category_name.to_string(),
                group_id: *group_id,
                shared_by: actor.clone(),
            })
            .await
            .map_err(|e| match e {
                StoreError::AlreadyExists => SharingError::Conflict(
                    "Category is already shared with this group".to_string(),
                ),
                _ => internal("Failed to create category share", e),
            })?;

        info!(owner_id = %actor, category = %category_name, group_id = %group_id, "category shared");
        Ok(share)
    }

    /// Remove a category share. Returns the number of shares removed.
    ///
    /// The category's owner removes only their own share. A group admin who doesn't
    /// own a share removes every owner's share of that category on the group.
    pub async fn unshare_category(
        &self,
        actor: &UserId,
        category_name: &str,
        group_id: &GroupId,
    ) -> Result<u64, SharingError> {
        let category_name = category(category_name)?;

        let shares = self
            .store
            .list_category_shares(&CategoryShareFilter::category_in_group(
                category_name,
                group_id,
            ))
            .await
            .map_err(|e| internal("Failed to list category shares", e))?;
        if shares.is_empty() {
            return Err(SharingError::NotFound(
                "Category is not shared with this group".to_string(),
            ));
        }

        let filter = if shares.iter().any(|s| &s.owner_id == actor) {
            CategoryShareFilter::triple(actor, category_name, group_id)
        } else {
            let is_group_admin = match self.store.get_group(group_id).await {
                Ok(group) => group.is_admin(actor),
                Err(StoreError::NotFound) => false,
                Err(e) => return Err(internal("Failed to get group", e)),
            };
            if !is_group_admin {
                return Err(SharingError::Forbidden(
                    "Only the category owner or a group admin can unshare".to_string(),
                ));
            }
            CategoryShareFilter::category_in_group(category_name, group_id)
        };

        let deleted = self
            .store
            .delete_category_shares(&filter)
            .await
            .map_err(|e| internal("Failed to delete category share", e))?;
        if deleted == 0 {
            return Err(SharingError::NotFound(
                "Category is not shared with this group".to_string(),
            ));
        }

        info!(actor = %actor, category = %category_name, group_id = %group_id, deleted, "category unshared");
        Ok(deleted)
    }

    /// List category shares visible to the actor.
    ///
    /// Without filters this is the actor's own shares plus every share targeting a
    /// group they belong to. A group filter requires membership of that group; an
    /// owner filter must name the actor.
    pub async fn list_shares(
        &self,
        actor: &UserId,
        filters: &ShareFilters,
    ) -> Result<Vec<CategoryShare>, SharingError> {
        if let Some(group_id) = &filters.group_id {
            let is_member = match self.store.get_group(group_id).await {
                Ok(group) => group.is_member(actor),
                Err(StoreError::NotFound) => false,
                Err(e) => return Err(internal("Failed to get group", e)),
            };
            if !is_member {
                return Err(SharingError::Forbidden(
                    "Not a member of this group".to_string(),
                ));
            }
        }

        if filters.owner_id.as_ref().is_some_and(|o| o != actor) {
            return Err(SharingError::Forbidden(
                "Cannot list another user's shares".to_string(),
            ));
        }

        let filter = CategoryShareFilter {
            owner_id: filters.owner_id.clone(),
            group_id: filters.group_id,
            category_name: filters
                .category_name
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
        };

        let result = if filter.group_id.is_some() {
            self.store.list_category_shares(&filter).await
        } else {
            self.store.list_visible_category_shares(actor, &filter).await
        };
        result.map_err(|e| internal("Failed to list category shares", e))
    }

    /// Delete category shares whose group no longer exists.
    ///
    /// Finishes group deletions that failed after the group record was removed.
    pub async fn sweep_orphaned_shares(&self) -> Result<u64, SharingError> {
        let removed = self
            .store
            .delete_orphaned_category_shares()
            .await
            .map_err(|e| internal("Failed to sweep orphaned category shares", e))?;
        info!(removed, "orphaned category shares swept");
        Ok(removed)
    }
}
