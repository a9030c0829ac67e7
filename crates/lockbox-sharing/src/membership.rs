//! Membership rules.
//!
//! The `check_*` functions are pure: they decide, given the current group, whether
//! an actor may perform a membership change. The async operations on [`Sharing`]
//! load the group, apply the decision, write, and re-read.
//!
//! Rules:
//! - only the owner or an admin member may change membership;
//! - the owner is always an admin member and can't be removed;
//! - a non-owner admin can't remove an admin, and can't change the role of an
//!   admin other than themselves.

use lockbox_storage::{Group, GroupId, MemberRole, NewGroupMember, Store, UserId};
use tracing::{debug, info};

use crate::error::internal;
use crate::{Sharing, SharingError};

/// What an accepted add-member request requires of the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddDecision {
    Insert,
    /// The user is already a member with the requested role.
    AlreadySatisfied,
}

/// What an accepted role change requires of the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoleDecision {
    Apply,
    Unchanged,
}

fn require_admin(actor: &UserId, group: &Group) -> Result<(), SharingError> {
    if group.is_admin(actor) {
        Ok(())
    } else {
        Err(SharingError::Forbidden(
            "Only the group owner or an admin can manage members".to_string(),
        ))
    }
}

pub fn check_add_member(
    actor: &UserId,
    group: &Group,
    user_id: &UserId,
    role: MemberRole,
) -> Result<AddDecision, SharingError> {
    require_admin(actor, group)?;

    if user_id.as_str().trim().is_empty() {
        return Err(SharingError::InvalidArgument(
            "User id is required".to_string(),
        ));
    }
    if group.is_owner(user_id) && role != MemberRole::Admin {
        return Err(SharingError::InvalidArgument(
            "The group owner must remain an admin".to_string(),
        ));
    }

    match group.member(user_id) {
        Some(m) if m.role == role => Ok(AddDecision::AlreadySatisfied),
        Some(m) => Err(SharingError::Conflict(format!(
            "User is already a member with role {}",
            m.role
        ))),
        None => Ok(AddDecision::Insert),
    }
}

pub fn check_remove_member(
    actor: &UserId,
    group: &Group,
    user_id: &UserId,
) -> Result<(), SharingError> {
    require_admin(actor, group)?;

    if group.is_owner(user_id) {
        return Err(SharingError::InvalidArgument(
            "The group owner cannot be removed".to_string(),
        ));
    }

    let target = group
        .member(user_id)
        .ok_or_else(|| SharingError::NotFound("Member not found".to_string()))?;

    if !group.is_owner(actor) && target.role.is_admin() {
        return Err(SharingError::Forbidden(
            "Only the group owner can remove an admin".to_string(),
        ));
    }

    Ok(())
}

pub fn check_update_role(
    actor: &UserId,
    group: &Group,
    user_id: &UserId,
    role: MemberRole,
) -> Result<RoleDecision, SharingError> {
    require_admin(actor, group)?;

    if group.is_owner(user_id) && role != MemberRole::Admin {
        return Err(SharingError::InvalidArgument(
            "The group owner must remain an admin".to_string(),
        ));
    }

    let target = group
        .member(user_id)
        .ok_or_else(|| SharingError::NotFound("Member not found".to_string()))?;

    if !group.is_owner(actor) && target.role.is_admin() && user_id != actor {
        return Err(SharingError::Forbidden(
            "Only the group owner can change another admin's role".to_string(),
        ));
    }

    if target.role == role {
        Ok(RoleDecision::Unchanged)
    } else {
        Ok(RoleDecision::Apply)
    }
}

impl<S: Store + ?Sized> Sharing<S> {
    /// Add `user_id` to the group with `role` and return the updated group.
    ///
    /// Idempotent: re-adding a member with the same role returns the group as is.
    /// Success is judged on the re-read group, so a concurrent identical add that
    /// leaves the store reporting zero modifications still succeeds.
    pub async fn add_member(
        &self,
        actor: &UserId,
        group_id: &GroupId,
        user_id: &UserId,
        role: MemberRole,
    ) -> Result<Group, SharingError> {
        let group = self.load_group(group_id).await?;

        if check_add_member(actor, &group, user_id, role)? == AddDecision::AlreadySatisfied {
            debug!(group_id = %group_id, user_id = %user_id, "member already present");
            return Ok(group);
        }

        let outcome = self
            .store
            .add_group_member(
                group_id,
                &NewGroupMember {
                    user_id: user_id.clone(),
                    role,
                    added_by: actor.clone(),
                },
            )
            .await
            .map_err(|e| internal("Failed to add member", e))?;
        if !outcome.is_matched() {
            return Err(SharingError::NotFound("Group not found".to_string()));
        }

        let updated = self.load_group(group_id).await?;
        match updated.member(user_id) {
            Some(m) if m.role == role => {
                info!(group_id = %group_id, user_id = %user_id, role = %role, added_by = %actor, "member added");
                Ok(updated)
            }
            Some(m) => Err(SharingError::Conflict(format!(
                "User is already a member with role {}",
                m.role
            ))),
            None => Err(SharingError::Internal(
                "Member missing after insert".to_string(),
            )),
        }
    }

    /// Remove a member and return the updated group.
    pub async fn remove_member(
        &self,
        actor: &UserId,
        group_id: &GroupId,
        user_id: &UserId,
    ) -> Result<Group, SharingError> {
        let group = self.load_group(group_id).await?;
        check_remove_member(actor, &group, user_id)?;

        let outcome = self
            .store
            .remove_group_member(group_id, user_id)
            .await
            .map_err(|e| internal("Failed to remove member", e))?;
        if !outcome.is_matched() {
            return Err(SharingError::NotFound("Group not found".to_string()));
        }

        let updated = self.load_group(group_id).await?;
        if updated.is_member(user_id) {
            return Err(SharingError::Internal(
                "Member still present after removal".to_string(),
            ));
        }

        info!(group_id = %group_id, user_id = %user_id, removed_by = %actor, "member removed");
        Ok(updated)
    }

    /// Change a member's role and return the updated group.
    pub async fn update_member_role(
        &self,
        actor: &UserId,
        group_id: &GroupId,
        user_id: &UserId,
        role: MemberRole,
    ) -> Result<Group, SharingError> {
        let group = self.load_group(group_id).await?;

        if check_update_role(actor, &group, user_id, role)? == RoleDecision::Unchanged {
            return Ok(group);
        }

        let outcome = self
            .store
            .set_group_member_role(group_id, user_id, role)
            .await
            .map_err(|e| internal("Failed to update member role", e))?;
        if !outcome.is_matched() {
            return Err(SharingError::NotFound("Member not found".to_string()));
        }

        info!(group_id = %group_id, user_id = %user_id, role = %role, changed_by = %actor, "member role updated");
        self.load_group(group_id).await
    }
}
