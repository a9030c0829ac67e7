//! The Store trait that backends implement.

use crate::types::*;
use crate::StoreError;
use crate::WriteOutcome;

/// The storage trait the sharing engine depends on.
///
/// Lookups of a single record return [`StoreError::NotFound`] when it doesn't exist.
/// Updates report a [`WriteOutcome`] instead, so callers can tell "nothing matched"
/// from "matched but already in the requested state".
#[cfg_attr(feature = "test-support", mockall::automock)]
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    // ───────────────────────────────────── Groups ─────────────────────────────────────────

    /// Create a group together with its owner as the sole admin member.
    async fn create_group(&self, params: &CreateGroupParams) -> Result<Group, StoreError>;

    /// Get a group with its members.
    async fn get_group(&self, group_id: &GroupId) -> Result<Group, StoreError>;

    /// List all groups the user is a member of.
    async fn list_user_groups(&self, user_id: &UserId) -> Result<Vec<Group>, StoreError>;

    /// Rename a group and bump its `updated_at`.
    async fn rename_group(&self, group_id: &GroupId, name: &str)
        -> Result<WriteOutcome, StoreError>;

    /// Delete a group and its membership rows. Returns the number of groups deleted.
    async fn delete_group(&self, group_id: &GroupId) -> Result<u64, StoreError>;

    /// Set-insert a member. Inserting a user that is already a member is a no-op
    /// (`modified == 0`) and leaves the existing role untouched.
    async fn add_group_member(
        &self,
        group_id: &GroupId,
        member: &NewGroupMember,
    ) -> Result<WriteOutcome, StoreError>;

    /// Remove a member from a group.
    async fn remove_group_member(
        &self,
        group_id: &GroupId,
        user_id: &UserId,
    ) -> Result<WriteOutcome, StoreError>;

    /// Change the role of an existing member.
    async fn set_group_member_role(
        &self,
        group_id: &GroupId,
        user_id: &UserId,
        role: MemberRole,
    ) -> Result<WriteOutcome, StoreError>;

    // ───────────────────────────────────── Category shares ────────────────────────────────

    /// Create a category share. Returns [`StoreError::AlreadyExists`] when the
    /// `(owner, category, group)` triple is already taken.
    async fn create_category_share(
        &self,
        params: &CreateCategoryShareParams,
    ) -> Result<CategoryShare, StoreError>;

    /// List category shares matching the filter.
    async fn list_category_shares(
        &self,
        filter: &CategoryShareFilter,
    ) -> Result<Vec<CategoryShare>, StoreError>;

    /// List shares the user can see: the ones they own plus the ones targeting any
    /// group they belong to, further narrowed by `filter`.
    async fn list_visible_category_shares(
        &self,
        user_id: &UserId,
        filter: &CategoryShareFilter,
    ) -> Result<Vec<CategoryShare>, StoreError>;

    /// Delete category shares matching the filter. An empty filter is rejected.
    /// Returns the number of shares deleted.
    async fn delete_category_shares(&self, filter: &CategoryShareFilter)
        -> Result<u64, StoreError>;

    /// Delete category shares whose group no longer exists.
    async fn delete_orphaned_category_shares(&self) -> Result<u64, StoreError>;

    // ───────────────────────────────────── Credentials ────────────────────────────────────

    /// Create a credential entry. The creation is recorded in its history.
    async fn create_credential(
        &self,
        params: &CreateCredentialParams,
    ) -> Result<Credential, StoreError>;

    /// Get a credential entry (deleted entries included).
    async fn get_credential(&self, credential_id: &CredentialId)
        -> Result<Credential, StoreError>;

    /// List non-deleted credentials whose effective owner is the user.
    async fn list_owned_credentials(&self, user_id: &UserId)
        -> Result<Vec<Credential>, StoreError>;

    /// List non-deleted credentials of other owners that the user can see through a
    /// category share or a legacy per-credential group share.
    async fn list_credentials_shared_with(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Credential>, StoreError>;

    /// Set-insert a group into a non-deleted credential's `shared_with_group_ids`.
    /// When the set changes, `entry` is prepended to the history (capped at
    /// [`HISTORY_LIMIT`]) and `last_modified_by` is set to `entry.user_id`.
    async fn add_credential_group(
        &self,
        credential_id: &CredentialId,
        group_id: &GroupId,
        entry: &HistoryEntry,
    ) -> Result<WriteOutcome, StoreError>;

    /// Set-remove a group from a non-deleted credential's `shared_with_group_ids`,
    /// with the same history bookkeeping as [`Store::add_credential_group`].
    async fn remove_credential_group(
        &self,
        credential_id: &CredentialId,
        group_id: &GroupId,
        entry: &HistoryEntry,
    ) -> Result<WriteOutcome, StoreError>;

    /// Strip a group from every credential's `shared_with_group_ids`.
    /// Returns the number of references removed.
    async fn remove_group_from_credentials(&self, group_id: &GroupId) -> Result<u64, StoreError>;

    /// Flag a credential as deleted and record `entry` in its history.
    async fn soft_delete_credential(
        &self,
        credential_id: &CredentialId,
        entry: &HistoryEntry,
    ) -> Result<WriteOutcome, StoreError>;
}
