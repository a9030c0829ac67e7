//! Group types: a named set of users with per-user roles.

use chrono::{DateTime, Utc};

use super::{GroupId, MemberRole, UserId};

/// Group record, with its membership list loaded.
#[derive(Clone, Debug)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub owner_id: UserId,
    pub members: Vec<GroupMember>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Group {
    pub fn member(&self, user_id: &UserId) -> Option<&GroupMember> {
        self.members.iter().find(|m| &m.user_id == user_id)
    }

    pub fn is_member(&self, user_id: &UserId) -> bool {
        self.member(user_id).is_some()
    }

    pub fn is_owner(&self, user_id: &UserId) -> bool {
        &self.owner_id == user_id
    }

    /// Owner, or a member holding the admin role.
    pub fn is_admin(&self, user_id: &UserId) -> bool {
        self.is_owner(user_id)
            || self
                .member(user_id)
                .map(|m| m.role.is_admin())
                .unwrap_or(false)
    }
}

/// Group membership record
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupMember {
    pub user_id: UserId,
    pub role: MemberRole,
    pub added_at: DateTime<Utc>,
    pub added_by: UserId,
}

/// Parameters for creating a group. The owner becomes its first (admin) member.
#[derive(Clone, Debug)]
pub struct CreateGroupParams {
    pub name: String,
    pub owner_id: UserId,
}

/// Parameters for inserting a member into a group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewGroupMember {
    pub user_id: UserId,
    pub role: MemberRole,
    pub added_by: UserId,
}
