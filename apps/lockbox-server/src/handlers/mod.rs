//! HTTP handlers, one module per resource, plus the JSON shapes they return.

pub mod category_shares;
pub mod credentials;
pub mod groups;
pub mod members;

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use lockbox_sharing::GroupDeletion;
use lockbox_storage::{
    CategoryShare, Credential, Group, GroupMember, HistoryEntry, MemberRole, UserId,
};
use serde::Serialize;

use crate::server::ApiError;

/// Parse an identifier taken from the path or a request body.
pub(crate) fn parse_id<T: FromStr>(what: &str, raw: &str) -> Result<T, ApiError> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| ApiError::invalid(format!("Invalid {}: {}", what, raw)))
}

/// User ids are opaque; only surrounding whitespace is dropped.
pub(crate) fn user_id(raw: &str) -> UserId {
    UserId::new(raw.trim())
}

pub(crate) fn parse_role(raw: &str) -> Result<MemberRole, ApiError> {
    raw.parse::<MemberRole>()
        .map_err(|e| ApiError::invalid(e.to_string()))
}

fn timestamp(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[derive(Debug, Serialize)]
pub struct MemberResponse {
    pub user_id: String,
    pub role: &'static str,
    pub added_at: String,
    pub added_by: String,
}

impl From<&GroupMember> for MemberResponse {
    fn from(m: &GroupMember) -> Self {
        Self {
            user_id: m.user_id.to_string(),
            role: m.role.as_str(),
            added_at: timestamp(&m.added_at),
            added_by: m.added_by.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GroupResponse {
    pub id: String,
    pub name: String,
    pub owner_id: String,
    pub members: Vec<MemberResponse>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Group> for GroupResponse {
    fn from(g: Group) -> Self {
        Self {
            id: g.id.to_string(),
            members: g.members.iter().map(MemberResponse::from).collect(),
            name: g.name,
            owner_id: g.owner_id.to_string(),
            created_at: timestamp(&g.created_at),
            updated_at: timestamp(&g.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GroupDeletionResponse {
    pub group_id: String,
    pub removed_category_shares: u64,
    pub stripped_credential_refs: u64,
}

impl From<GroupDeletion> for GroupDeletionResponse {
    fn from(d: GroupDeletion) -> Self {
        Self {
            group_id: d.group_id.to_string(),
            removed_category_shares: d.removed_category_shares,
            stripped_credential_refs: d.stripped_credential_refs,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CategoryShareResponse {
    pub id: String,
    pub owner_id: String,
    pub category_name: String,
    pub group_id: String,
    pub shared_at: String,
    pub shared_by: String,
}

impl From<CategoryShare> for CategoryShareResponse {
    fn from(s: CategoryShare) -> Self {
        Self {
            id: s.id.to_string(),
            owner_id: s.owner_id.to_string(),
            category_name: s.category_name,
            group_id: s.group_id.to_string(),
            shared_at: timestamp(&s.shared_at),
            shared_by: s.shared_by.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub action: &'static str,
    pub user_id: String,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
}

impl From<HistoryEntry> for HistoryResponse {
    fn from(h: HistoryEntry) -> Self {
        Self {
            action: h.action.as_str(),
            user_id: h.user_id.to_string(),
            timestamp: timestamp(&h.timestamp),
            group_id: h.group_id.map(|g| g.to_string()),
            group_name: h.group_name,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CredentialResponse {
    pub id: String,
    /// Effective owner.
    pub owner_id: Option<String>,
    pub title: String,
    pub username: String,
    pub password: String,
    pub url: String,
    pub notes: String,
    pub category: Option<String>,
    pub shared_with_group_ids: Vec<String>,
    pub history: Vec<HistoryResponse>,
    pub last_modified_by: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Credential> for CredentialResponse {
    fn from(c: Credential) -> Self {
        Self {
            id: c.id.to_string(),
            owner_id: c.effective_owner().map(|u| u.to_string()),
            shared_with_group_ids: c
                .shared_with_group_ids
                .iter()
                .map(|g| g.to_string())
                .collect(),
            last_modified_by: c.last_modified_by.as_ref().map(|u| u.to_string()),
            created_at: timestamp(&c.created_at),
            updated_at: timestamp(&c.updated_at),
            history: c.history.into_iter().map(HistoryResponse::from).collect(),
            title: c.title,
            username: c.username,
            password: c.password,
            url: c.url,
            notes: c.notes,
            category: c.category,
        }
    }
}
