//! Credential entry types, including the legacy per-credential group shares.

use std::str::FromStr;

use chrono::{DateTime, Utc};

use super::{CredentialId, GroupId, UserId};

/// Maximum number of history entries kept per credential (most recent first).
pub const HISTORY_LIMIT: usize = 10;

/// Credential entry record
#[derive(Clone, Debug)]
pub struct Credential {
    pub id: CredentialId,
    pub owner_id: Option<UserId>,
    /// Legacy owner field, only consulted when `owner_id` is absent.
    pub user_id: Option<UserId>,
    pub title: String,
    pub username: String,
    pub password: String,
    pub url: String,
    pub notes: String,
    pub category: Option<String>,
    pub is_deleted: bool,
    pub shared_with_group_ids: Vec<GroupId>,
    /// Most recent first, at most [`HISTORY_LIMIT`] entries.
    pub history: Vec<HistoryEntry>,
    pub last_modified_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Credential {
    pub fn effective_owner(&self) -> Option<&UserId> {
        self.owner_id.as_ref().or(self.user_id.as_ref())
    }

    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        self.effective_owner() == Some(user_id)
    }

    pub fn is_shared_with(&self, group_id: &GroupId) -> bool {
        self.shared_with_group_ids.contains(group_id)
    }
}

/// Parameters for creating a credential entry
#[derive(Clone, Debug)]
pub struct CreateCredentialParams {
    pub owner_id: UserId,
    pub title: String,
    pub username: String,
    pub password: String,
    pub url: String,
    pub notes: String,
    pub category: Option<String>,
}

/// One entry of a credential's change log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryEntry {
    pub action: HistoryAction,
    pub user_id: UserId,
    pub timestamp: DateTime<Utc>,
    pub group_id: Option<GroupId>,
    pub group_name: Option<String>,
}

impl HistoryEntry {
    pub fn new(action: HistoryAction, user_id: &UserId) -> Self {
        Self {
            action,
            user_id: user_id.clone(),
            timestamp: Utc::now(),
            group_id: None,
            group_name: None,
        }
    }

    pub fn with_group(mut self, group_id: &GroupId, group_name: Option<&str>) -> Self {
        self.group_id = Some(*group_id);
        self.group_name = group_name.map(str::to_string);
        self
    }
}

/// Actions recorded in a credential's history
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HistoryAction {
    Created,
    SharedWithGroup,
    UnsharedFromGroup,
    Deleted,
}

impl HistoryAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryAction::Created => "password_created",
            HistoryAction::SharedWithGroup => "password_shared_with_group",
            HistoryAction::UnsharedFromGroup => "password_unshared_from_group",
            HistoryAction::Deleted => "password_deleted",
        }
    }
}

impl FromStr for HistoryAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "password_created" => Ok(HistoryAction::Created),
            "password_shared_with_group" => Ok(HistoryAction::SharedWithGroup),
            "password_unshared_from_group" => Ok(HistoryAction::UnsharedFromGroup),
            "password_deleted" => Ok(HistoryAction::Deleted),
            _ => Err(format!("invalid history action: {}", s)),
        }
    }
}
