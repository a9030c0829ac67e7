//! Category share types.

use chrono::{DateTime, Utc};

use super::{CategoryShareId, GroupId, UserId};

/// Grants a group's members visibility into every credential of `owner_id`
/// tagged with `category_name`.
///
/// `(owner_id, category_name, group_id)` is unique.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryShare {
    pub id: CategoryShareId,
    pub owner_id: UserId,
    pub category_name: String,
    pub group_id: GroupId,
    pub shared_at: DateTime<Utc>,
    pub shared_by: UserId,
}

/// Parameters for creating a category share
#[derive(Clone, Debug)]
pub struct CreateCategoryShareParams {
    pub owner_id: UserId,
    pub category_name: String,
    pub group_id: GroupId,
    pub shared_by: UserId,
}

/// Conjunctive filter over category shares. `None` fields don't constrain.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CategoryShareFilter {
    pub owner_id: Option<UserId>,
    pub group_id: Option<GroupId>,
    pub category_name: Option<String>,
}

impl CategoryShareFilter {
    pub fn is_empty(&self) -> bool {
        self.owner_id.is_none() && self.group_id.is_none() && self.category_name.is_none()
    }

    /// Filter matching exactly one `(owner, category, group)` triple.
    pub fn triple(owner_id: &UserId, category_name: &str, group_id: &GroupId) -> Self {
        Self {
            owner_id: Some(owner_id.clone()),
            group_id: Some(*group_id),
            category_name: Some(category_name.to_string()),
        }
    }

    /// Filter matching a category on a group, whoever owns it.
    pub fn category_in_group(category_name: &str, group_id: &GroupId) -> Self {
        Self {
            owner_id: None,
            group_id: Some(*group_id),
            category_name: Some(category_name.to_string()),
        }
    }

    pub fn group(group_id: &GroupId) -> Self {
        Self {
            group_id: Some(*group_id),
            ..Self::default()
        }
    }
}
