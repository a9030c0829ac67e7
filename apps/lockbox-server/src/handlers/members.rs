//! Membership handlers: add, remove, change role

use axum::extract::{Path, State};
use axum::Json;
use lockbox_storage::GroupId;
use serde::Deserialize;

use super::{parse_id, parse_role, user_id, GroupResponse};
use crate::server::{Actor, ApiError, ApiJson, AppState};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddMemberRequest {
    pub user_id: String,
    /// `member` or `admin`.
    pub role: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateMemberRoleRequest {
    pub role: String,
}

pub async fn add_member(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(group_id): Path<String>,
    ApiJson(req): ApiJson<AddMemberRequest>,
) -> Result<Json<GroupResponse>, ApiError> {
    let group_id: GroupId = parse_id("group id", &group_id)?;
    let role = parse_role(&req.role)?;

    let group = state
        .sharing
        .add_member(&actor, &group_id, &user_id(&req.user_id), role)
        .await?;
    Ok(Json(group.into()))
}

pub async fn remove_member(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path((group_id, member)): Path<(String, String)>,
) -> Result<Json<GroupResponse>, ApiError> {
    let group_id: GroupId = parse_id("group id", &group_id)?;
    let group = state
        .sharing
        .remove_member(&actor, &group_id, &user_id(&member))
        .await?;
    Ok(Json(group.into()))
}

pub async fn update_member_role(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path((group_id, member)): Path<(String, String)>,
    ApiJson(req): ApiJson<UpdateMemberRoleRequest>,
) -> Result<Json<GroupResponse>, ApiError> {
    let group_id: GroupId = parse_id("group id", &group_id)?;
    let role = parse_role(&req.role)?;
    let group = state
        .sharing
        .update_member_role(&actor, &group_id, &user_id(&member), role)
        .await?;
    Ok(Json(group.into()))
}
