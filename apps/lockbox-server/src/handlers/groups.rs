//! Group handlers: create, list, get, rename, delete

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use lockbox_storage::GroupId;
use serde::Deserialize;

use super::{parse_id, GroupDeletionResponse, GroupResponse};
use crate::server::{Actor, ApiError, ApiJson, AppState};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateGroupRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenameGroupRequest {
    pub name: String,
}

pub async fn create_group(
    State(state): State<AppState>,
    Actor(actor): Actor,
    ApiJson(req): ApiJson<CreateGroupRequest>,
) -> Result<(StatusCode, Json<GroupResponse>), ApiError> {
    let group = state.sharing.create_group(&actor, &req.name).await?;
    Ok((StatusCode::CREATED, Json(group.into())))
}

pub async fn list_groups(
    State(state): State<AppState>,
    Actor(actor): Actor,
) -> Result<Json<Vec<GroupResponse>>, ApiError> {
    let groups = state.sharing.list_groups(&actor).await?;
    Ok(Json(groups.into_iter().map(GroupResponse::from).collect()))
}

pub async fn get_group(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(group_id): Path<String>,
) -> Result<Json<GroupResponse>, ApiError> {
    let group_id: GroupId = parse_id("group id", &group_id)?;
    let group = state.sharing.get_group(&actor, &group_id).await?;
    Ok(Json(group.into()))
}

pub async fn rename_group(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(group_id): Path<String>,
    ApiJson(req): ApiJson<RenameGroupRequest>,
) -> Result<Json<GroupResponse>, ApiError> {
    let group_id: GroupId = parse_id("group id", &group_id)?;
    let group = state
        .sharing
        .rename_group(&actor, &group_id, &req.name)
        .await?;
    Ok(Json(group.into()))
}

pub async fn delete_group(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(group_id): Path<String>,
) -> Result<Json<GroupDeletionResponse>, ApiError> {
    let group_id: GroupId = parse_id("group id", &group_id)?;
    let deletion = state.sharing.delete_group(&actor, &group_id).await?;
    Ok(Json(deletion.into()))
}
