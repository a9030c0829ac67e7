//! Category share handlers

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use lockbox_sharing::ShareFilters;
use lockbox_storage::{GroupId, UserId};
use serde::{Deserialize, Serialize};

use super::{parse_id, CategoryShareResponse};
use crate::server::{Actor, ApiError, ApiJson, ApiQuery, AppState};

/// Body of both share and unshare.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategoryShareRequest {
    pub category_name: String,
    pub group_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListSharesQuery {
    pub owner_id: Option<String>,
    pub group_id: Option<String>,
    pub category_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UnshareResponse {
    pub deleted: u64,
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

pub async fn share_category(
    State(state): State<AppState>,
    Actor(actor): Actor,
    ApiJson(req): ApiJson<CategoryShareRequest>,
) -> Result<(StatusCode, Json<CategoryShareResponse>), ApiError> {
    let group_id: GroupId = parse_id("group id", &req.group_id)?;
    let share = state
        .sharing
        .share_category(&actor, &req.category_name, &group_id)
        .await?;
    Ok((StatusCode::CREATED, Json(share.into())))
}

pub async fn unshare_category(
    State(state): State<AppState>,
    Actor(actor): Actor,
    ApiJson(req): ApiJson<CategoryShareRequest>,
) -> Result<Json<UnshareResponse>, ApiError> {
    let group_id: GroupId = parse_id("group id", &req.group_id)?;
    let deleted = state
        .sharing
        .unshare_category(&actor, &req.category_name, &group_id)
        .await?;
    Ok(Json(UnshareResponse { deleted }))
}

pub async fn list_shares(
    State(state): State<AppState>,
    Actor(actor): Actor,
    ApiQuery(query): ApiQuery<ListSharesQuery>,
) -> Result<Json<Vec<CategoryShareResponse>>, ApiError> {
    let group_id = match non_empty(query.group_id) {
        Some(raw) => Some(parse_id::<GroupId>("group id", &raw)?),
        None => None,
    };
    let filters = ShareFilters {
        owner_id: non_empty(query.owner_id).map(UserId::new),
        group_id,
        category_name: non_empty(query.category_name),
    };

    let shares = state.sharing.list_shares(&actor, &filters).await?;
    Ok(Json(
        shares.into_iter().map(CategoryShareResponse::from).collect(),
    ))
}
