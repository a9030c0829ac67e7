//! Credential handlers, including the per-credential group shares

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use lockbox_sharing::CredentialDraft;
use lockbox_storage::{CredentialId, GroupId};
use serde::Deserialize;

use super::{parse_id, CredentialResponse};
use crate::server::{Actor, ApiError, ApiJson, AppState};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateCredentialRequest {
    pub title: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShareWithGroupRequest {
    pub group_id: String,
}

pub async fn create_credential(
    State(state): State<AppState>,
    Actor(actor): Actor,
    ApiJson(req): ApiJson<CreateCredentialRequest>,
) -> Result<(StatusCode, Json<CredentialResponse>), ApiError> {
    let credential = state
        .sharing
        .create_credential(
            &actor,
            CredentialDraft {
                title: req.title,
                username: req.username,
                password: req.password,
                url: req.url,
                notes: req.notes,
                category: req.category,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(credential.into())))
}

pub async fn list_credentials(
    State(state): State<AppState>,
    Actor(actor): Actor,
) -> Result<Json<Vec<CredentialResponse>>, ApiError> {
    let credentials = state.sharing.list_credentials(&actor).await?;
    Ok(Json(
        credentials
            .into_iter()
            .map(CredentialResponse::from)
            .collect(),
    ))
}

pub async fn get_credential(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(credential_id): Path<String>,
) -> Result<Json<CredentialResponse>, ApiError> {
    let credential_id: CredentialId = parse_id("credential id", &credential_id)?;
    let credential = state
        .sharing
        .get_credential(&actor, &credential_id)
        .await?;
    Ok(Json(credential.into()))
}

pub async fn delete_credential(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(credential_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let credential_id: CredentialId = parse_id("credential id", &credential_id)?;
    state
        .sharing
        .delete_credential(&actor, &credential_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn share_with_group(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(credential_id): Path<String>,
    ApiJson(req): ApiJson<ShareWithGroupRequest>,
) -> Result<Json<CredentialResponse>, ApiError> {
    let credential_id: CredentialId = parse_id("credential id", &credential_id)?;
    let group_id: GroupId = parse_id("group id", &req.group_id)?;
    let credential = state
        .sharing
        .share_with_group(&actor, &credential_id, &group_id)
        .await?;
    Ok(Json(credential.into()))
}

pub async fn unshare_from_group(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path((credential_id, group_id)): Path<(String, String)>,
) -> Result<Json<CredentialResponse>, ApiError> {
    let credential_id: CredentialId = parse_id("credential id", &credential_id)?;
    let group_id: GroupId = parse_id("group id", &group_id)?;
    let credential = state
        .sharing
        .unshare_from_group(&actor, &credential_id, &group_id)
        .await?;
    Ok(Json(credential.into()))
}
