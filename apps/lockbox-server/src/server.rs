//! Router, shared state, actor extraction and error responses.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, State};
use axum::http::request::Parts;
use axum::http::{HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{middleware, Json, Router};
use lockbox_sharing::{Sharing, SharingError};
use lockbox_storage::{Store, UserId};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::handlers::{category_shares, credentials, groups, members};
use crate::metrics::track_http;

/// State shared by every API handler.
#[derive(Clone)]
pub struct AppState {
    pub sharing: Sharing<dyn Store>,
    pub actor_header: HeaderName,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: &ServerConfig) -> Self {
        Self {
            sharing: Sharing::new(store),
            actor_header: config.actor_header.clone(),
        }
    }
}

/// Build the `/api/v1` router.
pub fn api_router(state: AppState, config: &ServerConfig) -> Router {
    let api = Router::new()
        .route("/groups", post(groups::create_group).get(groups::list_groups))
        .route(
            "/groups/:group_id",
            get(groups::get_group)
                .patch(groups::rename_group)
                .delete(groups::delete_group),
        )
        .route("/groups/:group_id/members", post(members::add_member))
        .route(
            "/groups/:group_id/members/:user_id",
            delete(members::remove_member).patch(members::update_member_role),
        )
        .route(
            "/category-shares",
            post(category_shares::share_category)
                .delete(category_shares::unshare_category)
                .get(category_shares::list_shares),
        )
        .route(
            "/credentials",
            post(credentials::create_credential).get(credentials::list_credentials),
        )
        .route(
            "/credentials/:credential_id",
            get(credentials::get_credential).delete(credentials::delete_credential),
        )
        .route(
            "/credentials/:credential_id/groups",
            post(credentials::share_with_group),
        )
        .route(
            "/credentials/:credential_id/groups/:group_id",
            delete(credentials::unshare_from_group),
        )
        .route_layer(middleware::from_fn(track_http));

    Router::new()
        .nest("/api/v1", api)
        .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ────────────────────────────────────── Health ──────────────────────────────────────

#[derive(Clone)]
pub struct ReadinessCheck {
    ready: watch::Receiver<bool>,
}

impl ReadinessCheck {
    pub fn new(ready: watch::Receiver<bool>) -> Self {
        Self { ready }
    }
}

#[derive(Clone)]
struct HealthState {
    readiness: ReadinessCheck,
    metrics: Option<PrometheusHandle>,
}

/// Build the router for `/healthz`, `/readyz` and, with a metrics handle, `/metrics`.
pub fn health_router(readiness: ReadinessCheck, metrics: Option<PrometheusHandle>) -> Router {
    let router = Router::new()
        .route("/healthz", get(health_handler))
        .route("/readyz", get(readiness_handler));

    let router = if metrics.is_some() {
        router.route("/metrics", get(metrics_handler))
    } else {
        router
    };

    router.with_state(HealthState { readiness, metrics })
}

async fn health_handler() -> &'static str {
    "ok"
}

async fn readiness_handler(
    State(state): State<HealthState>,
) -> Result<&'static str, StatusCode> {
    if *state.readiness.ready.borrow() {
        Ok("ok")
    } else {
        Err(StatusCode::SERVICE_UNAVAILABLE)
    }
}

async fn metrics_handler(State(state): State<HealthState>) -> Result<String, StatusCode> {
    state
        .metrics
        .as_ref()
        .map(|h| h.render())
        .ok_or(StatusCode::NOT_FOUND)
}

// ────────────────────────────────────── Actor ──────────────────────────────────────

/// The authenticated user a request acts on behalf of, read from the configured
/// header. Requests without it are rejected with 401.
#[derive(Clone, Debug)]
pub struct Actor(pub UserId);

#[axum::async_trait]
impl FromRequestParts<AppState> for Actor {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(&state.actor_header)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| Actor(UserId::new(v)))
            .ok_or(ApiError::Unauthenticated)
    }
}

// ────────────────────────────────────── Extractors ──────────────────────────────────────

/// `Json` with rejections rendered as [`ApiError`].
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `Query` with rejections rendered as [`ApiError`].
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

// ────────────────────────────────────── Errors ──────────────────────────────────────

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Sharing(#[from] SharingError),

    #[error("Missing actor identity")]
    Unauthenticated,

    /// The request body or query string couldn't be decoded.
    #[error("{message}")]
    Malformed { status: StatusCode, message: String },
}

impl ApiError {
    pub fn invalid(message: impl Into<String>) -> Self {
        ApiError::Sharing(SharingError::InvalidArgument(message.into()))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let status = match rejection.status() {
            StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::BAD_REQUEST,
        };
        ApiError::Malformed {
            status,
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Malformed {
            status: StatusCode::BAD_REQUEST,
            message: rejection.body_text(),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: &'a str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match &self {
            ApiError::Sharing(e) => {
                let status = match e {
                    SharingError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
                    SharingError::NotFound(_) => StatusCode::NOT_FOUND,
                    SharingError::Forbidden(_) => StatusCode::FORBIDDEN,
                    SharingError::Conflict(_) => StatusCode::CONFLICT,
                    SharingError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, e.kind(), e.message().to_string())
            }
            ApiError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "unauthenticated",
                self.to_string(),
            ),
            ApiError::Malformed { status, message } => {
                let kind = if *status == StatusCode::PAYLOAD_TOO_LARGE {
                    "payload_too_large"
                } else {
                    "invalid_argument"
                };
                (*status, kind, message.clone())
            }
        };

        if status.is_server_error() {
            tracing::error!(error = %message, "request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %message, "request rejected");
        }

        (
            status,
            Json(ErrorBody {
                error: kind,
                message: &message,
            }),
        )
            .into_response()
    }
}
