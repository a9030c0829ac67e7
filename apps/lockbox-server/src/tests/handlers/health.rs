//! Health listener tests

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tokio::sync::watch;
use tower::ServiceExt;

use crate::server::{health_router, ReadinessCheck};

async fn status_of(app: &axum::Router, uri: &str) -> StatusCode {
    app.clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
        .status()
}

#[tokio::test]
async fn test_readiness_follows_the_watch_channel() {
    let (tx, rx) = watch::channel(false);
    let app = health_router(ReadinessCheck::new(rx), None);

    assert_eq!(status_of(&app, "/healthz").await, StatusCode::OK);
    assert_eq!(
        status_of(&app, "/readyz").await,
        StatusCode::SERVICE_UNAVAILABLE
    );

    tx.send(true).unwrap();
    assert_eq!(status_of(&app, "/readyz").await, StatusCode::OK);

    tx.send(false).unwrap();
    assert_eq!(
        status_of(&app, "/readyz").await,
        StatusCode::SERVICE_UNAVAILABLE
    );
}

#[tokio::test]
async fn test_metrics_route_absent_without_recorder() {
    let (_tx, rx) = watch::channel(true);
    let app = health_router(ReadinessCheck::new(rx), None);

    assert_eq!(status_of(&app, "/metrics").await, StatusCode::NOT_FOUND);
}
