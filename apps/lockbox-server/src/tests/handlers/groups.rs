//! Group handler tests

use axum::http::{Method, StatusCode};
use serde_json::json;

use crate::tests::common::*;

#[tokio::test]
async fn test_create_group_makes_actor_owner_and_admin() {
    let app = create_test_app().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/groups",
        Some("alice"),
        Some(json!({ "name": "  ops  " })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], "ops");
    assert_eq!(body["owner_id"], "alice");
    assert_eq!(body["members"].as_array().unwrap().len(), 1);
    assert_eq!(body["members"][0]["user_id"], "alice");
    assert_eq!(body["members"][0]["role"], "admin");
}

#[tokio::test]
async fn test_missing_actor_is_unauthenticated() {
    let app = create_test_app().await;

    let (status, body) = send(&app, Method::GET, "/api/v1/groups", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthenticated");

    let (status, _) = send(&app, Method::GET, "/api/v1/groups", Some("   "), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_malformed_bodies_are_bad_requests() {
    let app = create_test_app().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/groups",
        Some("alice"),
        Some(json!({ "name": "ops", "owner_id": "mallory" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_argument");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/groups",
        Some("alice"),
        Some(json!({ "name": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Group name is required");
}

#[tokio::test]
async fn test_list_groups_only_returns_memberships() {
    let app = create_test_app().await;
    let ops = create_group(&app, "alice", "ops").await;
    create_group(&app, "bob", "finance").await;
    add_member(&app, "alice", &ops, "bob", "member").await;

    let (status, body) = send(&app, Method::GET, "/api/v1/groups", Some("bob"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (_, body) = send(&app, Method::GET, "/api/v1/groups", Some("carol"), None).await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_get_group_requires_membership() {
    let app = create_test_app().await;
    let ops = create_group(&app, "alice", "ops").await;

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/v1/groups/{ops}"),
        Some("alice"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], ops.as_str());

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/v1/groups/{ops}"),
        Some("mallory"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");
}

#[tokio::test]
async fn test_invalid_group_id_is_rejected() {
    let app = create_test_app().await;

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/v1/groups/not-a-uuid",
        Some("alice"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid group id: not-a-uuid");
}

#[tokio::test]
async fn test_rename_group_by_admin_only() {
    let app = create_test_app().await;
    let ops = create_group(&app, "alice", "ops").await;
    add_member(&app, "alice", &ops, "bob", "admin").await;
    add_member(&app, "alice", &ops, "carol", "member").await;

    let uri = format!("/api/v1/groups/{ops}");
    let (status, _) = send(
        &app,
        Method::PATCH,
        &uri,
        Some("carol"),
        Some(json!({ "name": "carol's" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        Method::PATCH,
        &uri,
        Some("bob"),
        Some(json!({ "name": "platform" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "platform");
}

#[tokio::test]
async fn test_delete_group_owner_only_and_cascades() {
    let app = create_test_app().await;
    let ops = create_group(&app, "alice", "ops").await;
    add_member(&app, "alice", &ops, "bob", "admin").await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/category-shares",
        Some("bob"),
        Some(json!({ "category_name": "infra", "group_id": ops })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let uri = format!("/api/v1/groups/{ops}");
    let (status, _) = send(&app, Method::DELETE, &uri, Some("bob"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, Method::DELETE, &uri, Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["group_id"], ops.as_str());
    assert_eq!(body["removed_category_shares"], 1);

    let (status, _) = send(&app, Method::GET, &uri, Some("alice"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, Method::DELETE, &uri, Some("alice"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}
