//! Membership handler tests

use axum::http::{Method, StatusCode};
use serde_json::json;

use crate::tests::common::*;

fn role_of(group: &serde_json::Value, user: &str) -> Option<String> {
    group["members"]
        .as_array()?
        .iter()
        .find(|m| m["user_id"] == user)
        .map(|m| m["role"].as_str().unwrap().to_string())
}

#[tokio::test]
async fn test_add_member_is_idempotent_for_same_role() {
    let app = create_test_app().await;
    let ops = create_group(&app, "alice", "ops").await;
    let uri = format!("/api/v1/groups/{ops}/members");

    for _ in 0..2 {
        let (status, body) = send(
            &app,
            Method::POST,
            &uri,
            Some("alice"),
            Some(json!({ "user_id": "bob", "role": "member" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(role_of(&body, "bob").as_deref(), Some("member"));
        assert_eq!(body["members"].as_array().unwrap().len(), 2);
    }

    let (status, body) = send(
        &app,
        Method::POST,
        &uri,
        Some("alice"),
        Some(json!({ "user_id": "bob", "role": "admin" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
}

#[tokio::test]
async fn test_add_member_validates_role_and_group() {
    let app = create_test_app().await;
    let ops = create_group(&app, "alice", "ops").await;

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/v1/groups/{ops}/members"),
        Some("alice"),
        Some(json!({ "user_id": "bob", "role": "Admin" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_argument");

    let missing = "00000000-0000-4000-8000-000000000000";
    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/v1/groups/{missing}/members"),
        Some("alice"),
        Some(json!({ "user_id": "bob", "role": "member" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_plain_member_cannot_manage_members() {
    let app = create_test_app().await;
    let ops = create_group(&app, "alice", "ops").await;
    add_member(&app, "alice", &ops, "bob", "member").await;

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/v1/groups/{ops}/members"),
        Some("bob"),
        Some(json!({ "user_id": "carol", "role": "member" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_owner_cannot_be_removed_or_demoted() {
    let app = create_test_app().await;
    let ops = create_group(&app, "alice", "ops").await;
    let uri = format!("/api/v1/groups/{ops}/members/alice");

    let (status, _) = send(&app, Method::DELETE, &uri, Some("alice"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::PATCH,
        &uri,
        Some("alice"),
        Some(json!({ "role": "member" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_cannot_remove_another_admin() {
    let app = create_test_app().await;
    let ops = create_group(&app, "alice", "ops").await;
    add_member(&app, "alice", &ops, "bob", "admin").await;
    add_member(&app, "alice", &ops, "carol", "admin").await;
    add_member(&app, "alice", &ops, "dave", "member").await;

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/v1/groups/{ops}/members/carol"),
        Some("bob"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        Method::DELETE,
        &format!("/api/v1/groups/{ops}/members/dave"),
        Some("bob"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(role_of(&body, "dave"), None);

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/v1/groups/{ops}/members/dave"),
        Some("bob"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_member_role() {
    let app = create_test_app().await;
    let ops = create_group(&app, "alice", "ops").await;
    add_member(&app, "alice", &ops, "bob", "member").await;
    let uri = format!("/api/v1/groups/{ops}/members/bob");

    let (status, body) = send(
        &app,
        Method::PATCH,
        &uri,
        Some("alice"),
        Some(json!({ "role": "admin" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(role_of(&body, "bob").as_deref(), Some("admin"));

    // Admins may step down themselves.
    let (status, body) = send(
        &app,
        Method::PATCH,
        &uri,
        Some("bob"),
        Some(json!({ "role": "member" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(role_of(&body, "bob").as_deref(), Some("member"));

    let (status, _) = send(
        &app,
        Method::PATCH,
        &format!("/api/v1/groups/{ops}/members/nobody"),
        Some("alice"),
        Some(json!({ "role": "admin" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_member_paths_trim_user_ids_like_bodies() {
    let app = create_test_app().await;
    let ops = create_group(&app, "alice", "ops").await;
    add_member(&app, "alice", &ops, "  bob ", "member").await;

    let (status, body) = send(
        &app,
        Method::PATCH,
        &format!("/api/v1/groups/{ops}/members/%20bob%20"),
        Some("alice"),
        Some(json!({ "role": "admin" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(role_of(&body, "bob").as_deref(), Some("admin"));

    let (status, body) = send(
        &app,
        Method::DELETE,
        &format!("/api/v1/groups/{ops}/members/%20bob"),
        Some("alice"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(role_of(&body, "bob"), None);
}
