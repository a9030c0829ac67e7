//! Credential handler tests

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

use crate::tests::common::*;

fn history_actions(credential: &Value) -> Vec<String> {
    credential["history"]
        .as_array()
        .unwrap()
        .iter()
        .map(|h| h["action"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_create_and_get_credential() {
    let app = create_test_app().await;
    let id = create_credential(&app, "alice", Some(" infra ")).await;

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/v1/credentials/{id}"),
        Some("alice"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["owner_id"], "alice");
    assert_eq!(body["category"], "infra");
    assert_eq!(body["password"], "hunter2");
    assert!(body["shared_with_group_ids"].as_array().unwrap().is_empty());

    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/v1/credentials/{id}"),
        Some("mallory"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_create_credential_requires_title() {
    let app = create_test_app().await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/credentials",
        Some("alice"),
        Some(json!({ "username": "root" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/credentials",
        Some("alice"),
        Some(json!({ "title": "  " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_argument");
}

#[tokio::test]
async fn test_share_with_group_grants_access_and_records_history() {
    let app = create_test_app().await;
    let ops = create_group(&app, "alice", "ops").await;
    add_member(&app, "alice", &ops, "bob", "member").await;
    let id = create_credential(&app, "alice", None).await;
    let uri = format!("/api/v1/credentials/{id}/groups");

    // Plain members of the group can't share someone else's credential into it.
    let (status, _) = send(
        &app,
        Method::POST,
        &uri,
        Some("bob"),
        Some(json!({ "group_id": ops })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    for _ in 0..2 {
        let (status, body) = send(
            &app,
            Method::POST,
            &uri,
            Some("alice"),
            Some(json!({ "group_id": ops })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["shared_with_group_ids"], json!([ops]));
    }

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/v1/credentials/{id}"),
        Some("bob"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let actions = history_actions(&body);
    assert_eq!(
        actions
            .iter()
            .filter(|a| *a == "password_shared_with_group")
            .count(),
        1
    );
    let entry = body["history"]
        .as_array()
        .unwrap()
        .iter()
        .find(|h| h["action"] == "password_shared_with_group")
        .unwrap();
    assert_eq!(entry["group_id"], ops.as_str());
    assert_eq!(entry["group_name"], "ops");

    let (_, body) = send(&app, Method::GET, "/api/v1/credentials", Some("bob"), None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_unshare_from_group() {
    let app = create_test_app().await;
    let ops = create_group(&app, "alice", "ops").await;
    let id = create_credential(&app, "alice", None).await;
    let uri = format!("/api/v1/credentials/{id}/groups/{ops}");

    let (status, _) = send(&app, Method::DELETE, &uri, Some("alice"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/v1/credentials/{id}/groups"),
        Some("alice"),
        Some(json!({ "group_id": ops })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, Method::DELETE, &uri, Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["shared_with_group_ids"].as_array().unwrap().is_empty());
    assert!(history_actions(&body).contains(&"password_unshared_from_group".to_string()));
}

#[tokio::test]
async fn test_category_share_exposes_credentials() {
    let app = create_test_app().await;
    let ops = create_group(&app, "alice", "ops").await;
    add_member(&app, "alice", &ops, "bob", "member").await;
    let id = create_credential(&app, "alice", Some("infra")).await;
    create_credential(&app, "alice", Some("personal")).await;

    let (_, body) = send(&app, Method::GET, "/api/v1/credentials", Some("bob"), None).await;
    assert!(body.as_array().unwrap().is_empty());

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/category-shares",
        Some("alice"),
        Some(json!({ "category_name": "infra", "group_id": ops })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = send(&app, Method::GET, "/api/v1/credentials", Some("bob"), None).await;
    let listed = body.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"], id.as_str());

    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/v1/credentials/{id}"),
        Some("bob"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_deleted_credential_is_gone_and_immutable() {
    let app = create_test_app().await;
    let ops = create_group(&app, "alice", "ops").await;
    let id = create_credential(&app, "alice", None).await;
    let uri = format!("/api/v1/credentials/{id}");

    let (status, _) = send(&app, Method::DELETE, &uri, Some("bob"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, Method::DELETE, &uri, Some("alice"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, _) = send(&app, Method::GET, &uri, Some("alice"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::DELETE, &uri, Some("alice"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("{uri}/groups"),
        Some("alice"),
        Some(json!({ "group_id": ops })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Cannot share a deleted credential");
}

#[tokio::test]
async fn test_unknown_credential_is_not_found() {
    let app = create_test_app().await;

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/v1/credentials/00000000-0000-4000-8000-000000000000",
        Some("alice"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Credential not found");
}
