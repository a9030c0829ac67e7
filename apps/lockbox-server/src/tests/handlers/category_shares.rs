//! Category share handler tests

use axum::http::{Method, StatusCode};
use serde_json::json;

use crate::tests::common::*;

const SHARES: &str = "/api/v1/category-shares";

async fn share(app: &axum::Router, actor: &str, category: &str, group_id: &str) -> StatusCode {
    let (status, _) = send(
        app,
        Method::POST,
        SHARES,
        Some(actor),
        Some(json!({ "category_name": category, "group_id": group_id })),
    )
    .await;
    status
}

#[tokio::test]
async fn test_share_category_and_duplicate_conflicts() {
    let app = create_test_app().await;
    let ops = create_group(&app, "alice", "ops").await;

    let (status, body) = send(
        &app,
        Method::POST,
        SHARES,
        Some("alice"),
        Some(json!({ "category_name": " infra ", "group_id": ops })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["owner_id"], "alice");
    assert_eq!(body["category_name"], "infra");
    assert_eq!(body["group_id"], ops.as_str());
    assert_eq!(body["shared_by"], "alice");

    let (status, body) = send(
        &app,
        Method::POST,
        SHARES,
        Some("alice"),
        Some(json!({ "category_name": "infra", "group_id": ops })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
}

#[tokio::test]
async fn test_share_category_validation() {
    let app = create_test_app().await;
    let ops = create_group(&app, "alice", "ops").await;

    assert_eq!(share(&app, "alice", "  ", &ops).await, StatusCode::BAD_REQUEST);
    assert_eq!(
        share(&app, "alice", "infra", "garbage").await,
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        share(&app, "alice", "infra", "00000000-0000-4000-8000-000000000000").await,
        StatusCode::NOT_FOUND
    );

    // Sharing into a group you don't belong to is allowed.
    assert_eq!(share(&app, "bob", "infra", &ops).await, StatusCode::CREATED);
}

#[tokio::test]
async fn test_unshare_by_owner_removes_only_own_share() {
    let app = create_test_app().await;
    let ops = create_group(&app, "alice", "ops").await;
    assert_eq!(share(&app, "alice", "infra", &ops).await, StatusCode::CREATED);
    assert_eq!(share(&app, "bob", "infra", &ops).await, StatusCode::CREATED);

    let (status, body) = send(
        &app,
        Method::DELETE,
        SHARES,
        Some("bob"),
        Some(json!({ "category_name": "infra", "group_id": ops })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], 1);

    let (_, body) = send(
        &app,
        Method::GET,
        &format!("{SHARES}?group_id={ops}"),
        Some("alice"),
        None,
    )
    .await;
    let shares = body.as_array().unwrap();
    assert_eq!(shares.len(), 1);
    assert_eq!(shares[0]["owner_id"], "alice");
}

#[tokio::test]
async fn test_unshare_by_admin_removes_every_owner() {
    let app = create_test_app().await;
    let ops = create_group(&app, "alice", "ops").await;
    add_member(&app, "alice", &ops, "bob", "admin").await;
    assert_eq!(share(&app, "carol", "infra", &ops).await, StatusCode::CREATED);
    assert_eq!(share(&app, "dave", "infra", &ops).await, StatusCode::CREATED);

    let body = json!({ "category_name": "infra", "group_id": ops });

    let (status, _) = send(&app, Method::DELETE, SHARES, Some("erin"), Some(body.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, resp) = send(&app, Method::DELETE, SHARES, Some("bob"), Some(body.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["deleted"], 2);

    let (status, _) = send(&app, Method::DELETE, SHARES, Some("bob"), Some(body)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_shares_visibility() {
    let app = create_test_app().await;
    let ops = create_group(&app, "alice", "ops").await;
    let hr = create_group(&app, "carol", "hr").await;
    add_member(&app, "alice", &ops, "bob", "member").await;

    assert_eq!(share(&app, "alice", "infra", &ops).await, StatusCode::CREATED);
    assert_eq!(share(&app, "carol", "payroll", &hr).await, StatusCode::CREATED);
    assert_eq!(share(&app, "bob", "personal", &hr).await, StatusCode::CREATED);

    // Own shares plus shares into groups bob belongs to.
    let (status, body) = send(&app, Method::GET, SHARES, Some("bob"), None).await;
    assert_eq!(status, StatusCode::OK);
    let mut categories: Vec<_> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["category_name"].as_str().unwrap().to_string())
        .collect();
    categories.sort();
    assert_eq!(categories, vec!["infra", "personal"]);

    let (_, body) = send(
        &app,
        Method::GET,
        &format!("{SHARES}?category_name=infra&group_id="),
        Some("bob"),
        None,
    )
    .await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _) = send(
        &app,
        Method::GET,
        &format!("{SHARES}?group_id={hr}"),
        Some("bob"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        Method::GET,
        &format!("{SHARES}?owner_id=alice"),
        Some("bob"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("{SHARES}?owner_id=alice&group_id={ops}"),
        Some("bob"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("{SHARES}?owner_id=alice&group_id={ops}"),
        Some("alice"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_list_shares_rejects_unknown_query_fields() {
    let app = create_test_app().await;

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("{SHARES}?shared_by=alice"),
        Some("alice"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_argument");
}
