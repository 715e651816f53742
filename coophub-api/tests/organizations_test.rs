//! Router-level tests for the organization endpoints

mod common;

use axum::http::{Method, StatusCode};
use common::{TestContext, TESTER_EMAIL, TESTER_PASSWORD};
use serde_json::{json, Value};

async fn create(ctx: &TestContext, token: &str, document: &str) -> (StatusCode, Value) {
    ctx.request(
        Method::POST,
        "/organizations",
        Some(token),
        Some(json!({
            "name": "Green Valley Cooperative",
            "email": "contact@greenvalley.example",
            "document": document,
            "addressCity": "Porto Alegre",
        })),
    )
    .await
}

#[tokio::test]
async fn test_create_organization() {
    let ctx = TestContext::new().await;
    let token = ctx.token_for(TESTER_EMAIL, TESTER_PASSWORD).await;

    let (status, body) = create(&ctx, &token, "11222333000181").await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], "Green Valley Cooperative");
    assert_eq!(body["addressCity"], "Porto Alegre");
    assert_eq!(body["manager"]["email"], TESTER_EMAIL);
    assert!(body["manager"].get("password").is_none());
}

#[tokio::test]
async fn test_create_requires_token() {
    let ctx = TestContext::new().await;

    let (status, _) = ctx
        .request(
            Method::POST,
            "/organizations",
            None,
            Some(json!({ "name": "x", "document": "1" })),
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_duplicate_document() {
    let ctx = TestContext::new().await;
    let token = ctx.token_for(TESTER_EMAIL, TESTER_PASSWORD).await;

    let (status, _) = create(&ctx, &token, "11222333000181").await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = ctx
        .request(
            Method::POST,
            "/organizations",
            Some(&token),
            Some(json!({ "name": "Copycat", "document": "11222333000181" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["erros"]["document"], "documentAlreadyExists");
}

#[tokio::test]
async fn test_create_validation() {
    let ctx = TestContext::new().await;
    let token = ctx.token_for(TESTER_EMAIL, TESTER_PASSWORD).await;

    let (status, body) = ctx
        .request(
            Method::POST,
            "/organizations",
            Some(&token),
            Some(json!({ "name": "", "document": "123", "email": "nope" })),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["erros"]["name"], "isNotEmpty");
    assert_eq!(body["erros"]["email"], "invalidEmail");
}

#[tokio::test]
async fn test_list_organizations_paginates() {
    let ctx = TestContext::new().await;
    let token = ctx.token_for(TESTER_EMAIL, TESTER_PASSWORD).await;
    create(&ctx, &token, "11222333000181").await;

    // The seeded cooperative plus the one above
    let (status, body) = ctx
        .request(Method::GET, "/organizations?page=1&limit=1", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["hasNextPage"], true);
    assert_eq!(body["data"][0]["document"], "11222333000181");

    let (_, body) = ctx
        .request(Method::GET, "/organizations?page=2&limit=1", Some(&token), None)
        .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["hasNextPage"], false);

    let (_, body) = ctx
        .request(Method::GET, "/organizations", Some(&token), None)
        .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["hasNextPage"], false);
}

#[tokio::test]
async fn test_list_far_past_the_end() {
    let ctx = TestContext::new().await;
    let token = ctx.token_for(TESTER_EMAIL, TESTER_PASSWORD).await;

    let (status, body) = ctx
        .request(
            Method::GET,
            "/organizations?page=9223372036854775807&limit=50",
            Some(&token),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
    assert_eq!(body["hasNextPage"], false);
}

#[tokio::test]
async fn test_malformed_query_is_json_bad_request() {
    let ctx = TestContext::new().await;
    let token = ctx.token_for(TESTER_EMAIL, TESTER_PASSWORD).await;

    let (status, body) = ctx
        .request(Method::GET, "/organizations?page=abc", Some(&token), None)
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
    assert_eq!(body["error"], "bad_request");
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_manager_can_update() {
    let ctx = TestContext::new().await;
    let token = ctx.token_for(TESTER_EMAIL, TESTER_PASSWORD).await;
    let (_, created) = create(&ctx, &token, "11222333000181").await;
    let path = format!("/organizations/{}", created["id"].as_str().unwrap());

    let (status, body) = ctx
        .request(
            Method::PATCH,
            &path,
            Some(&token),
            Some(json!({ "name": "Renamed Cooperative", "addressNumber": "42" })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Renamed Cooperative");
    assert_eq!(body["addressNumber"], "42");
    assert_eq!(body["document"], "11222333000181");
}

#[tokio::test]
async fn test_non_manager_is_forbidden() {
    let ctx = TestContext::new().await;
    let admin = ctx.admin_token().await;
    let (_, created) = create(&ctx, &admin, "11222333000181").await;
    let path = format!("/organizations/{}", created["id"].as_str().unwrap());

    let tester = ctx.token_for(TESTER_EMAIL, TESTER_PASSWORD).await;

    // Reads are open to any authenticated user
    let (status, _) = ctx.request(Method::GET, &path, Some(&tester), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = ctx
        .request(
            Method::PATCH,
            &path,
            Some(&tester),
            Some(json!({ "name": "Hijacked" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx
        .request(Method::DELETE, &path, Some(&tester), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_only_admin_reassigns_manager() {
    let ctx = TestContext::new().await;
    let tester = ctx.token_for(TESTER_EMAIL, TESTER_PASSWORD).await;
    let (_, created) = create(&ctx, &tester, "11222333000181").await;
    let path = format!("/organizations/{}", created["id"].as_str().unwrap());
    let tester_id = created["manager"]["id"].clone();

    let (status, _) = ctx
        .request(
            Method::PATCH,
            &path,
            Some(&tester),
            Some(json!({ "managerId": tester_id })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = ctx.admin_token().await;
    let (status, body) = ctx
        .request(
            Method::PATCH,
            &path,
            Some(&admin),
            Some(json!({ "managerId": "00000000-0000-0000-0000-000000000000" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["erros"]["managerId"], "notFound");
}

#[tokio::test]
async fn test_admin_deletes_organization() {
    let ctx = TestContext::new().await;
    let tester = ctx.token_for(TESTER_EMAIL, TESTER_PASSWORD).await;
    let (_, created) = create(&ctx, &tester, "11222333000181").await;
    let path = format!("/organizations/{}", created["id"].as_str().unwrap());

    let admin = ctx.admin_token().await;
    let (status, _) = ctx.request(Method::DELETE, &path, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = ctx.request(Method::GET, &path, Some(&tester), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx.request(Method::DELETE, &path, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_organization() {
    let ctx = TestContext::new().await;
    let token = ctx.token_for(TESTER_EMAIL, TESTER_PASSWORD).await;

    let (status, _) = ctx
        .request(
            Method::GET,
            "/organizations/6a1f0c3e-8f2b-4c55-9a41-0d3c2b1e9f77",
            Some(&token),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}
