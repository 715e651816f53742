//! Router-level tests for admin user management

mod common;

use axum::http::{Method, StatusCode};
use common::{assert_sanitized, TestContext, TESTER_EMAIL, TESTER_PASSWORD};

#[tokio::test]
async fn test_regular_user_is_forbidden() {
    let ctx = TestContext::new().await;
    let token = ctx.token_for(TESTER_EMAIL, TESTER_PASSWORD).await;

    let (status, _) = ctx.request(Method::GET, "/users", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx.request(Method::GET, "/users", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_lists_users() {
    let ctx = TestContext::new().await;
    let admin = ctx.admin_token().await;

    let (status, body) = ctx
        .request(Method::GET, "/users?limit=1", Some(&admin), None)
        .await;

    assert_eq!(status, StatusCode::OK);
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(body["hasNextPage"], true);
    assert_sanitized(&data[0]);

    let (_, body) = ctx.request(Method::GET, "/users", Some(&admin), None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["hasNextPage"], false);
}

#[tokio::test]
async fn test_admin_gets_and_deletes_user() {
    let ctx = TestContext::new().await;
    let admin = ctx.admin_token().await;
    let (_, login) = ctx.login(TESTER_EMAIL, TESTER_PASSWORD).await;
    let tester_id = login["user"]["id"].as_str().unwrap().to_string();
    let tester_refresh = login["refreshToken"].as_str().unwrap().to_string();
    let path = format!("/users/{tester_id}");

    let (status, body) = ctx.request(Method::GET, &path, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], TESTER_EMAIL);
    assert_sanitized(&body);

    let (status, _) = ctx.request(Method::DELETE, &path, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = ctx.request(Method::GET, &path, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx.login(TESTER_EMAIL, TESTER_PASSWORD).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = ctx
        .request(Method::POST, "/auth/refresh", Some(&tester_refresh), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_invalid_user_id_is_bad_request() {
    let ctx = TestContext::new().await;
    let admin = ctx.admin_token().await;

    let (status, body) = ctx
        .request(Method::GET, "/users/not-a-uuid", Some(&admin), None)
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
    assert_eq!(body["error"], "bad_request");
}
