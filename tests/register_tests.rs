//! Tests for POST /api/v1/auth/register/.

mod common;

use axum::http::StatusCode;
use common::*;
use taskgate::create_app;
use tower::ServiceExt;

const REGISTER: &str = "/api/v1/auth/register/";

#[tokio::test]
async fn test_register_then_login() {
    let (app, _db) = create_test_app().await;

    let body = serde_json::json!({
        "username": "alice",
        "email": "alice@example.com",
        "password": TEST_PASSWORD,
    })
    .to_string();
    let response = app.clone().oneshot(post_json(REGISTER, &body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    assert!(set_cookies(&response).is_empty());
    let json = body_json(response).await;
    assert_eq!(json["username"], "alice");
    assert_eq!(json["email"], "alice@example.com");
    assert_eq!(json["role"], "USER");
    assert!(json.get("password").is_none());

    let login = app
        .oneshot(post_json(
            "/api/v1/auth/login/",
            &login_body("alice", TEST_PASSWORD),
        ))
        .await
        .unwrap();
    assert_eq!(login.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_register_ignores_requested_role() {
    let (app, db) = create_test_app().await;

    let body = serde_json::json!({
        "username": "mallory",
        "password": TEST_PASSWORD,
        "role": "ADMIN",
    })
    .to_string();
    let response = app.oneshot(post_json(REGISTER, &body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let user = db.users().get_by_username("mallory").await.unwrap().unwrap();
    assert_eq!(user.role.as_str(), "USER");
}

#[tokio::test]
async fn test_register_duplicate_username() {
    let (app, db) = create_test_app().await;
    create_user(&db, "alice").await;

    let body = serde_json::json!({ "username": "Alice", "password": TEST_PASSWORD }).to_string();
    let response = app.oneshot(post_json(REGISTER, &body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "conflict");
}

#[tokio::test]
async fn test_register_short_password() {
    let (app, _db) = create_test_app().await;

    let body = serde_json::json!({ "username": "alice", "password": "short" }).to_string();
    let response = app.oneshot(post_json(REGISTER, &body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "invalid");
}

#[tokio::test]
async fn test_register_missing_password() {
    let (app, _db) = create_test_app().await;

    let response = app
        .oneshot(post_json(REGISTER, r#"{"username": "alice"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "invalid");
}

#[tokio::test]
async fn test_register_disabled() {
    let mut config = test_config(test_db().await);
    config.no_signup = true;
    let app = create_app(&config);

    let body = serde_json::json!({ "username": "alice", "password": TEST_PASSWORD }).to_string();
    let response = app
        .clone()
        .oneshot(post_json(REGISTER, &body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // The rest of the API is still mounted
    let logout = app
        .oneshot(post_empty("/api/v1/auth/logout/", None))
        .await
        .unwrap();
    assert_eq!(logout.status(), StatusCode::OK);
}
