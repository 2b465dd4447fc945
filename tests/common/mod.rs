#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    extract::ConnectInfo,
    http::{Request, Response, header},
};
use std::net::SocketAddr;
use taskgate::{
    ServerConfig,
    auth::{CookieSettings, RotationPolicy, password::hash_password},
    db::{Database, NewUser, UserRole},
    jwt::JwtConfig,
};

pub const TEST_SECRET: &[u8] = b"test-jwt-secret-that-is-long-enough";
pub const TEST_PASSWORD: &str = "correct-horse-battery";

pub async fn test_db() -> Database {
    Database::open(":memory:")
        .await
        .expect("Failed to open test database")
}

pub fn test_config(db: Database) -> ServerConfig {
    ServerConfig {
        db,
        jwt_secret: TEST_SECRET.to_vec(),
        access_token_lifetime: 300,
        refresh_token_lifetime: 86400,
        rotation: RotationPolicy::default(),
        cookies: CookieSettings {
            access_max_age: Some(300),
            refresh_max_age: Some(86400),
            ..CookieSettings::default()
        },
        no_signup: false,
    }
}

/// JwtConfig signing with the same secret as the test app.
pub fn test_jwt() -> JwtConfig {
    JwtConfig::new(TEST_SECRET)
}

/// Create a test app with default settings and return (app, db).
pub async fn create_test_app() -> (Router, Database) {
    let db = test_db().await;
    let app = taskgate::create_app(&test_config(db.clone()));
    (app, db)
}

/// Create a user with `TEST_PASSWORD` and return its id.
pub async fn create_user(db: &Database, username: &str) -> i64 {
    let password_hash = hash_password(TEST_PASSWORD).unwrap();
    db.users()
        .create(&NewUser {
            username,
            email: "",
            password_hash: &password_hash,
            role: UserRole::User,
        })
        .await
        .unwrap()
}

fn with_peer(mut request: Request<Body>) -> Request<Body> {
    request
        .extensions_mut()
        .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40000))));
    request
}

/// POST with a JSON body, as sent by a client connected from localhost.
pub fn post_json(uri: &str, body: &str) -> Request<Body> {
    with_peer(
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
}

/// POST with a JSON body and a Cookie header.
pub fn post_json_with_cookie(uri: &str, body: &str, cookie: &str) -> Request<Body> {
    with_peer(
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::COOKIE, cookie)
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
}

/// POST without a body, optionally carrying a Cookie header.
pub fn post_empty(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    with_peer(builder.body(Body::empty()).unwrap())
}

pub fn get(uri: &str) -> Request<Body> {
    with_peer(Request::builder().uri(uri).body(Body::empty()).unwrap())
}

pub fn get_with_cookie(uri: &str, cookie: &str) -> Request<Body> {
    with_peer(
        Request::builder()
            .uri(uri)
            .header(header::COOKIE, cookie)
            .body(Body::empty())
            .unwrap(),
    )
}

pub fn get_with_bearer(uri: &str, token: &str) -> Request<Body> {
    with_peer(
        Request::builder()
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap(),
    )
}

pub fn login_body(username: &str, password: &str) -> String {
    serde_json::json!({ "username": username, "password": password }).to_string()
}

/// All Set-Cookie header values, in order.
pub fn set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

/// The Set-Cookie header for `name`, if the response sets it.
pub fn find_set_cookie(response: &Response<Body>, name: &str) -> Option<String> {
    let prefix = format!("{}=", name);
    set_cookies(response)
        .into_iter()
        .find(|c| c.starts_with(&prefix))
}

/// The value a Set-Cookie header assigns to `name`.
pub fn set_cookie_value(response: &Response<Body>, name: &str) -> Option<String> {
    let cookie = find_set_cookie(response, name)?;
    let pair = cookie.split(';').next()?;
    pair.split_once('=').map(|(_, v)| v.to_string())
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}
