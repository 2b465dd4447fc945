//! Token endpoints.
//!
//! - POST `/login/` - Exchange credentials for access/refresh cookies
//! - POST `/token/refresh/` - Exchange a refresh token (body or cookie) for a new access cookie
//! - POST `/logout/` - Expire both cookies

use axum::{
    Json, Router,
    body::Bytes,
    extract::{State, rejection::JsonRejection},
    http::HeaderMap,
    middleware,
    response::Response,
    routing::post,
};
use serde_json::{Map, Value};

use super::AuthState;
use crate::auth::relay::{
    refresh_token_from_body, relay_login, relay_refresh, teardown, with_refresh_cookie_fallback,
};
use crate::auth::{AuthError, Credentials, TokenIssuer};
use crate::rate_limit::rate_limit_login;

pub fn router<I: TokenIssuer>(state: AuthState<I>) -> Router {
    let login_router = Router::new()
        .route("/login", post(login::<I>))
        .route("/login/", post(login::<I>))
        .with_state(state.clone())
        .layer(middleware::from_fn_with_state(
            state.rate_limit_config.clone(),
            rate_limit_login,
        ));

    let session_router = Router::new()
        .route("/token/refresh", post(refresh::<I>))
        .route("/token/refresh/", post(refresh::<I>))
        .route("/logout", post(logout::<I>))
        .route("/logout/", post(logout::<I>))
        .with_state(state);

    Router::new().merge(login_router).merge(session_router)
}

async fn login<I: TokenIssuer>(
    State(state): State<AuthState<I>>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<Response, AuthError> {
    let Json(credentials) = payload?;
    let grant = state.issuer.login(&credentials).await?;
    relay_login(&state.cookies, grant)
}

/// The body is optional: cookie-only clients may post nothing at all.
async fn refresh<I: TokenIssuer>(
    State(state): State<AuthState<I>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AuthError> {
    let body = parse_optional_object(&body)?;
    let body = with_refresh_cookie_fallback(body, &headers);
    let token = refresh_token_from_body(&body)?;

    let grant = state.issuer.refresh(token).await?;
    relay_refresh(&state.cookies, grant)
}

/// No authentication required: expiring cookies that do not exist is harmless.
async fn logout<I: TokenIssuer>(State(state): State<AuthState<I>>) -> Result<Response, AuthError> {
    teardown(&state.cookies)
}

fn parse_optional_object(body: &[u8]) -> Result<Map<String, Value>, AuthError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }
    match serde_json::from_slice(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(AuthError::validation("Request body must be a JSON object")),
        Err(e) => Err(AuthError::validation(format!("Malformed JSON body: {}", e))),
    }
}
