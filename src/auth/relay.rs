//! Moves issued tokens between JSON bodies and HttpOnly cookies.
//!
//! On success the tokens are written to cookies and removed from the body.
//! Failures never reach this module: the issuer's error is returned as is.

use axum::{
    Json,
    http::{HeaderMap, HeaderValue, StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value};

use super::cookie::{CookieSettings, REFRESH_COOKIE_NAME, get_cookie};
use super::errors::{AuthError, ResultExt};
use super::issuer::{RefreshedTokens, TokenPair};

/// Body fields that must never reach the client.
pub const TOKEN_FIELDS: [&str; 2] = ["access", "refresh"];

/// Body field carrying the refresh token on the refresh endpoint.
pub const REFRESH_FIELD: &str = "refresh";

/// Build a new body without the token fields. Every other field is kept as is.
pub fn strip_token_fields(body: Map<String, Value>) -> Map<String, Value> {
    body.into_iter()
        .filter(|(key, _)| !TOKEN_FIELDS.contains(&key.as_str()))
        .collect()
}

/// Response for a successful login: both tokens as cookies, neither in the body.
pub fn relay_login(cookies: &CookieSettings, grant: TokenPair) -> Result<Response, AuthError> {
    let set_cookies = [
        cookies.access_cookie(&grant.access),
        cookies.refresh_cookie(&grant.refresh),
    ];
    let status = grant.status;
    let body = strip_token_fields(grant.into_body());
    with_cookies(status, body, &set_cookies)
}

/// Response for a successful refresh. The refresh cookie is only rewritten when the
/// issuer rotated the token; otherwise the client's existing cookie stays valid.
pub fn relay_refresh(
    cookies: &CookieSettings,
    grant: RefreshedTokens,
) -> Result<Response, AuthError> {
    let mut set_cookies = vec![cookies.access_cookie(&grant.access)];
    if let Some(refresh) = &grant.refresh {
        set_cookies.push(cookies.refresh_cookie(refresh));
    }
    let status = grant.status;
    let body = strip_token_fields(grant.into_body());
    with_cookies(status, body, &set_cookies)
}

/// Response that ends the session by expiring both cookies.
/// Does not depend on the request, so repeated calls behave the same.
pub fn teardown(cookies: &CookieSettings) -> Result<Response, AuthError> {
    let mut body = Map::new();
    body.insert("message".into(), Value::from("Logout successful"));
    with_cookies(
        StatusCode::OK,
        body,
        &[cookies.clear_access_cookie(), cookies.clear_refresh_cookie()],
    )
}

/// Fill in the `refresh` body field from the refresh cookie.
/// A field the client sent explicitly always wins over the cookie.
pub fn with_refresh_cookie_fallback(
    mut body: Map<String, Value>,
    headers: &HeaderMap,
) -> Map<String, Value> {
    if !body.contains_key(REFRESH_FIELD) {
        if let Some(cookie) = get_cookie(headers, REFRESH_COOKIE_NAME) {
            body.insert(REFRESH_FIELD.into(), Value::String(cookie.to_string()));
        }
    }
    body
}

/// Read the refresh token the issuer should receive.
pub fn refresh_token_from_body(body: &Map<String, Value>) -> Result<&str, AuthError> {
    match body.get(REFRESH_FIELD) {
        None | Some(Value::Null) => Err(AuthError::validation(
            "refresh: This field is required.",
        )),
        Some(Value::String(token)) if token.is_empty() => Err(AuthError::validation(
            "refresh: This field may not be blank.",
        )),
        Some(Value::String(token)) => Ok(token.as_str()),
        Some(_) => Err(AuthError::validation("refresh: Not a valid string.")),
    }
}

fn with_cookies(
    status: StatusCode,
    body: Map<String, Value>,
    set_cookies: &[String],
) -> Result<Response, AuthError> {
    let mut response = (status, Json(Value::Object(body))).into_response();
    let headers = response.headers_mut();
    for cookie in set_cookies {
        let value = HeaderValue::from_str(cookie).internal_err("Invalid Set-Cookie value")?;
        headers.append(SET_COOKIE, value);
    }
    Ok(response)
}
