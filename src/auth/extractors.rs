//! Axum extractors for authentication.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use tracing::debug;

use super::cookie::get_cookie;
use super::errors::{AuthError, ResultExt};
use super::state::HasAuthBackend;
use crate::db::User;

/// Access token from `Authorization: Bearer`, falling back to the access cookie.
fn access_token<'a>(parts: &'a Parts, cookie_name: &str) -> Option<&'a str> {
    if let Some(value) = parts.headers.get(header::AUTHORIZATION) {
        // A present header is authoritative, even when it is malformed.
        return value
            .to_str()
            .ok()
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty());
    }
    get_cookie(&parts.headers, cookie_name).filter(|t| !t.is_empty())
}

async fn authenticate_request<S>(parts: &Parts, state: &S) -> Result<User, AuthError>
where
    S: HasAuthBackend + Send + Sync,
{
    let token = access_token(parts, &state.cookies().access_cookie_name)
        .ok_or(AuthError::Unauthenticated)?;

    let claims = state.jwt().validate_access_token(token).map_err(|e| {
        debug!(error = %e, "Rejected access token");
        AuthError::Unauthenticated
    })?;

    let user_id = claims.user_id().ok_or(AuthError::Unauthenticated)?;
    state
        .db()
        .users()
        .get_by_id(user_id)
        .await
        .db_err("Failed to get user")?
        .ok_or(AuthError::Unauthenticated)
}

/// Extractor for endpoints that require a valid access token.
/// Yields the user re-read from the database. Rejects with
/// `AuthError::Unauthenticated` and leaves cookies untouched.
pub struct Auth(pub User);

impl<S> FromRequestParts<S> for Auth
where
    S: HasAuthBackend + Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        authenticate_request(parts, state).await.map(Auth)
    }
}
