//! User endpoints.
//!
//! - POST `/register/` - Create an account (absent when signups are disabled)
//! - GET `/me/` - Profile of the caller, resolved from the access token

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use tracing::info;

use super::AuthState;
use crate::auth::password::hash_password_blocking;
use crate::auth::{Auth, AuthError, ResultExt, TokenIssuer};
use crate::db::{NewUser, UserProfile, UserRole};

const MAX_USERNAME_LEN: usize = 150;
const MIN_PASSWORD_LEN: usize = 8;

pub fn router<I: TokenIssuer>(state: AuthState<I>) -> Router {
    let me_router = Router::new()
        .route("/me", get(me))
        .route("/me/", get(me))
        .with_state(state.clone());

    if state.no_signup {
        me_router
    } else {
        let register_router = Router::new()
            .route("/register", post(register::<I>))
            .route("/register/", post(register::<I>))
            .with_state(state);

        Router::new().merge(me_router).merge(register_router)
    }
}

#[derive(Deserialize)]
struct RegisterRequest {
    username: String,
    #[serde(default)]
    email: String,
    password: String,
}

fn validate_registration(req: &RegisterRequest) -> Result<(), AuthError> {
    let username = req.username.trim();

    if username.is_empty() {
        return Err(AuthError::validation("username: This field may not be blank."));
    }

    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(AuthError::validation(format!(
            "username: Ensure this field has no more than {} characters.",
            MAX_USERNAME_LEN
        )));
    }

    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        return Err(AuthError::validation(
            "username: Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        ));
    }

    let email = req.email.trim();
    if !email.is_empty() && !email.contains('@') {
        return Err(AuthError::validation("email: Enter a valid email address."));
    }

    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::validation(format!(
            "password: Ensure this field has at least {} characters.",
            MIN_PASSWORD_LEN
        )));
    }

    Ok(())
}

/// Self-registration always creates a `USER`.
async fn register<I: TokenIssuer>(
    State(state): State<AuthState<I>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AuthError> {
    let Json(payload) = payload?;
    validate_registration(&payload)?;
    let username = payload.username.trim();
    let email = payload.email.trim();

    let available = state
        .db
        .users()
        .is_username_available(username)
        .await
        .db_err("Failed to check username availability")?;

    if !available {
        return Err(AuthError::conflict(
            "username: A user with that username already exists.",
        ));
    }

    let password_hash = hash_password_blocking(payload.password.clone()).await?;

    // The availability check can race with another signup; the UNIQUE constraint decides.
    let id = state
        .db
        .users()
        .create(&NewUser {
            username,
            email,
            password_hash: &password_hash,
            role: UserRole::User,
        })
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => AuthError::conflict(
                "username: A user with that username already exists.",
            ),
            e => AuthError::internal("Failed to create user", e),
        })?;

    info!(username = %username, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(UserProfile {
            id,
            username: username.to_string(),
            email: email.to_string(),
            role: UserRole::User,
        }),
    ))
}

async fn me(Auth(user): Auth) -> Json<UserProfile> {
    Json(user.profile())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(username: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_valid_registration() {
        assert!(validate_registration(&request("alice", "alice@example.com", "long-enough")).is_ok());
        assert!(validate_registration(&request("a.b+c-d_e@f", "", "long-enough")).is_ok());
    }

    #[test]
    fn test_invalid_registrations() {
        assert!(validate_registration(&request("", "a@b.c", "long-enough")).is_err());
        assert!(validate_registration(&request("has space", "a@b.c", "long-enough")).is_err());
        assert!(validate_registration(&request("alice", "not-an-email", "long-enough")).is_err());
        assert!(validate_registration(&request("alice", "a@b.c", "short")).is_err());
        assert!(validate_registration(&request(&"x".repeat(151), "a@b.c", "long-enough")).is_err());
    }
}
