//! Authentication error types.
//!
//! Errors pass through to the client unchanged: they never set or clear cookies.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

/// Error returned by the token issuer and the relay endpoints.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("No active account found with the given credentials")]
    InvalidCredentials,
    #[error("Token is invalid or expired")]
    InvalidOrExpiredToken,
    #[error("Authentication credentials were not provided or are invalid")]
    Unauthenticated,
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Too many requests. Please try again later.")]
    RateLimited,
    #[error("Unable to determine client IP.")]
    ClientIpUnavailable,
    #[error("{0}")]
    Internal(String),
}

impl AuthError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Log the underlying cause and collapse it into a generic 500.
    pub fn internal(context: &str, e: impl std::fmt::Display) -> Self {
        error!(error = %e, "{}", context);
        Self::Internal("Internal server error".into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InvalidCredentials
            | AuthError::InvalidOrExpiredToken
            | AuthError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AuthError::Validation(_) => StatusCode::BAD_REQUEST,
            AuthError::Conflict(_) => StatusCode::CONFLICT,
            AuthError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AuthError::ClientIpUnavailable => StatusCode::FORBIDDEN,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code for clients.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::InvalidOrExpiredToken => "token_not_valid",
            AuthError::Unauthenticated => "not_authenticated",
            AuthError::Validation(_) => "invalid",
            AuthError::Conflict(_) => "conflict",
            AuthError::RateLimited => "throttled",
            AuthError::ClientIpUnavailable => "permission_denied",
            AuthError::Internal(_) => "internal_error",
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: &'static str,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();
        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
                code,
            }),
        )
            .into_response()
    }
}

/// Malformed, mistyped or incomplete JSON bodies are validation errors.
impl From<JsonRejection> for AuthError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

/// Extension trait for concise error mapping on Results.
pub trait ResultExt<T> {
    fn db_err(self, msg: &str) -> Result<T, AuthError>;
    fn internal_err(self, msg: &str) -> Result<T, AuthError>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for Result<T, E> {
    fn db_err(self, msg: &str) -> Result<T, AuthError> {
        self.map_err(|e| {
            error!(error = %e, "{}", msg);
            AuthError::Internal("Database error".into())
        })
    }

    fn internal_err(self, msg: &str) -> Result<T, AuthError> {
        self.map_err(|e| AuthError::internal(msg, e))
    }
}
