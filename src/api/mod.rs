mod tokens;
mod users;

use axum::Router;
use std::sync::Arc;

use crate::auth::{CookieSettings, HasAuthBackend, TokenIssuer};
use crate::db::Database;
use crate::jwt::JwtConfig;
use crate::rate_limit::RateLimitConfig;

/// State shared by the authentication endpoints.
pub struct AuthState<I> {
    pub issuer: Arc<I>,
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
    pub cookies: Arc<CookieSettings>,
    pub no_signup: bool,
    pub rate_limit_config: Arc<RateLimitConfig>,
}

// Manual impl: deriving would require `I: Clone`.
impl<I> Clone for AuthState<I> {
    fn clone(&self) -> Self {
        Self {
            issuer: self.issuer.clone(),
            db: self.db.clone(),
            jwt: self.jwt.clone(),
            cookies: self.cookies.clone(),
            no_signup: self.no_signup,
            rate_limit_config: self.rate_limit_config.clone(),
        }
    }
}

impl<I> HasAuthBackend for AuthState<I> {
    fn jwt(&self) -> &JwtConfig {
        &self.jwt
    }

    fn db(&self) -> &Database {
        &self.db
    }

    fn cookies(&self) -> &CookieSettings {
        &self.cookies
    }
}

/// Create the authentication router (login, refresh, logout, register, me).
pub fn create_auth_router<I: TokenIssuer>(state: AuthState<I>) -> Router {
    Router::new()
        .merge(tokens::router(state.clone()))
        .merge(users::router(state))
}
