pub mod api;
pub mod auth;
pub mod cleanup;
pub mod cli;
pub mod db;
pub mod jwt;
pub mod rate_limit;

use api::{AuthState, create_auth_router};
use auth::{CookieSettings, JwtIssuer, RotationPolicy, TokenIssuer};
use axum::Router;
use db::Database;
use jwt::JwtConfig;
use rate_limit::RateLimitConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Prefix all authentication endpoints are mounted under.
pub const AUTH_API_PATH: &str = "/api/v1/auth";

pub struct ServerConfig {
    /// Database connection (cloneable, uses connection pool internally)
    pub db: Database,
    /// JWT secret for signing tokens
    pub jwt_secret: Vec<u8>,
    /// Access token lifetime in seconds
    pub access_token_lifetime: u64,
    /// Refresh token lifetime in seconds
    pub refresh_token_lifetime: u64,
    /// Refresh token rotation behaviour
    pub rotation: RotationPolicy,
    /// Attributes of the access and refresh cookies
    pub cookies: CookieSettings,
    /// Whether new user signups are disabled
    pub no_signup: bool,
}

impl ServerConfig {
    fn jwt_config(&self) -> JwtConfig {
        JwtConfig::new(&self.jwt_secret)
            .with_lifetimes(self.access_token_lifetime, self.refresh_token_lifetime)
    }
}

/// Create the application router with the built-in JWT issuer.
pub fn create_app(config: &ServerConfig) -> Router {
    let jwt = Arc::new(config.jwt_config());
    let issuer = JwtIssuer::new(config.db.clone(), jwt, config.rotation);
    create_app_with_issuer(config, issuer)
}

/// Create the application router around any token issuer.
pub fn create_app_with_issuer<I: TokenIssuer>(config: &ServerConfig, issuer: I) -> Router {
    let state = AuthState {
        issuer: Arc::new(issuer),
        db: config.db.clone(),
        jwt: Arc::new(config.jwt_config()),
        cookies: Arc::new(config.cookies.clone()),
        no_signup: config.no_signup,
        rate_limit_config: Arc::new(RateLimitConfig::new()),
    };

    Router::new().nest(AUTH_API_PATH, create_auth_router(state))
}

/// Run cleanup tasks and spawn background scheduler.
/// Call this before starting the server.
pub async fn init_cleanup(db: &Database) {
    cleanup::run_cleanup(db).await;
    cleanup::spawn_cleanup_scheduler(db.clone());
}

/// Run the server on the given listener. This function blocks until the server exits.
/// Call `init_cleanup` before this to run cleanup on startup.
pub async fn run_server(config: ServerConfig, listener: TcpListener) -> Result<(), std::io::Error> {
    let app = create_app(&config);
    let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, make_service).await
}
