//! CLI argument parsing, validation, and startup helpers.

use crate::ServerConfig;
use crate::auth::{CookieSettings, DEFAULT_ACCESS_COOKIE_NAME, RotationPolicy, SameSite};
use crate::db::Database;
use crate::jwt::{
    DEFAULT_ACCESS_TOKEN_LIFETIME_SECS, DEFAULT_REFRESH_TOKEN_LIFETIME_SECS, MAX_TOKEN_LIFETIME_SECS,
};
use clap::Parser;
use tracing::{error, info, warn};

const MIN_JWT_SECRET_LENGTH: usize = 32;

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "taskgate",
    about = "Task list auth API with cookie-based JWT sessions"
)]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "8000")]
    pub port: u16,

    /// Path to SQLite database file
    #[arg(short, long, env = "DATABASE", default_value = "taskgate.db")]
    pub database: String,

    /// Path to file containing JWT secret. Prefer using JWT_SECRET env var instead
    #[arg(long)]
    pub jwt_secret_file: Option<String>,

    /// Access token lifetime in seconds
    #[arg(long, env = "ACCESS_TOKEN_LIFETIME", default_value_t = DEFAULT_ACCESS_TOKEN_LIFETIME_SECS)]
    pub access_token_lifetime: u64,

    /// Refresh token lifetime in seconds
    #[arg(long, env = "REFRESH_TOKEN_LIFETIME", default_value_t = DEFAULT_REFRESH_TOKEN_LIFETIME_SECS)]
    pub refresh_token_lifetime: u64,

    /// Issue a new refresh token on every refresh
    #[arg(long, env = "ROTATE_REFRESH_TOKENS")]
    pub rotate_refresh_tokens: bool,

    /// Reject a refresh token once it has been rotated
    #[arg(long, env = "BLACKLIST_AFTER_ROTATION")]
    pub blacklist_after_rotation: bool,

    /// Cookie name for the access token
    #[arg(long, env = "AUTH_COOKIE", default_value = DEFAULT_ACCESS_COOKIE_NAME)]
    pub access_cookie_name: String,

    /// HttpOnly flag for the access cookie (the refresh cookie is always HttpOnly)
    #[arg(long, env = "AUTH_COOKIE_HTTP_ONLY", default_value_t = true, action = clap::ArgAction::Set)]
    pub cookie_http_only: bool,

    /// SameSite attribute for both cookies
    #[arg(long, env = "AUTH_COOKIE_SAMESITE", value_enum, ignore_case = true, default_value = "lax")]
    pub cookie_samesite: SameSite,

    /// Secure flag for both cookies (should be set in production with HTTPS)
    #[arg(long, env = "AUTH_COOKIE_SECURE")]
    pub cookie_secure: bool,

    /// Disable new user signups
    #[arg(long)]
    pub no_signup: bool,

    /// Log output format
    #[arg(short, long, default_value = "pretty")]
    pub log_format: LogFormat,
}

/// Initialize logging based on the specified format.
pub fn init_logging(format: &LogFormat) {
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt::init(),
        LogFormat::Json => tracing_subscriber::fmt().json().init(),
        LogFormat::Compact => tracing_subscriber::fmt().compact().init(),
    }
}

/// Load JWT secret from environment variable or file.
/// Returns None and logs an error if the secret cannot be loaded.
pub fn load_jwt_secret(jwt_secret_file: Option<&str>) -> Option<String> {
    let secret = if let Ok(secret) = std::env::var("JWT_SECRET") {
        // Clear the environment variable to prevent leaking
        // SAFETY: We're single-threaded at this point during startup,
        // and no other code is reading this environment variable.
        unsafe { std::env::remove_var("JWT_SECRET") };
        secret
    } else if let Some(path) = jwt_secret_file {
        match std::fs::read_to_string(path) {
            Ok(content) => content.trim().to_string(),
            Err(e) => {
                error!(path = %path, error = %e, "Failed to read JWT secret file");
                return None;
            }
        }
    } else {
        error!(
            "JWT secret is required. Set JWT_SECRET environment variable (recommended) or use --jwt-secret-file"
        );
        return None;
    };

    if secret.len() < MIN_JWT_SECRET_LENGTH {
        error!(
            "JWT secret is shorter than {} characters. Use a longer secret",
            MIN_JWT_SECRET_LENGTH
        );
        return None;
    }

    Some(secret)
}

/// Cookie attributes from the command line, with `Max-Age` matching the token lifetimes.
pub fn cookie_settings(args: &Args) -> CookieSettings {
    CookieSettings {
        access_cookie_name: args.access_cookie_name.clone(),
        http_only: args.cookie_http_only,
        same_site: args.cookie_samesite,
        secure: args.cookie_secure,
        access_max_age: Some(args.access_token_lifetime),
        refresh_max_age: Some(args.refresh_token_lifetime),
    }
}

/// Build ServerConfig from validated arguments.
/// Returns None and logs an error if the arguments are inconsistent.
pub fn build_config(args: &Args, db: Database, jwt_secret: String) -> Option<ServerConfig> {
    if args.access_token_lifetime == 0 || args.refresh_token_lifetime == 0 {
        error!("Token lifetimes must be greater than zero");
        return None;
    }

    if args.access_token_lifetime > MAX_TOKEN_LIFETIME_SECS
        || args.refresh_token_lifetime > MAX_TOKEN_LIFETIME_SECS
    {
        error!(
            "Token lifetimes must not exceed {} seconds",
            MAX_TOKEN_LIFETIME_SECS
        );
        return None;
    }

    let cookies = cookie_settings(args);
    if let Err(e) = cookies.validate() {
        error!(error = %e, "Invalid cookie configuration");
        return None;
    }

    if cookies.same_site == SameSite::None && !cookies.secure {
        warn!("SameSite=None without --cookie-secure: browsers will reject the cookies");
    }

    if args.blacklist_after_rotation && !args.rotate_refresh_tokens {
        warn!("--blacklist-after-rotation has no effect without --rotate-refresh-tokens");
    }

    Some(ServerConfig {
        db,
        jwt_secret: jwt_secret.into_bytes(),
        access_token_lifetime: args.access_token_lifetime,
        refresh_token_lifetime: args.refresh_token_lifetime,
        rotation: RotationPolicy {
            rotate_refresh_tokens: args.rotate_refresh_tokens,
            blacklist_after_rotation: args.blacklist_after_rotation,
        },
        cookies,
        no_signup: args.no_signup,
    })
}

/// Open the database, logging errors if it fails.
pub async fn open_database(path: &str) -> Option<Database> {
    match Database::open(path).await {
        Ok(db) => {
            info!(path = %path, "Database opened");
            Some(db)
        }
        Err(e) => {
            error!(path = %path, error = %e, "Failed to open database");
            None
        }
    }
}
