//! JWT token generation and validation.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::db::UserRole;

/// Token type for distinguishing access vs refresh tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    /// Short-lived access token - stateless, no JTI
    Access,
    /// Long-lived refresh token - carries a JTI so it can be blacklisted
    Refresh,
}

/// JWT claims for access tokens (stateless, no JTI).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject (user id)
    pub sub: String,
    /// Username
    pub username: String,
    /// User role
    pub role: UserRole,
    /// Token type
    #[serde(rename = "typ")]
    pub token_type: TokenType,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

impl AccessClaims {
    /// The user id carried in `sub`, if it is a valid integer.
    pub fn user_id(&self) -> Option<i64> {
        self.sub.parse().ok()
    }
}

/// JWT claims for refresh tokens (tracked with JTI).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    /// JWT ID (unique identifier for blacklisting)
    pub jti: String,
    /// Subject (user id)
    pub sub: String,
    /// Username
    pub username: String,
    /// User role
    pub role: UserRole,
    /// Token type
    #[serde(rename = "typ")]
    pub token_type: TokenType,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

impl RefreshClaims {
    pub fn user_id(&self) -> Option<i64> {
        self.sub.parse().ok()
    }
}

/// Default access token lifetime: 5 minutes
pub const DEFAULT_ACCESS_TOKEN_LIFETIME_SECS: u64 = 5 * 60;

/// Default refresh token lifetime: 1 day
pub const DEFAULT_REFRESH_TOKEN_LIFETIME_SECS: u64 = 24 * 60 * 60;

/// Longest accepted token lifetime: 10 years
pub const MAX_TOKEN_LIFETIME_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// Configuration for JWT operations.
#[derive(Clone)]
pub struct JwtConfig {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_lifetime: u64,
    refresh_lifetime: u64,
}

impl JwtConfig {
    /// Create a new JWT configuration with the given secret and default lifetimes.
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            access_lifetime: DEFAULT_ACCESS_TOKEN_LIFETIME_SECS,
            refresh_lifetime: DEFAULT_REFRESH_TOKEN_LIFETIME_SECS,
        }
    }

    /// Override token lifetimes (seconds).
    pub fn with_lifetimes(mut self, access_secs: u64, refresh_secs: u64) -> Self {
        self.access_lifetime = access_secs;
        self.refresh_lifetime = refresh_secs;
        self
    }

    /// Generate an access token for a user.
    pub fn generate_access_token(
        &self,
        user_id: i64,
        username: &str,
        role: UserRole,
    ) -> Result<String, JwtError> {
        let now = unix_now()?;

        let claims = AccessClaims {
            sub: user_id.to_string(),
            username: username.to_string(),
            role,
            token_type: TokenType::Access,
            iat: now,
            exp: expiry(now, self.access_lifetime)?,
        };

        jsonwebtoken::encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(JwtError::Encoding)
    }

    /// Generate a refresh token for a user.
    /// Each refresh token gets a fresh JTI.
    pub fn generate_refresh_token(
        &self,
        user_id: i64,
        username: &str,
        role: UserRole,
    ) -> Result<String, JwtError> {
        let now = unix_now()?;

        let claims = RefreshClaims {
            jti: uuid::Uuid::new_v4().to_string(),
            sub: user_id.to_string(),
            username: username.to_string(),
            role,
            token_type: TokenType::Refresh,
            iat: now,
            exp: expiry(now, self.refresh_lifetime)?,
        };

        jsonwebtoken::encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(JwtError::Encoding)
    }

    /// Validate and decode an access token.
    pub fn validate_access_token(&self, token: &str) -> Result<AccessClaims, JwtError> {
        let token_data =
            jsonwebtoken::decode::<AccessClaims>(token, &self.decoding_key, &strict_validation())
                .map_err(JwtError::Decoding)?;

        if token_data.claims.token_type != TokenType::Access {
            return Err(JwtError::WrongTokenType);
        }

        Ok(token_data.claims)
    }

    /// Validate and decode a refresh token.
    pub fn validate_refresh_token(&self, token: &str) -> Result<RefreshClaims, JwtError> {
        let token_data =
            jsonwebtoken::decode::<RefreshClaims>(token, &self.decoding_key, &strict_validation())
                .map_err(JwtError::Decoding)?;

        if token_data.claims.token_type != TokenType::Refresh {
            return Err(JwtError::WrongTokenType);
        }

        Ok(token_data.claims)
    }
}

fn strict_validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation
}

fn expiry(now: u64, lifetime: u64) -> Result<u64, JwtError> {
    if lifetime > MAX_TOKEN_LIFETIME_SECS {
        return Err(JwtError::LifetimeTooLong(lifetime));
    }
    now.checked_add(lifetime)
        .ok_or(JwtError::LifetimeTooLong(lifetime))
}

/// Current Unix time in seconds.
pub fn unix_now() -> Result<u64, JwtError> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|_| JwtError::TimeError)?
        .as_secs())
}

/// Errors that can occur during JWT operations.
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("Failed to encode token: {0}")]
    Encoding(jsonwebtoken::errors::Error),
    #[error("Failed to decode token: {0}")]
    Decoding(jsonwebtoken::errors::Error),
    #[error("System time error")]
    TimeError,
    /// Using a refresh token as an access token or vice versa
    #[error("Wrong token type")]
    WrongTokenType,
    #[error("Token lifetime of {0} seconds is too long")]
    LifetimeTooLong(u64),
}
