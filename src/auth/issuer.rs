//! Token issuer: turns credentials or a refresh token into signed tokens.
//!
//! The relay endpoints only depend on the [`TokenIssuer`] trait. [`JwtIssuer`]
//! is the production implementation backed by the user store and the
//! refresh token blacklist.

use std::future::Future;
use std::sync::Arc;

use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::errors::{AuthError, ResultExt};
use super::password::{DUMMY_PASSWORD_HASH, verify_password_blocking};
use crate::db::Database;
use crate::jwt::JwtConfig;

/// Username and password submitted to the login endpoint.
#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Successful login: both tokens plus any other body fields the issuer returns.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub status: StatusCode,
    pub access: String,
    pub refresh: String,
    pub extra: Map<String, Value>,
}

impl TokenPair {
    pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            access: access.into(),
            refresh: refresh.into(),
            extra: Map::new(),
        }
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// The full JSON body as the issuer would return it, tokens included.
    pub fn into_body(self) -> Map<String, Value> {
        let mut body = self.extra;
        body.insert("access".into(), Value::String(self.access));
        body.insert("refresh".into(), Value::String(self.refresh));
        body
    }
}

/// Successful refresh: a new access token, and a new refresh token when rotation is on.
#[derive(Debug, Clone)]
pub struct RefreshedTokens {
    pub status: StatusCode,
    pub access: String,
    pub refresh: Option<String>,
    pub extra: Map<String, Value>,
}

impl RefreshedTokens {
    pub fn new(access: impl Into<String>, refresh: Option<String>) -> Self {
        Self {
            status: StatusCode::OK,
            access: access.into(),
            refresh,
            extra: Map::new(),
        }
    }

    /// The full JSON body as the issuer would return it, tokens included.
    pub fn into_body(self) -> Map<String, Value> {
        let mut body = self.extra;
        body.insert("access".into(), Value::String(self.access));
        if let Some(refresh) = self.refresh {
            body.insert("refresh".into(), Value::String(refresh));
        }
        body
    }
}

/// Capability the relay endpoints compose over.
pub trait TokenIssuer: Send + Sync + 'static {
    /// Authenticate credentials and issue an access/refresh pair.
    fn login(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<TokenPair, AuthError>> + Send;

    /// Exchange a refresh token for a new access token (and maybe a rotated refresh token).
    fn refresh(
        &self,
        refresh_token: &str,
    ) -> impl Future<Output = Result<RefreshedTokens, AuthError>> + Send;
}

/// What happens to a refresh token when it is used.
#[derive(Debug, Clone, Copy, Default)]
pub struct RotationPolicy {
    /// Issue a new refresh token on every refresh
    pub rotate_refresh_tokens: bool,
    /// Blacklist the old refresh token once it has been rotated
    pub blacklist_after_rotation: bool,
}

/// Token issuer backed by the user store and signed JWTs.
#[derive(Clone)]
pub struct JwtIssuer {
    db: Database,
    jwt: Arc<JwtConfig>,
    rotation: RotationPolicy,
}

impl JwtIssuer {
    pub fn new(db: Database, jwt: Arc<JwtConfig>, rotation: RotationPolicy) -> Self {
        Self { db, jwt, rotation }
    }
}

impl TokenIssuer for JwtIssuer {
    async fn login(&self, credentials: &Credentials) -> Result<TokenPair, AuthError> {
        let username = credentials.username.trim();
        if username.is_empty() {
            return Err(AuthError::validation("username: This field may not be blank."));
        }
        if credentials.password.is_empty() {
            return Err(AuthError::validation("password: This field may not be blank."));
        }

        let Some(user) = self
            .db
            .users()
            .get_by_username(username)
            .await
            .db_err("Failed to look up user")?
        else {
            verify_password_blocking(credentials.password.clone(), DUMMY_PASSWORD_HASH.to_string())
                .await?;
            debug!(username = %username, "Login for unknown user");
            return Err(AuthError::InvalidCredentials);
        };

        let valid =
            verify_password_blocking(credentials.password.clone(), user.password_hash.clone())
                .await?;
        if !valid {
            debug!(username = %user.username, "Login with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let access = self
            .jwt
            .generate_access_token(user.id, &user.username, user.role)
            .internal_err("Failed to generate access token")?;
        let refresh = self
            .jwt
            .generate_refresh_token(user.id, &user.username, user.role)
            .internal_err("Failed to generate refresh token")?;

        let profile = serde_json::to_value(user.profile())
            .internal_err("Failed to serialize user profile")?;

        info!(username = %user.username, "Login succeeded");
        Ok(TokenPair::new(access, refresh).with_extra("user", profile))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<RefreshedTokens, AuthError> {
        let claims = self
            .jwt
            .validate_refresh_token(refresh_token)
            .map_err(|e| {
                debug!(error = %e, "Rejected refresh token");
                AuthError::InvalidOrExpiredToken
            })?;

        if self
            .db
            .blacklist()
            .contains(&claims.jti)
            .await
            .db_err("Failed to check token blacklist")?
        {
            warn!(jti = %claims.jti, "Blacklisted refresh token presented");
            return Err(AuthError::InvalidOrExpiredToken);
        }

        let user_id = claims.user_id().ok_or(AuthError::InvalidOrExpiredToken)?;
        let user = self
            .db
            .users()
            .get_by_id(user_id)
            .await
            .db_err("Failed to get user")?
            .ok_or(AuthError::InvalidOrExpiredToken)?;

        let access = self
            .jwt
            .generate_access_token(user.id, &user.username, user.role)
            .internal_err("Failed to generate access token")?;

        if !self.rotation.rotate_refresh_tokens {
            return Ok(RefreshedTokens::new(access, None));
        }

        let rotated = self
            .jwt
            .generate_refresh_token(user.id, &user.username, user.role)
            .internal_err("Failed to generate refresh token")?;

        // The old jti is claimed only once the new tokens exist. Claiming it is what
        // makes a refresh token single use: a concurrent refresh with the same token loses here.
        if self.rotation.blacklist_after_rotation {
            let claimed = self
                .db
                .blacklist()
                .add(&claims.jti, user.id, claims.exp)
                .await
                .db_err("Failed to blacklist refresh token")?;
            if !claimed {
                warn!(jti = %claims.jti, "Refresh token already rotated");
                return Err(AuthError::InvalidOrExpiredToken);
            }
        }

        debug!(username = %user.username, "Refresh token rotated");
        Ok(RefreshedTokens::new(access, Some(rotated)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::hash_password;
    use crate::db::{NewUser, UserRole};

    async fn setup(rotation: RotationPolicy) -> (JwtIssuer, Arc<JwtConfig>) {
        let db = Database::open(":memory:").await.unwrap();
        let hash = hash_password("correct-horse").unwrap();
        db.users()
            .create(&NewUser {
                username: "alice",
                email: "alice@example.com",
                password_hash: &hash,
                role: UserRole::User,
            })
            .await
            .unwrap();
        let jwt = Arc::new(JwtConfig::new(b"issuer-test-secret"));
        (JwtIssuer::new(db, jwt.clone(), rotation), jwt)
    }

    fn creds(username: &str, password: &str) -> Credentials {
        Credentials {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_login_issues_both_tokens() {
        let (issuer, jwt) = setup(RotationPolicy::default()).await;

        let pair = issuer.login(&creds("alice", "correct-horse")).await.unwrap();

        assert_eq!(pair.status, StatusCode::OK);
        assert_eq!(jwt.validate_access_token(&pair.access).unwrap().username, "alice");
        assert!(jwt.validate_refresh_token(&pair.refresh).is_ok());
        assert_eq!(pair.extra["user"]["username"], "alice");
        assert_eq!(pair.extra["user"]["role"], "USER");
    }

    #[tokio::test]
    async fn test_login_rejects_bad_credentials() {
        let (issuer, _) = setup(RotationPolicy::default()).await;

        let wrong_password = issuer.login(&creds("alice", "nope-nope")).await;
        assert!(matches!(wrong_password, Err(AuthError::InvalidCredentials)));

        let unknown_user = issuer.login(&creds("mallory", "correct-horse")).await;
        assert!(matches!(unknown_user, Err(AuthError::InvalidCredentials)));

        let blank = issuer.login(&creds("  ", "x")).await;
        assert!(matches!(blank, Err(AuthError::Validation(_))));
    }

    #[tokio::test]
    async fn test_refresh_without_rotation_returns_access_only() {
        let (issuer, _) = setup(RotationPolicy::default()).await;
        let pair = issuer.login(&creds("alice", "correct-horse")).await.unwrap();

        let refreshed = issuer.refresh(&pair.refresh).await.unwrap();
        assert!(refreshed.refresh.is_none());

        // Without rotation the same refresh token keeps working
        assert!(issuer.refresh(&pair.refresh).await.is_ok());
    }

    #[tokio::test]
    async fn test_refresh_with_rotation_and_blacklist_is_single_use() {
        let (issuer, jwt) = setup(RotationPolicy {
            rotate_refresh_tokens: true,
            blacklist_after_rotation: true,
        })
        .await;
        let pair = issuer.login(&creds("alice", "correct-horse")).await.unwrap();

        let refreshed = issuer.refresh(&pair.refresh).await.unwrap();
        let rotated = refreshed.refresh.expect("rotation should issue a refresh token");
        assert!(jwt.validate_refresh_token(&rotated).is_ok());

        let replay = issuer.refresh(&pair.refresh).await;
        assert!(matches!(replay, Err(AuthError::InvalidOrExpiredToken)));

        assert!(issuer.refresh(&rotated).await.is_ok());
    }

    #[tokio::test]
    async fn test_failed_rotation_keeps_old_refresh_token() {
        let rotation = RotationPolicy {
            rotate_refresh_tokens: true,
            blacklist_after_rotation: true,
        };
        let (issuer, _) = setup(rotation).await;
        let pair = issuer.login(&creds("alice", "correct-horse")).await.unwrap();

        // Same secret, but a refresh lifetime no token can be minted with
        let broken_jwt = JwtConfig::new(b"issuer-test-secret").with_lifetimes(300, u64::MAX);
        let broken = JwtIssuer::new(issuer.db.clone(), Arc::new(broken_jwt), rotation);

        assert!(matches!(
            broken.refresh(&pair.refresh).await,
            Err(AuthError::Internal(_))
        ));

        // The old token was not claimed, so the client can still use it
        assert!(issuer.refresh(&pair.refresh).await.is_ok());
    }

    #[tokio::test]
    async fn test_refresh_rejects_access_token_and_garbage() {
        let (issuer, _) = setup(RotationPolicy::default()).await;
        let pair = issuer.login(&creds("alice", "correct-horse")).await.unwrap();

        assert!(matches!(
            issuer.refresh(&pair.access).await,
            Err(AuthError::InvalidOrExpiredToken)
        ));
        assert!(matches!(
            issuer.refresh("garbage").await,
            Err(AuthError::InvalidOrExpiredToken)
        ));
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let debug = format!("{:?}", creds("alice", "secret-value"));
        assert!(debug.contains("alice"));
        assert!(!debug.contains("secret-value"));
    }
}
