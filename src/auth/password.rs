//! Password hashing and verification using argon2id.
//!
//! Hashing is CPU bound, so the async wrappers run it on the blocking pool.

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};

use super::errors::{AuthError, ResultExt};

/// Hash checked on logins for unknown users, so they cost the same as a wrong password.
/// Uses the default argon2id parameters; no password verifies against it.
pub const DUMMY_PASSWORD_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$cb9YqlFY3uiasqehVhnunA$brAV2BGXJWWJ0B9XqSGGfos4UQhqDTqSOwkS+K9OUAY";

/// Hash a password using argon2id with a random salt.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a stored argon2id hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed_hash = PasswordHash::new(hash)?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub async fn hash_password_blocking(password: String) -> Result<String, AuthError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .internal_err("Password hashing task failed")?
        .internal_err("Failed to hash password")
}

pub async fn verify_password_blocking(password: String, hash: String) -> Result<bool, AuthError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .internal_err("Password verification task failed")?
        .internal_err("Stored password hash is malformed")
}
