//! Blacklist of refresh tokens retired by rotation.
//!
//! Refresh tokens are stateless JWTs, so the only server-side record is the
//! `jti` of tokens that must no longer be accepted. Entries are purged once
//! the token would have expired on its own.

use sqlx::sqlite::SqlitePool;

/// Store for blacklisted refresh token IDs.
pub struct BlacklistStore {
    pool: SqlitePool,
}

impl BlacklistStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Blacklist a refresh token until `expires_at` (Unix seconds).
    /// Returns false if the `jti` was already blacklisted.
    pub async fn add(&self, jti: &str, user_id: i64, expires_at: u64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO token_blacklist (jti, user_id, expires_at) VALUES (?, ?, ?)",
        )
        .bind(jti)
        .bind(user_id)
        .bind(sql_seconds(expires_at))
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Check whether a refresh token has been blacklisted.
    pub async fn contains(&self, jti: &str) -> Result<bool, sqlx::Error> {
        let count: (i32,) = sqlx::query_as("SELECT COUNT(*) FROM token_blacklist WHERE jti = ?")
            .bind(jti)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0 > 0)
    }

    /// Delete entries whose token has expired anyway. `now` is Unix seconds.
    pub async fn delete_expired(&self, now: u64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM token_blacklist WHERE expires_at < ?")
            .bind(sql_seconds(now))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

/// SQLite integers are signed; timestamps past `i64::MAX` saturate instead of wrapping.
fn sql_seconds(secs: u64) -> i64 {
    i64::try_from(secs).unwrap_or(i64::MAX)
}
