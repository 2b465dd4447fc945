//! Scheduled cleanup of the refresh token blacklist.

use crate::db::Database;
use crate::jwt::unix_now;
use std::time::Duration;
use tracing::{error, info};

/// Interval between cleanup runs.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(60 * 60); // 1 hour

/// Run all cleanup tasks once.
pub async fn run_cleanup(db: &Database) {
    let now = match unix_now() {
        Ok(now) => now,
        Err(e) => {
            error!(error = %e, "Skipping cleanup");
            return;
        }
    };

    // Blacklisted tokens past their expiry are rejected by signature validation anyway
    match db.blacklist().delete_expired(now).await {
        Ok(count) if count > 0 => info!("Cleaned up {} expired blacklist entries", count),
        Ok(_) => {}
        Err(e) => error!("Failed to clean up token blacklist: {}", e),
    }
}

/// Spawn a background task that runs cleanup periodically.
/// Returns a handle that can be used to abort the task.
pub fn spawn_cleanup_scheduler(db: Database) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CLEANUP_INTERVAL);

        loop {
            interval.tick().await;
            run_cleanup(&db).await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{NewUser, UserRole};

    #[tokio::test]
    async fn test_cleanup_removes_only_expired_entries() {
        let db = Database::open(":memory:").await.unwrap();
        let user_id = db
            .users()
            .create(&NewUser {
                username: "alice",
                email: "",
                password_hash: "hash",
                role: UserRole::User,
            })
            .await
            .unwrap();

        let now = unix_now().unwrap();
        db.blacklist().add("expired", user_id, now - 10).await.unwrap();
        db.blacklist().add("live", user_id, now + 3600).await.unwrap();

        run_cleanup(&db).await;

        assert!(!db.blacklist().contains("expired").await.unwrap());
        assert!(db.blacklist().contains("live").await.unwrap());
    }
}
