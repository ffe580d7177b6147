//! Key/value settings stored beside the entries.

use sqlx::SqlitePool;

use crate::{AppError, Result};

/// Settings key holding the last fetched feed's metadata as JSON.
pub const FEED_METADATA_KEY: &str = "feed_metadata";

/// Settings key holding the access token obtained with the `code` command.
pub const ACCESS_TOKEN_KEY: &str = "mastodon_access_token";

/// Repository for settings operations.
pub struct SettingRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> SettingRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Read a setting.
    ///
    /// A missing row and a stored NULL both read as `None`.
    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let value: Option<Option<String>> =
            sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
                .bind(key)
                .fetch_optional(self.pool)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(value.flatten())
    }

    /// Insert or replace a setting.
    pub async fn set(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO settings (key, value, updated_at)
            VALUES (?, ?, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    #[tokio::test]
    async fn test_get_missing() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = SettingRepository::new(db.pool());
        assert_eq!(repo.get("nothing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = SettingRepository::new(db.pool());

        repo.set(ACCESS_TOKEN_KEY, "abc").await.unwrap();
        assert_eq!(
            repo.get(ACCESS_TOKEN_KEY).await.unwrap(),
            Some("abc".to_string())
        );
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = SettingRepository::new(db.pool());

        repo.set(FEED_METADATA_KEY, "{\"title\":\"old\"}")
            .await
            .unwrap();
        repo.set(FEED_METADATA_KEY, "{\"title\":\"new\"}")
            .await
            .unwrap();

        assert_eq!(
            repo.get(FEED_METADATA_KEY).await.unwrap().as_deref(),
            Some("{\"title\":\"new\"}")
        );

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM settings")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[tokio::test]
    async fn test_null_value_reads_as_none() {
        let db = Database::open_in_memory().await.unwrap();
        sqlx::query("INSERT INTO settings (key, value) VALUES ('empty', NULL)")
            .execute(db.pool())
            .await
            .unwrap();

        let repo = SettingRepository::new(db.pool());
        assert_eq!(repo.get("empty").await.unwrap(), None);
    }
}
