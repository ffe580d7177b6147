//! Feed entry persistence.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use super::{format_timestamp, parse_datetime};
use crate::{AppError, Result};

/// Upper bound on ids bound into a single DELETE statement.
const DELETE_CHUNK_SIZE: usize = 500;

/// A feed item tracked by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    /// Stable identifier derived from the feed item.
    pub id: String,
    /// Serialized feed item, stored verbatim.
    pub entry_data: Vec<u8>,
    /// When the entry was posted, `None` while it is in the backlog.
    pub posted_at: Option<DateTime<Utc>>,
    /// When the entry was first fetched.
    pub fetched_at: DateTime<Utc>,
    /// Row creation time.
    pub created_at: DateTime<Utc>,
}

impl Entry {
    /// Whether the entry has been posted (or caught up).
    pub fn is_posted(&self) -> bool {
        self.posted_at.is_some()
    }
}

/// Entry counts taken in one read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntryStats {
    pub total: i64,
    pub posted: i64,
    pub unposted: i64,
}

/// Row type for entries from the database.
#[derive(Debug, Clone, sqlx::FromRow)]
struct EntryRow {
    id: String,
    entry_data: Vec<u8>,
    posted_at: Option<String>,
    fetched_at: String,
    created_at: String,
}

impl From<EntryRow> for Entry {
    fn from(row: EntryRow) -> Self {
        Entry {
            id: row.id,
            entry_data: row.entry_data,
            posted_at: row.posted_at.and_then(|s| parse_datetime(&s)),
            fetched_at: parse_datetime(&row.fetched_at).unwrap_or_else(Utc::now),
            created_at: parse_datetime(&row.created_at).unwrap_or_else(Utc::now),
        }
    }
}

/// Repository for entry operations.
pub struct EntryRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> EntryRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert an entry into the backlog.
    ///
    /// Saving a known id is a successful no-op: the existing row keeps its
    /// `fetched_at` and `posted_at`. Returns whether a row was inserted.
    pub async fn save(&self, id: &str, entry_data: &[u8]) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO entries (id, entry_data, fetched_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(id)
        .bind(entry_data)
        .bind(format_timestamp(Utc::now()))
        .execute(self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        let inserted = result.rows_affected() > 0;
        if !inserted {
            debug!(entry_id = %id, "Entry already known");
        }
        Ok(inserted)
    }

    /// Get an entry by id.
    pub async fn get(&self, id: &str) -> Result<Option<Entry>> {
        let row = sqlx::query_as::<_, EntryRow>(
            r#"
            SELECT id, entry_data, posted_at, fetched_at, created_at
            FROM entries
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(row.map(Entry::from))
    }

    /// List backlog entries, oldest fetched first.
    ///
    /// A `limit` of zero or less returns the whole backlog.
    pub async fn list_unposted(&self, limit: i64) -> Result<Vec<Entry>> {
        let mut query = QueryBuilder::<Sqlite>::new(
            r#"
            SELECT id, entry_data, posted_at, fetched_at, created_at
            FROM entries
            WHERE posted_at IS NULL
            ORDER BY fetched_at ASC, rowid ASC
            "#,
        );
        if limit > 0 {
            query.push(" LIMIT ").push_bind(limit);
        }

        let rows = query
            .build_query_as::<EntryRow>()
            .fetch_all(self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(Entry::from).collect())
    }

    /// Mark an entry as posted now.
    ///
    /// Only a backlog entry is changed; an already-posted entry keeps its
    /// original timestamp and `false` is returned. An unknown id is
    /// [`AppError::NotFound`].
    pub async fn mark_posted(&self, id: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE entries SET posted_at = ?
            WHERE id = ? AND posted_at IS NULL
            "#,
        )
        .bind(format_timestamp(Utc::now()))
        .bind(id)
        .execute(self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }

        if self.exists(id).await? {
            debug!(entry_id = %id, "Entry was already posted");
            Ok(false)
        } else {
            Err(AppError::NotFound(format!("entry {id}")))
        }
    }

    /// Mark the whole backlog as posted without dispatching anything.
    ///
    /// Returns the number of entries marked.
    pub async fn mark_all_posted(&self) -> Result<u64> {
        let result = sqlx::query("UPDATE entries SET posted_at = ? WHERE posted_at IS NULL")
            .bind(format_timestamp(Utc::now()))
            .execute(self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected())
    }

    /// Count total, posted and unposted entries in a single statement.
    pub async fn stats(&self) -> Result<EntryStats> {
        let (total, posted, unposted): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*),
                COALESCE(SUM(CASE WHEN posted_at IS NOT NULL THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN posted_at IS NULL THEN 1 ELSE 0 END), 0)
            FROM entries
            "#,
        )
        .fetch_one(self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(EntryStats {
            total,
            posted,
            unposted,
        })
    }

    /// Most recent fetch time, `None` for an empty store.
    pub async fn last_fetch_time(&self) -> Result<Option<DateTime<Utc>>> {
        let value: Option<String> = sqlx::query_scalar("SELECT MAX(fetched_at) FROM entries")
            .fetch_one(self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(value.and_then(|s| parse_datetime(&s)))
    }

    /// Most recent post time, `None` when nothing has been posted.
    pub async fn last_post_time(&self) -> Result<Option<DateTime<Utc>>> {
        let value: Option<String> = sqlx::query_scalar(
            "SELECT MAX(posted_at) FROM entries WHERE posted_at IS NOT NULL",
        )
        .fetch_one(self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(value.and_then(|s| parse_datetime(&s)))
    }

    /// All known entry ids.
    pub async fn all_ids(&self) -> Result<HashSet<String>> {
        let ids: Vec<String> = sqlx::query_scalar("SELECT id FROM entries")
            .fetch_all(self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(ids.into_iter().collect())
    }

    /// Delete the given entries in one transaction.
    ///
    /// Ids that are already gone are skipped. Returns how many rows were
    /// removed.
    pub async fn delete_many<S: AsRef<str>>(&self, ids: &[S]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut deleted = 0;
        for chunk in ids.chunks(DELETE_CHUNK_SIZE) {
            let mut query = QueryBuilder::<Sqlite>::new("DELETE FROM entries WHERE id IN (");
            let mut separated = query.separated(", ");
            for id in chunk {
                separated.push_bind(id.as_ref());
            }
            separated.push_unseparated(")");

            let result = query
                .build()
                .execute(&mut *tx)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            deleted += result.rows_affected();
        }

        tx.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(deleted)
    }

    async fn exists(&self, id: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM entries WHERE id = ?)")
            .bind(id)
            .fetch_one(self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(exists)
    }
}
