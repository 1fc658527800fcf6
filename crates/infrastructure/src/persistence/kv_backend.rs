//! SQLite key-value backend
//!
//! Implements the `KvBackendPort` over the `kv_records` table. The backend
//! is entirely honest; all corruption happens in the store layered above it.

use application::error::ApplicationError;
use application::ports::{KvBackendPort, RecordStream};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::Record;
use futures::TryStreamExt;
use sqlx::SqlitePool;
use tracing::{debug, instrument};

use super::async_connection::AsyncDatabase;
use super::error::map_sqlx_error;

/// Rows fetched per page by the ordered scan
const SCAN_PAGE_SIZE: i64 = 64;

type RecordRow = (String, String, DateTime<Utc>, DateTime<Utc>);

/// sqlx-backed key-value table adapter
#[derive(Debug, Clone)]
pub struct SqlxKvBackend {
    pool: SqlitePool,
}

impl SqlxKvBackend {
    /// Create a backend over the given database
    #[must_use]
    pub fn new(db: &AsyncDatabase) -> Self {
        Self {
            pool: db.pool().clone(),
        }
    }
}

fn row_to_record(row: RecordRow) -> Record {
    let (key, value, created_at, updated_at) = row;
    Record {
        key,
        value,
        created_at,
        updated_at,
    }
}

#[async_trait]
impl KvBackendPort for SqlxKvBackend {
    #[instrument(skip(self, value))]
    async fn upsert(&self, key: &str, value: &str) -> Result<(), ApplicationError> {
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO kv_records (key, value, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?3)
             ON CONFLICT (key)
             DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(value)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        debug!(key, "upserted record");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn lookup(&self, key: &str) -> Result<Record, ApplicationError> {
        let row: Option<RecordRow> = sqlx::query_as(
            "SELECT key, value, created_at, updated_at FROM kv_records WHERE key = ?1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(row_to_record)
            .ok_or_else(|| ApplicationError::key_not_found(key))
    }

    #[instrument(skip(self))]
    async fn delete_by_key(&self, key: &str) -> Result<(), ApplicationError> {
        let result = sqlx::query("DELETE FROM kv_records WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        // Deleting an absent key is a no-op success
        debug!(key, deleted = result.rows_affected() > 0, "deleted record");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn sample_random_key(&self) -> Result<String, ApplicationError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT key FROM kv_records ORDER BY RANDOM() LIMIT 1")
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        row.map(|(key,)| key)
            .ok_or_else(|| ApplicationError::NotFound("store is empty".to_string()))
    }

    /// Keyset-paginated scan, ordered by key ascending
    ///
    /// Lazy in pages: the next page is only fetched once the previous one has
    /// been consumed. Each call starts a fresh scan of current state.
    fn scan_all(&self) -> RecordStream {
        let pool = self.pool.clone();

        let pages = futures::stream::try_unfold(
            (pool, None::<String>),
            |(pool, after)| async move {
                let rows: Vec<RecordRow> = match &after {
                    Some(last_key) => {
                        sqlx::query_as(
                            "SELECT key, value, created_at, updated_at FROM kv_records
                             WHERE key > ?1 ORDER BY key ASC LIMIT ?2",
                        )
                        .bind(last_key)
                        .bind(SCAN_PAGE_SIZE)
                        .fetch_all(&pool)
                        .await
                    },
                    None => {
                        sqlx::query_as(
                            "SELECT key, value, created_at, updated_at FROM kv_records
                             ORDER BY key ASC LIMIT ?1",
                        )
                        .bind(SCAN_PAGE_SIZE)
                        .fetch_all(&pool)
                        .await
                    },
                }
                .map_err(map_sqlx_error)?;

                if rows.is_empty() {
                    return Ok(None);
                }

                let next_after = rows.last().map(|row| row.0.clone());
                let page = futures::stream::iter(
                    rows.into_iter()
                        .map(|row| Ok::<_, ApplicationError>(row_to_record(row))),
                );
                Ok(Some((page, (pool, next_after))))
            },
        );

        Box::pin(pages.try_flatten())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    async fn create_test_backend() -> SqlxKvBackend {
        let db = AsyncDatabase::in_memory().await.unwrap();
        db.migrate().await.unwrap();
        SqlxKvBackend::new(&db)
    }

    #[tokio::test]
    async fn upsert_and_lookup_roundtrip() {
        let backend = create_test_backend().await;

        backend.upsert("cat", "meow").await.unwrap();
        let record = backend.lookup("cat").await.unwrap();
        assert_eq!(record.key, "cat");
        assert_eq!(record.value, "meow");
        assert_eq!(record.created_at, record.updated_at);
    }

    #[tokio::test]
    async fn lookup_absent_key_is_not_found() {
        let backend = create_test_backend().await;
        let err = backend.lookup("ghost").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn upsert_preserves_created_at_and_refreshes_updated_at() {
        let backend = create_test_backend().await;

        backend.upsert("cat", "meow").await.unwrap();
        let first = backend.lookup("cat").await.unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        backend.upsert("cat", "purr").await.unwrap();
        let second = backend.lookup("cat").await.unwrap();

        assert_eq!(second.value, "purr");
        assert_eq!(second.created_at, first.created_at);
        assert!(second.updated_at > first.updated_at);
    }

    #[tokio::test]
    async fn upsert_never_duplicates_a_key() {
        let backend = create_test_backend().await;

        backend.upsert("cat", "meow").await.unwrap();
        backend.upsert("cat", "purr").await.unwrap();

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM kv_records WHERE key = 'cat'")
            .fetch_one(&backend.pool)
            .await
            .unwrap();
        assert_eq!(count.0, 1);
    }

    #[tokio::test]
    async fn delete_removes_the_record() {
        let backend = create_test_backend().await;

        backend.upsert("cat", "meow").await.unwrap();
        backend.delete_by_key("cat").await.unwrap();
        assert!(backend.lookup("cat").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn delete_absent_key_is_noop_success() {
        let backend = create_test_backend().await;
        backend.delete_by_key("ghost").await.unwrap();
    }

    #[tokio::test]
    async fn sample_random_key_on_empty_table_is_not_found() {
        let backend = create_test_backend().await;
        let err = backend.sample_random_key().await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn sample_random_key_returns_a_stored_key() {
        let backend = create_test_backend().await;
        backend.upsert("cat", "meow").await.unwrap();
        backend.upsert("dog", "woof").await.unwrap();

        for _ in 0..20 {
            let key = backend.sample_random_key().await.unwrap();
            assert!(key == "cat" || key == "dog");
        }
    }

    #[tokio::test]
    async fn sample_random_key_is_roughly_uniform() {
        let backend = create_test_backend().await;
        let keys = ["bird", "cat", "dog"];
        for key in keys {
            backend.upsert(key, "value").await.unwrap();
        }

        let mut counts: HashMap<String, u32> = HashMap::new();
        for _ in 0..1_000 {
            let key = backend.sample_random_key().await.unwrap();
            *counts.entry(key).or_default() += 1;
        }

        // Expect each key near 1000 / 3; a generous band still catches a
        // sampler that favors insertion order or lexicographic position
        for key in keys {
            let count = counts.get(key).copied().unwrap_or(0);
            assert!(
                (233..=433).contains(&count),
                "key '{key}' sampled {count} times out of 1000"
            );
        }
    }

    #[tokio::test]
    async fn scan_all_is_ordered_by_key() {
        let backend = create_test_backend().await;
        backend.upsert("dog", "woof").await.unwrap();
        backend.upsert("bird", "tweet").await.unwrap();
        backend.upsert("cat", "meow").await.unwrap();

        let records: Vec<Record> = backend.scan_all().try_collect().await.unwrap();
        let keys: Vec<&str> = records.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["bird", "cat", "dog"]);
    }

    #[tokio::test]
    async fn scan_all_on_empty_table_is_empty() {
        let backend = create_test_backend().await;
        let records: Vec<Record> = backend.scan_all().try_collect().await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn scan_all_crosses_page_boundaries() {
        let backend = create_test_backend().await;
        // Two and a half pages
        let total = usize::try_from(SCAN_PAGE_SIZE).unwrap() * 2 + 32;
        for i in 0..total {
            backend
                .upsert(&format!("key_{i:04}"), "value")
                .await
                .unwrap();
        }

        let records: Vec<Record> = backend.scan_all().try_collect().await.unwrap();
        assert_eq!(records.len(), total);
        assert!(records.windows(2).all(|pair| pair[0].key < pair[1].key));
    }

    #[tokio::test]
    async fn scan_all_is_restartable() {
        let backend = create_test_backend().await;
        backend.upsert("cat", "meow").await.unwrap();

        let first: Vec<Record> = backend.scan_all().try_collect().await.unwrap();
        let second: Vec<Record> = backend.scan_all().try_collect().await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn empty_key_and_value_are_stored() {
        let backend = create_test_backend().await;

        backend.upsert("", "empty_key_value").await.unwrap();
        backend.upsert("empty_value_key", "").await.unwrap();

        assert_eq!(backend.lookup("").await.unwrap().value, "empty_key_value");
        assert_eq!(backend.lookup("empty_value_key").await.unwrap().value, "");
    }

    #[tokio::test]
    async fn special_characters_survive_roundtrip() {
        let backend = create_test_backend().await;
        let key = "key_with_特殊字符_🎉_émojis";
        let value = "value_with_特殊字符_🎉_émojis";

        backend.upsert(key, value).await.unwrap();
        assert_eq!(backend.lookup(key).await.unwrap().value, value);
    }
}
