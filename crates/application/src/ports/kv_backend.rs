//! Key-value backend port
//!
//! The four-operation contract the persistent backend must satisfy, plus an
//! ordered scan used by dump. The store composes these with the chaos
//! decision engine; the backend itself is entirely honest.

use async_trait::async_trait;
use domain::Record;
use futures::stream::BoxStream;
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// A lazy, finite stream of records ordered by key ascending
///
/// Restartable in the sense that every call to [`KvBackendPort::scan_all`]
/// produces a fresh stream from the current backend state.
pub type RecordStream = BoxStream<'static, Result<Record, ApplicationError>>;

/// Port for the persistent key-value backend
///
/// A single table keyed by `key` with upsert semantics: the backend never
/// holds two records with the same key.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait KvBackendPort: Send + Sync {
    /// Insert or update-in-place
    ///
    /// Refreshes `updated_at`; sets `created_at` only on first insert.
    async fn upsert(&self, key: &str, value: &str) -> Result<(), ApplicationError>;

    /// Point lookup by key
    ///
    /// Fails with [`ApplicationError::NotFound`] when the key is absent.
    async fn lookup(&self, key: &str) -> Result<Record, ApplicationError>;

    /// Delete the record for a key
    ///
    /// Deleting an absent key is a no-op success.
    async fn delete_by_key(&self, key: &str) -> Result<(), ApplicationError>;

    /// Sample one key with uniform probability over all stored keys
    ///
    /// Fails with [`ApplicationError::NotFound`] when the table is empty.
    async fn sample_random_key(&self) -> Result<String, ApplicationError>;

    /// Scan every record, ordered by key ascending
    fn scan_all(&self) -> RecordStream;
}
