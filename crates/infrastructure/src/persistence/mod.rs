//! Persistence adapters (sqlx / SQLite)

mod async_connection;
mod error;
mod kv_backend;

pub use async_connection::{
    AsyncDatabase, AsyncDatabaseConfig, AsyncDatabaseError, shared_database,
};
pub use error::map_sqlx_error;
pub use kv_backend::SqlxKvBackend;
