//! Infrastructure layer - adapters for external systems
//!
//! Implements the backend port defined in the application layer on top of a
//! sqlx SQLite pool, and provides configuration loading.

pub mod config;
pub mod persistence;

pub use config::{AppConfig, ChaosAppConfig, DatabaseConfig};
pub use persistence::{
    AsyncDatabase, AsyncDatabaseConfig, AsyncDatabaseError, SqlxKvBackend, shared_database,
};
