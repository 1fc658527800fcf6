//! Shared error mapping for the sqlx persistence layer

use application::error::ApplicationError;

/// Map a sqlx error to an application-layer error
pub fn map_sqlx_error(e: sqlx::Error) -> ApplicationError {
    match e {
        sqlx::Error::RowNotFound => {
            ApplicationError::NotFound("database record not found".to_string())
        },
        sqlx::Error::PoolTimedOut => ApplicationError::DeadlineExceeded(
            "timed out waiting for a database connection".to_string(),
        ),
        sqlx::Error::PoolClosed => {
            ApplicationError::Cancelled("database connection pool is closed".to_string())
        },
        sqlx::Error::Database(db_err) => {
            ApplicationError::BackendIo(format!("database error: {db_err}"))
        },
        other => ApplicationError::BackendIo(format!("database error: {other}")),
    }
}
