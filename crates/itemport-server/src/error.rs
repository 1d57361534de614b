//! Server-specific error types
//!
//! Request handlers answer with their own route-level error enums; `AppError`
//! covers what can fail while the server starts up.

use thiserror::Error;

/// Result type alias for server startup operations
pub type AppResult<T> = std::result::Result<T, AppError>;

/// Startup error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_errors_convert() {
        let err = AppError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, AppError::Database(_)));
        assert!(err.to_string().starts_with("Database error:"));
    }

    #[test]
    fn test_migration_errors_convert() {
        let err = AppError::from(sqlx::migrate::MigrateError::VersionMissing(20261015000000));
        assert!(matches!(err, AppError::Migration(_)));
        assert!(err.to_string().starts_with("Migration error:"));
    }
}
