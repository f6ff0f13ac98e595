//! Storage-specific error type wrapping sqlx errors.

use minicrm_domain::error::{MiniCrmError, PersistenceError};

/// Errors originating from the `SQLite` storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A query or connection failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Failed to encode or decode a stored JSON value.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Failed to run migrations.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl From<StorageError> for MiniCrmError {
    fn from(err: StorageError) -> Self {
        Self::Persistence(PersistenceError::from_source(err))
    }
}
