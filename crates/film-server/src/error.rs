//! Server-specific error types

use thiserror::Error;

use crate::db::StoreError;
use crate::storage::BlobError;

/// Result type alias for server operations
pub type ServerResult<T> = std::result::Result<T, ServerError>;

/// Failures while assembling or running the server, outside any request
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Storage error: {0}")]
    Blob(#[from] BlobError),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Common error: {0}")]
    Common(#[from] film_common::FilmCommonError),

    #[error("Configuration error: {0}")]
    Config(String),
}
