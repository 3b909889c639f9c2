//! Film persistence
//!
//! The command and query handlers only see the [`FilmStore`] trait. Two
//! implementations exist: [`postgres::PgFilmStore`] for deployments and
//! [`memory::InMemoryFilmStore`] for tests and local development.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::features::films::model::{FilmFields, FilmFilter, FilmRecord, NewFilm};

pub mod memory;
pub mod postgres;
pub mod seed;

pub use memory::InMemoryFilmStore;
pub use postgres::PgFilmStore;

/// Column guarded by a uniqueness constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Title,
    Description,
}

impl fmt::Display for UniqueField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UniqueField::Title => f.write_str("title"),
            UniqueField::Description => f.write_str("description"),
        }
    }
}

/// Store failures. Everything except `Duplicate` is an infrastructure fault.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database query failed: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// A write collided with a uniqueness constraint
    #[error("Film {0} already exists")]
    Duplicate(UniqueField),

    /// A stored row could not be mapped back to a film
    #[error("Stored film {id} is corrupt: {reason}")]
    Corrupt { id: Uuid, reason: String },

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Everything the film handlers need from persistence.
///
/// `conditional_update` is the only mutation of an existing film. It must be
/// atomic: the record is written only if it still exists and its stored
/// version is not greater than `max_version`, and the version is bumped by
/// exactly one in the same step. `description` is never written by it.
#[async_trait]
pub trait FilmStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<FilmRecord>>;

    /// Case-sensitive exact match.
    async fn find_by_title(&self, title: &str) -> StoreResult<Option<FilmRecord>>;

    /// Matching films sorted by title ascending.
    async fn find(&self, filter: &FilmFilter) -> StoreResult<Vec<FilmRecord>>;

    /// Stores a new film with version 0.
    async fn insert(&self, film: NewFilm) -> StoreResult<FilmRecord>;

    async fn conditional_update(
        &self,
        id: Uuid,
        max_version: i64,
        fields: FilmFields,
    ) -> StoreResult<Option<FilmRecord>>;

    /// Returns whether a film was removed.
    async fn delete_by_id(&self, id: Uuid) -> StoreResult<bool>;

    async fn health_check(&self) -> StoreResult<()>;
}

pub type SharedFilmStore = Arc<dyn FilmStore>;

pub async fn create_pool(config: &DatabaseConfig) -> StoreResult<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .connect(&config.url)
        .await?;

    tracing::info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Database connection pool created"
    );

    Ok(pool)
}
