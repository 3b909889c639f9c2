//! Blob attachments
//!
//! Each film owns at most one binary attachment (a poster, a trailer). Blobs
//! live under the key prefix `films/<film id>/`; replacing an attachment
//! deletes every blob under the prefix before saving the new one. More than
//! one blob under a prefix means an earlier replacement was interrupted.

use async_trait::async_trait;
use axum::body::Bytes;
use futures::stream::BoxStream;
use std::sync::Arc;
use uuid::Uuid;

pub mod config;
pub mod memory;
pub mod s3;

pub use memory::InMemoryBlobStore;
pub use s3::S3BlobStore;

#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    #[error("Blob not found: {0}")]
    NotFound(String),
    #[error("S3 error: {0}")]
    S3(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type BlobResult<T> = Result<T, BlobError>;

/// Metadata of a stored blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobInfo {
    pub key: String,
    pub size: i64,
    /// Only known once the blob is opened on some backends
    pub content_type: Option<String>,
    /// Hex SHA-256 of the content
    pub checksum: Option<String>,
}

/// An opened blob whose content is read lazily.
pub struct Blob {
    pub info: BlobInfo,
    pub body: BoxStream<'static, std::io::Result<Bytes>>,
}

impl std::fmt::Debug for Blob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Blob").field("info", &self.info).finish_non_exhaustive()
    }
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores `data` as a new blob of the film.
    async fn save(
        &self,
        film_id: Uuid,
        data: Bytes,
        content_type: Option<String>,
    ) -> BlobResult<BlobInfo>;

    /// Blobs of the film, ordered by key.
    async fn list(&self, film_id: Uuid) -> BlobResult<Vec<BlobInfo>>;

    async fn open(&self, key: &str) -> BlobResult<Blob>;

    /// Removes every blob of the film and returns how many there were.
    async fn delete_all(&self, film_id: Uuid) -> BlobResult<usize>;
}

pub type SharedBlobStore = Arc<dyn BlobStore>;

pub fn film_prefix(film_id: Uuid) -> String {
    format!("films/{}/", film_id)
}

/// Fresh key under the film's prefix.
pub fn new_key(film_id: Uuid) -> String {
    format!("{}{}", film_prefix(film_id), Uuid::new_v4())
}
