use axum::body::Bytes;
use mediator::Request;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{SharedFilmStore, StoreError};
use crate::storage::{BlobError, SharedBlobStore};

/// Replaces the attachment of a film
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadFileCommand {
    pub film_id: String,
    #[serde(skip)]
    pub content: Bytes,
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadFileResponse {
    pub key: String,
    pub checksum: Option<String>,
    pub size: i64,
    /// Number of earlier blobs removed
    pub replaced: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum UploadFileError {
    #[error("No film with id {0} exists")]
    FilmNotFound(String),
    #[error("Content is required and cannot be empty")]
    ContentRequired,
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Storage error: {0}")]
    Blob(#[from] BlobError),
}

impl Request<Result<UploadFileResponse, UploadFileError>> for UploadFileCommand {}

impl crate::cqrs::middleware::Command for UploadFileCommand {}

#[tracing::instrument(
    skip(films, blobs, command),
    fields(film_id = %command.film_id, size = command.content.len())
)]
pub async fn handle(
    films: SharedFilmStore,
    blobs: SharedBlobStore,
    command: UploadFileCommand,
) -> Result<UploadFileResponse, UploadFileError> {
    let Ok(film_id) = Uuid::parse_str(&command.film_id) else {
        return Err(UploadFileError::FilmNotFound(command.film_id));
    };
    if films.find_by_id(film_id).await?.is_none() {
        return Err(UploadFileError::FilmNotFound(command.film_id));
    }
    if command.content.is_empty() {
        return Err(UploadFileError::ContentRequired);
    }

    let replaced = blobs.delete_all(film_id).await?;
    let info = blobs
        .save(film_id, command.content, command.content_type)
        .await?;

    tracing::info!(key = %info.key, replaced, "File stored");

    Ok(UploadFileResponse {
        key: info.key,
        checksum: info.checksum,
        size: info.size,
        replaced,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::seed::demo_films;
    use crate::db::InMemoryFilmStore;
    use crate::storage::{BlobStore, InMemoryBlobStore};
    use std::sync::Arc;

    const ALPHA: &str = "00000000-0000-0000-0000-000000000001";

    fn command(film_id: &str, content: &'static [u8]) -> UploadFileCommand {
        UploadFileCommand {
            film_id: film_id.to_string(),
            content: Bytes::from_static(content),
            content_type: Some("image/png".to_string()),
        }
    }

    #[tokio::test]
    async fn test_upload_replaces_previous_file() {
        let films = Arc::new(InMemoryFilmStore::with_records(demo_films()));
        let blobs = Arc::new(InMemoryBlobStore::new());

        let first = handle(films.clone(), blobs.clone(), command(ALPHA, b"one")).await.unwrap();
        let second = handle(films, blobs.clone(), command(ALPHA, b"two")).await.unwrap();

        assert_eq!(first.replaced, 0);
        assert_eq!(second.replaced, 1);
        let stored = blobs.list(Uuid::from_u128(1)).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].key, second.key);
    }

    #[tokio::test]
    async fn test_upload_for_missing_film() {
        let films = Arc::new(InMemoryFilmStore::new());
        let blobs = Arc::new(InMemoryBlobStore::new());

        for id in [ALPHA, "not-a-uuid"] {
            let err = handle(films.clone(), blobs.clone(), command(id, b"x")).await.unwrap_err();
            assert!(matches!(err, UploadFileError::FilmNotFound(ref raw) if raw == id));
        }
        assert!(blobs.is_empty().await);
    }

    #[tokio::test]
    async fn test_upload_rejects_empty_content() {
        let films = Arc::new(InMemoryFilmStore::with_records(demo_films()));
        let blobs = Arc::new(InMemoryBlobStore::new());

        let err = handle(films, blobs, command(ALPHA, b"")).await.unwrap_err();
        assert!(matches!(err, UploadFileError::ContentRequired));
    }
}
