use mediator::Request;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{SharedFilmStore, StoreError};
use crate::storage::{Blob, BlobError, SharedBlobStore};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadFileQuery {
    pub film_id: String,
}

#[derive(Debug, thiserror::Error)]
pub enum DownloadFileError {
    #[error("No film with id {0} exists")]
    FilmNotFound(String),
    #[error("There is no file for film {0}")]
    FileNotFound(Uuid),
    #[error("There are {count} files for film {film_id}")]
    MultipleFiles { film_id: Uuid, count: usize },
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Storage error: {0}")]
    Blob(#[from] BlobError),
}

impl Request<Result<Blob, DownloadFileError>> for DownloadFileQuery {}

impl crate::cqrs::middleware::Query for DownloadFileQuery {}

/// Opens the single attachment of a film.
#[tracing::instrument(skip(films, blobs))]
pub async fn handle(
    films: SharedFilmStore,
    blobs: SharedBlobStore,
    query: DownloadFileQuery,
) -> Result<Blob, DownloadFileError> {
    let Ok(film_id) = Uuid::parse_str(&query.film_id) else {
        return Err(DownloadFileError::FilmNotFound(query.film_id));
    };
    if films.find_by_id(film_id).await?.is_none() {
        return Err(DownloadFileError::FilmNotFound(query.film_id));
    }

    let mut stored = blobs.list(film_id).await?;
    let info = match stored.len() {
        0 => return Err(DownloadFileError::FileNotFound(film_id)),
        1 => stored.remove(0),
        count => return Err(DownloadFileError::MultipleFiles { film_id, count }),
    };

    // the blob may vanish between listing and opening
    blobs.open(&info.key).await.map_err(|e| match e {
        BlobError::NotFound(_) => DownloadFileError::FileNotFound(film_id),
        other => DownloadFileError::Blob(other),
    })
}
