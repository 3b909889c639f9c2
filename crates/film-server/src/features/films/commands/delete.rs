use mediator::Request;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{SharedFilmStore, StoreError};
use crate::storage::{BlobError, SharedBlobStore};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteFilmCommand {
    pub id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteFilmResponse {
    pub id: Uuid,
    pub deleted: bool,
    /// Attachments removed along with the film
    pub files_removed: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum DeleteFilmError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Blob store error: {0}")]
    Blob(#[from] BlobError),
}

impl Request<Result<DeleteFilmResponse, DeleteFilmError>> for DeleteFilmCommand {}

impl crate::cqrs::middleware::Command for DeleteFilmCommand {}

/// Deleting a film that does not exist is not an error; `deleted` tells the
/// two cases apart. The film's attachments are removed in both cases, so a
/// retry clears files left behind by an earlier failed delete.
#[tracing::instrument(skip(films, blobs))]
pub async fn handle(
    films: SharedFilmStore,
    blobs: SharedBlobStore,
    command: DeleteFilmCommand,
) -> Result<DeleteFilmResponse, DeleteFilmError> {
    let deleted = films.delete_by_id(command.id).await?;
    let files_removed = blobs.delete_all(command.id).await?;

    if deleted {
        tracing::info!(film_id = %command.id, files_removed, "Film deleted");
    }

    Ok(DeleteFilmResponse {
        id: command.id,
        deleted,
        files_removed,
    })
}
