use mediator::Request;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{SharedFilmStore, StoreError};
use crate::features::films::model::Film;

/// Looks a film up by the id exactly as the client sent it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetFilmQuery {
    pub id: String,
}

#[derive(Debug, thiserror::Error)]
pub enum GetFilmError {
    #[error("No film with id {0} exists")]
    NotFound(String),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl Request<Result<Film, GetFilmError>> for GetFilmQuery {}

impl crate::cqrs::middleware::Query for GetFilmQuery {}

#[tracing::instrument(skip(store))]
pub async fn handle(store: SharedFilmStore, query: GetFilmQuery) -> Result<Film, GetFilmError> {
    let Ok(id) = Uuid::parse_str(&query.id) else {
        return Err(GetFilmError::NotFound(query.id));
    };

    store
        .find_by_id(id)
        .await?
        .map(|record| record.into_film())
        .ok_or(GetFilmError::NotFound(query.id))
}
