//! List films query
//!
//! Every criterion is optional; an empty query returns the whole catalog.
//! Results are always sorted by title. Unknown keys in the query string are
//! ignored, and a genre or studio outside the closed sets simply matches
//! nothing.

use mediator::Request;
use serde::{Deserialize, Serialize};

use crate::db::{SharedFilmStore, StoreError};
use crate::features::films::model::{Film, FilmFilter, Genre, Studio};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListFilmsQuery {
    /// Case-insensitive substring of the title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub studio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
}

#[derive(Debug, thiserror::Error)]
pub enum ListFilmsError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl Request<Result<Vec<Film>, ListFilmsError>> for ListFilmsQuery {}

impl crate::cqrs::middleware::Query for ListFilmsQuery {}

impl ListFilmsQuery {
    /// `None` when a criterion can never match.
    pub fn to_filter(&self) -> Option<FilmFilter> {
        let genre = match self.genre.as_deref() {
            Some(g) => Some(g.parse::<Genre>().ok()?),
            None => None,
        };
        let studio = match self.studio.as_deref() {
            Some(s) => Some(s.parse::<Studio>().ok()?),
            None => None,
        };

        Some(FilmFilter {
            title: self.title.clone().filter(|t| !t.is_empty()),
            genre,
            studio,
            available: self.available,
            rating: self.rating,
        })
    }
}

#[tracing::instrument(skip(store))]
pub async fn handle(
    store: SharedFilmStore,
    query: ListFilmsQuery,
) -> Result<Vec<Film>, ListFilmsError> {
    let Some(filter) = query.to_filter() else {
        tracing::debug!("Filter can never match");
        return Ok(Vec::new());
    };

    let films = store
        .find(&filter)
        .await?
        .into_iter()
        .map(|record| record.into_film())
        .collect();

    Ok(films)
}
