//! Create film command
//!
//! Validates the draft, probes for a film with the same title and inserts the
//! new film with a fresh id at version 0. The storage-level unique constraint
//! is the backstop for two creates racing past the probe.

use mediator::Request;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{SharedFilmStore, StoreError, UniqueField};
use crate::features::films::errors::CreateFilmError;
use crate::features::films::model::{FilmDraft, NewFilm};
use crate::features::films::validation::{validate, ValidationErrors};

pub const DUPLICATE_DESCRIPTION_MESSAGE: &str = "A film with this description already exists.";

/// Command to create a new film
///
/// The JSON body of `POST /films` deserializes straight into this command.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateFilmCommand {
    #[serde(flatten)]
    pub draft: FilmDraft,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFilmResponse {
    pub id: Uuid,
    pub version: i64,
}

impl Request<Result<CreateFilmResponse, CreateFilmError>> for CreateFilmCommand {}

impl crate::cqrs::middleware::Command for CreateFilmCommand {}

/// Handles the create film command
///
/// # Errors
///
/// - `Invalid` - a local constraint failed, or the description is taken
/// - `TitleExists` - another film already uses the title; no id is attached
/// - `Store` - the store failed
#[tracing::instrument(skip(store, command), fields(title = ?command.draft.title))]
pub async fn handle(
    store: SharedFilmStore,
    command: CreateFilmCommand,
) -> Result<CreateFilmResponse, CreateFilmError> {
    let fields = validate(&command.draft).map_err(CreateFilmError::Invalid)?;

    if store.find_by_title(&fields.title).await?.is_some() {
        tracing::debug!("Title already taken");
        return Err(CreateFilmError::TitleExists {
            title: fields.title,
            id: None,
        });
    }

    let title = fields.title.clone();
    let film = NewFilm {
        id: Uuid::new_v4(),
        fields,
    };

    let record = store.insert(film).await.map_err(|e| match e {
        StoreError::Duplicate(UniqueField::Title) => CreateFilmError::TitleExists {
            title: title.clone(),
            id: None,
        },
        StoreError::Duplicate(UniqueField::Description) => {
            let mut errors = ValidationErrors::default();
            errors.add("description", DUPLICATE_DESCRIPTION_MESSAGE);
            CreateFilmError::Invalid(errors)
        },
        other => CreateFilmError::Store(other),
    })?;

    tracing::info!(film_id = %record.id, "Film created");

    Ok(CreateFilmResponse {
        id: record.id,
        version: record.version,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{FilmStore, InMemoryFilmStore};
    use std::sync::Arc;

    pub(crate) fn alpha() -> FilmDraft {
        FilmDraft {
            title: Some("Alpha".into()),
            genre: Some("DOKUMENTATION".into()),
            studio: Some("DISNEY".into()),
            price: Some(11.1),
            description: Some("desc-A".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_version_zero() {
        let store = Arc::new(InMemoryFilmStore::new());

        let response = handle(store.clone(), CreateFilmCommand { draft: alpha() }).await.unwrap();

        assert_eq!(response.version, 0);
        assert_eq!(response.id.get_version_num(), 4);
        let stored = store.find_by_id(response.id).await.unwrap().unwrap();
        assert_eq!(stored.fields.title, "Alpha");
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_title_without_id() {
        let store = Arc::new(InMemoryFilmStore::new());
        handle(store.clone(), CreateFilmCommand { draft: alpha() }).await.unwrap();

        let draft = FilmDraft { description: Some("desc-B".into()), ..alpha() };
        let err = handle(store.clone(), CreateFilmCommand { draft }).await.unwrap_err();

        assert!(matches!(
            err,
            CreateFilmError::TitleExists { ref title, id: None } if title == "Alpha"
        ));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_before_touching_store() {
        let store = Arc::new(InMemoryFilmStore::new());
        store.set_unavailable(true);

        let draft = FilmDraft { price: Some(-1.0), ..alpha() };
        let err = handle(store, CreateFilmCommand { draft }).await.unwrap_err();

        match err {
            CreateFilmError::Invalid(errors) => assert!(errors.get("price").is_some()),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_create_reports_duplicate_description_as_invalid() {
        let store = Arc::new(InMemoryFilmStore::new());
        handle(store.clone(), CreateFilmCommand { draft: alpha() }).await.unwrap();

        let draft = FilmDraft { title: Some("Beta".into()), ..alpha() };
        let err = handle(store, CreateFilmCommand { draft }).await.unwrap_err();

        match err {
            CreateFilmError::Invalid(errors) => {
                assert_eq!(errors.get("description"), Some(DUPLICATE_DESCRIPTION_MESSAGE))
            },
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_create_propagates_store_faults() {
        let store = Arc::new(InMemoryFilmStore::new());
        store.set_unavailable(true);

        let err = handle(store, CreateFilmCommand { draft: alpha() }).await.unwrap_err();
        assert!(matches!(err, CreateFilmError::Store(StoreError::Unavailable(_))));
        assert!(!err.is_business_rejection());
    }
}
