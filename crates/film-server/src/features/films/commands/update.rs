//! Update film command
//!
//! Optimistic-concurrency update of an existing film. The checks run in a
//! fixed order and each one short-circuits the rest:
//!
//! 1. the version token must be a non-negative base-10 integer
//! 2. the draft must pass validation
//! 3. the title must not belong to a different film
//! 4. the draft must name a target id
//! 5. the target must exist
//! 6. the supplied version must not be older than the stored one
//! 7. the conditional write must still match (id and version)
//!
//! Only step 7 writes, and it bumps the version by exactly one.

use mediator::Request;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{SharedFilmStore, StoreError, UniqueField};
use crate::features::films::errors::UpdateFilmError;
use crate::features::films::model::FilmDraft;
use crate::features::films::validation::validate;

/// Command to update an existing film
///
/// `draft.id` carries the target id and `version` the raw version token the
/// client last observed, both exactly as received.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateFilmCommand {
    #[serde(flatten)]
    pub draft: FilmDraft,
    #[serde(skip)]
    pub version: Option<String>,
}

impl UpdateFilmCommand {
    pub fn new(id: impl Into<String>, version: Option<String>, draft: FilmDraft) -> Self {
        Self {
            draft: draft.with_id(id),
            version,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateFilmResponse {
    pub id: Uuid,
    pub version: i64,
}

impl Request<Result<UpdateFilmResponse, UpdateFilmError>> for UpdateFilmCommand {}

impl crate::cqrs::middleware::Command for UpdateFilmCommand {}

/// Parses a version token: one or more ASCII digits that fit an `i64`.
pub fn parse_version(token: Option<&str>) -> Result<i64, UpdateFilmError> {
    let malformed = || UpdateFilmError::VersionMalformed {
        token: token.map(str::to_string),
    };

    match token {
        Some(t) if !t.is_empty() && t.bytes().all(|b| b.is_ascii_digit()) => {
            t.parse::<i64>().map_err(|_| malformed())
        },
        _ => Err(malformed()),
    }
}

/// Handles the update film command
///
/// Returns the new version on success.
#[tracing::instrument(
    skip(store, command),
    fields(id = ?command.draft.id, version = ?command.version)
)]
pub async fn handle(
    store: SharedFilmStore,
    command: UpdateFilmCommand,
) -> Result<UpdateFilmResponse, UpdateFilmError> {
    let supplied_version = parse_version(command.version.as_deref())?;

    let fields = validate(&command.draft).map_err(UpdateFilmError::Invalid)?;

    let raw_id = command.draft.id;
    let target_id = raw_id.as_deref().and_then(|raw| Uuid::parse_str(raw).ok());

    if let Some(existing) = store.find_by_title(&fields.title).await? {
        if Some(existing.id) != target_id {
            return Err(UpdateFilmError::TitleExists {
                title: fields.title,
                id: Some(existing.id),
            });
        }
    }

    let Some(raw_id) = raw_id else {
        return Err(UpdateFilmError::NotFound { id: None });
    };
    let Some(id) = target_id else {
        tracing::debug!(raw_id = %raw_id, "Film id is not a UUID");
        return Err(UpdateFilmError::NotFound { id: Some(raw_id) });
    };

    let Some(current) = store.find_by_id(id).await? else {
        return Err(UpdateFilmError::NotFound {
            id: Some(id.to_string()),
        });
    };

    if supplied_version < current.version {
        tracing::debug!(stored = current.version, "Supplied version is outdated");
        return Err(UpdateFilmError::VersionStale {
            id,
            version: supplied_version,
        });
    }

    let title = fields.title.clone();
    let updated = store
        .conditional_update(id, supplied_version, fields)
        .await
        .map_err(|e| match e {
            StoreError::Duplicate(UniqueField::Title) => {
                UpdateFilmError::TitleExists { title, id: None }
            },
            other => UpdateFilmError::Store(other),
        })?
        .ok_or_else(|| UpdateFilmError::NotFound {
            id: Some(id.to_string()),
        })?;

    tracing::info!(film_id = %updated.id, version = updated.version, "Film updated");

    Ok(UpdateFilmResponse {
        id: updated.id,
        version: updated.version,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{FilmStore, InMemoryFilmStore, StoreResult};
    use crate::features::films::model::{fixtures, FilmFields, FilmFilter, FilmRecord, NewFilm};
    use async_trait::async_trait;
    use std::sync::Arc;

    fn draft(title: &str) -> FilmDraft {
        FilmDraft {
            title: Some(title.into()),
            studio: Some("UNIVERSAL".into()),
            price: Some(99.99),
            description: Some("desc-A".into()),
            ..Default::default()
        }
    }

    async fn store_with_alpha() -> (Arc<InMemoryFilmStore>, FilmRecord) {
        let store = Arc::new(InMemoryFilmStore::new());
        let record = store
            .insert(NewFilm {
                id: Uuid::new_v4(),
                fields: fixtures::fields("Alpha", "desc-A"),
            })
            .await
            .unwrap();
        (store, record)
    }

    fn command(id: Uuid, version: &str, title: &str) -> UpdateFilmCommand {
        UpdateFilmCommand::new(id.to_string(), Some(version.to_string()), draft(title))
    }

    #[test]
    fn test_parse_version() {
        assert_eq!(parse_version(Some("0")).unwrap(), 0);
        assert_eq!(parse_version(Some("0042")).unwrap(), 42);
        for bad in ["", "abc", "-1", "+1", " 1", "1.0", "99999999999999999999"] {
            match parse_version(Some(bad)) {
                Err(UpdateFilmError::VersionMalformed { token }) => {
                    assert_eq!(token.as_deref(), Some(bad))
                },
                other => panic!("{bad:?} gave {other:?}"),
            }
        }
        assert!(matches!(
            parse_version(None),
            Err(UpdateFilmError::VersionMalformed { token: None })
        ));
    }

    #[tokio::test]
    async fn test_update_bumps_version_by_one() {
        let (store, record) = store_with_alpha().await;

        let first = handle(store.clone(), command(record.id, "0", "Alpha")).await.unwrap();
        let second = handle(store.clone(), command(record.id, "1", "Alpha")).await.unwrap();

        assert_eq!(first.version, 1);
        assert_eq!(second.version, 2);
        let stored = store.find_by_id(record.id).await.unwrap().unwrap();
        assert_eq!(stored.fields.price, 99.99);
        assert_eq!(stored.fields.studio, crate::features::films::model::Studio::Universal);
    }

    #[tokio::test]
    async fn test_update_with_stale_version() {
        let (store, record) = store_with_alpha().await;
        handle(store.clone(), command(record.id, "0", "Alpha")).await.unwrap();

        for _ in 0..3 {
            let err = handle(store.clone(), command(record.id, "0", "Alpha")).await.unwrap_err();
            assert!(matches!(
                err,
                UpdateFilmError::VersionStale { id, version: 0 } if id == record.id
            ));
        }
        assert_eq!(store.find_by_id(record.id).await.unwrap().unwrap().version, 1);
    }

    #[tokio::test]
    async fn test_update_accepts_version_ahead_of_store() {
        let (store, record) = store_with_alpha().await;

        let response = handle(store, command(record.id, "7", "Alpha")).await.unwrap();
        assert_eq!(response.version, 1);
    }

    #[tokio::test]
    async fn test_malformed_version_wins_over_invalid_draft() {
        let (store, record) = store_with_alpha().await;

        let err = handle(store, command(record.id, "abc", "!bad")).await.unwrap_err();
        assert!(matches!(
            err,
            UpdateFilmError::VersionMalformed { token: Some(ref t) } if t == "abc"
        ));
    }

    #[tokio::test]
    async fn test_title_conflict_reports_owner() {
        let (store, record) = store_with_alpha().await;
        let beta = store
            .insert(NewFilm {
                id: Uuid::new_v4(),
                fields: fixtures::fields("Beta", "desc-B"),
            })
            .await
            .unwrap();

        let err = handle(store.clone(), command(record.id, "0", "Beta")).await.unwrap_err();

        assert!(matches!(
            err,
            UpdateFilmError::TitleExists { ref title, id: Some(owner) }
                if title == "Beta" && owner == beta.id
        ));
        assert_eq!(store.find_by_id(record.id).await.unwrap().unwrap().version, 0);
    }

    #[tokio::test]
    async fn test_missing_id_is_not_found() {
        let (store, _) = store_with_alpha().await;
        let command = UpdateFilmCommand {
            draft: draft("Omega"),
            version: Some("0".into()),
        };

        let err = handle(store, command).await.unwrap_err();
        assert!(matches!(err, UpdateFilmError::NotFound { id: None }));
    }

    #[tokio::test]
    async fn test_title_check_runs_before_id_check() {
        let (store, _) = store_with_alpha().await;
        let command = UpdateFilmCommand {
            draft: draft("Alpha"),
            version: Some("0".into()),
        };

        let err = handle(store, command).await.unwrap_err();
        assert!(matches!(err, UpdateFilmError::TitleExists { id: Some(_), .. }));
    }

    #[tokio::test]
    async fn test_unknown_and_malformed_ids_are_not_found() {
        let (store, _) = store_with_alpha().await;
        let missing = Uuid::new_v4();

        let err = handle(store.clone(), command(missing, "0", "Omega")).await.unwrap_err();
        assert!(matches!(
            err,
            UpdateFilmError::NotFound { id: Some(ref id) } if *id == missing.to_string()
        ));

        let bogus = UpdateFilmCommand::new("not-a-uuid", Some("0".into()), draft("Omega"));
        let err = handle(store, bogus).await.unwrap_err();
        assert!(matches!(
            err,
            UpdateFilmError::NotFound { id: Some(ref id) } if id == "not-a-uuid"
        ));
    }

    #[tokio::test]
    async fn test_description_is_immutable() {
        let (store, record) = store_with_alpha().await;
        let mut changed = draft("Alpha");
        changed.description = Some("rewritten".into());

        handle(
            store.clone(),
            UpdateFilmCommand::new(record.id.to_string(), Some("0".into()), changed),
        )
        .await
        .unwrap();

        let stored = store.find_by_id(record.id).await.unwrap().unwrap();
        assert_eq!(stored.fields.description, "desc-A");
    }

    /// Hands out the film on lookup, then removes it before the write.
    struct VanishingStore {
        inner: InMemoryFilmStore,
    }

    #[async_trait]
    impl FilmStore for VanishingStore {
        async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<FilmRecord>> {
            let found = self.inner.find_by_id(id).await?;
            self.inner.delete_by_id(id).await?;
            Ok(found)
        }

        async fn find_by_title(&self, title: &str) -> StoreResult<Option<FilmRecord>> {
            self.inner.find_by_title(title).await
        }

        async fn find(&self, filter: &FilmFilter) -> StoreResult<Vec<FilmRecord>> {
            self.inner.find(filter).await
        }

        async fn insert(&self, film: NewFilm) -> StoreResult<FilmRecord> {
            self.inner.insert(film).await
        }

        async fn conditional_update(
            &self,
            id: Uuid,
            max_version: i64,
            fields: FilmFields,
        ) -> StoreResult<Option<FilmRecord>> {
            self.inner.conditional_update(id, max_version, fields).await
        }

        async fn delete_by_id(&self, id: Uuid) -> StoreResult<bool> {
            self.inner.delete_by_id(id).await
        }

        async fn health_check(&self) -> StoreResult<()> {
            self.inner.health_check().await
        }
    }

    #[tokio::test]
    async fn test_film_gone_before_write_is_not_found() {
        let (seeded, record) = store_with_alpha().await;
        let records = seeded.find(&FilmFilter::default()).await.unwrap();
        let store = Arc::new(VanishingStore {
            inner: InMemoryFilmStore::with_records(records),
        });

        let err = handle(store.clone(), command(record.id, "0", "Alpha")).await.unwrap_err();

        assert!(matches!(
            err,
            UpdateFilmError::NotFound { id: Some(ref id) } if *id == record.id.to_string()
        ));
        assert!(store.inner.is_empty().await);
        assert!(store.inner.find_by_title("Alpha").await.unwrap().is_none());
    }
}
