//! In-process film store
//!
//! Holds every film behind one async lock. Each trait method takes the lock
//! once, so `conditional_update` and `insert` are atomic with respect to each
//! other, which is what the optimistic-concurrency tests rely on.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{FilmStore, StoreError, StoreResult, UniqueField};
use crate::features::films::model::{FilmFields, FilmFilter, FilmRecord, NewFilm};

#[derive(Default)]
pub struct InMemoryFilmStore {
    films: RwLock<HashMap<Uuid, FilmRecord>>,
    unavailable: AtomicBool,
}

impl InMemoryFilmStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-filled with `records`, keeping their ids and versions.
    pub fn with_records(records: impl IntoIterator<Item = FilmRecord>) -> Self {
        let films = records.into_iter().map(|r| (r.id, r)).collect();
        Self {
            films: RwLock::new(films),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Makes every following call fail with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.films.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.films.read().await.is_empty()
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("in-memory store switched off".to_string()))
        } else {
            Ok(())
        }
    }
}

/// Rejects `fields` if another film already holds its title or description.
fn check_unique(
    films: &HashMap<Uuid, FilmRecord>,
    own_id: Uuid,
    fields: &FilmFields,
) -> StoreResult<()> {
    for other in films.values().filter(|f| f.id != own_id) {
        if other.fields.title == fields.title {
            return Err(StoreError::Duplicate(UniqueField::Title));
        }
        if other.fields.description == fields.description {
            return Err(StoreError::Duplicate(UniqueField::Description));
        }
    }
    Ok(())
}

#[async_trait]
impl FilmStore for InMemoryFilmStore {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<FilmRecord>> {
        self.check_available()?;
        Ok(self.films.read().await.get(&id).cloned())
    }

    async fn find_by_title(&self, title: &str) -> StoreResult<Option<FilmRecord>> {
        self.check_available()?;
        let films = self.films.read().await;
        Ok(films.values().find(|f| f.fields.title == title).cloned())
    }

    async fn find(&self, filter: &FilmFilter) -> StoreResult<Vec<FilmRecord>> {
        self.check_available()?;
        let films = self.films.read().await;
        let mut found: Vec<FilmRecord> = films
            .values()
            .filter(|f| filter.matches(&f.fields))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.fields.title.cmp(&b.fields.title));
        Ok(found)
    }

    async fn insert(&self, film: NewFilm) -> StoreResult<FilmRecord> {
        self.check_available()?;
        let mut films = self.films.write().await;
        check_unique(&films, film.id, &film.fields)?;

        let now = Utc::now();
        let record = FilmRecord {
            id: film.id,
            version: 0,
            fields: film.fields,
            created_at: now,
            updated_at: now,
        };
        films.insert(record.id, record.clone());
        Ok(record)
    }

    async fn conditional_update(
        &self,
        id: Uuid,
        max_version: i64,
        mut fields: FilmFields,
    ) -> StoreResult<Option<FilmRecord>> {
        self.check_available()?;
        let mut films = self.films.write().await;

        let Some(current) = films.get(&id) else {
            return Ok(None);
        };
        if current.version > max_version {
            return Ok(None);
        }
        // description is immutable after creation
        fields.description = current.fields.description.clone();
        check_unique(&films, id, &fields)?;

        let Some(record) = films.get_mut(&id) else {
            return Ok(None);
        };
        record.fields = fields;
        record.version += 1;
        record.updated_at = Utc::now();
        Ok(Some(record.clone()))
    }

    async fn delete_by_id(&self, id: Uuid) -> StoreResult<bool> {
        self.check_available()?;
        Ok(self.films.write().await.remove(&id).is_some())
    }

    async fn health_check(&self) -> StoreResult<()> {
        self.check_available()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::films::model::fixtures;

    fn new_film(title: &str, description: &str) -> NewFilm {
        NewFilm {
            id: Uuid::new_v4(),
            fields: fixtures::fields(title, description),
        }
    }

    #[tokio::test]
    async fn test_insert_starts_at_version_zero() {
        let store = InMemoryFilmStore::new();
        let record = store.insert(new_film("Alpha", "a")).await.unwrap();

        assert_eq!(record.version, 0);
        assert_eq!(record.created_at, record.updated_at);
        assert_eq!(store.find_by_id(record.id).await.unwrap(), Some(record));
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicates() {
        let store = InMemoryFilmStore::new();
        store.insert(new_film("Alpha", "a")).await.unwrap();

        let title = store.insert(new_film("Alpha", "b")).await.unwrap_err();
        assert!(matches!(title, StoreError::Duplicate(UniqueField::Title)));

        let description = store.insert(new_film("Beta", "a")).await.unwrap_err();
        assert!(matches!(description, StoreError::Duplicate(UniqueField::Description)));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_find_by_title_is_case_sensitive() {
        let store = InMemoryFilmStore::new();
        store.insert(new_film("Alpha", "a")).await.unwrap();

        assert!(store.find_by_title("Alpha").await.unwrap().is_some());
        assert!(store.find_by_title("alpha").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_sorts_by_title() {
        let store = InMemoryFilmStore::new();
        for (title, desc) in [("Gamma", "g"), ("Alpha", "a"), ("Beta", "b")] {
            store.insert(new_film(title, desc)).await.unwrap();
        }

        let titles: Vec<_> = store
            .find(&FilmFilter::default())
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.fields.title)
            .collect();
        assert_eq!(titles, vec!["Alpha", "Beta", "Gamma"]);
    }

    #[tokio::test]
    async fn test_conditional_update_guards_version() {
        let store = InMemoryFilmStore::new();
        let record = store.insert(new_film("Alpha", "a")).await.unwrap();

        let mut fields = fixtures::fields("Alpha", "changed");
        fields.price = 99.99;
        let updated = store
            .conditional_update(record.id, 0, fields.clone())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.version, 1);
        assert_eq!(updated.fields.price, 99.99);
        assert_eq!(updated.fields.description, "a");

        assert!(store.conditional_update(record.id, 0, fields).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_conditional_update_missing_film() {
        let store = InMemoryFilmStore::new();
        let result = store
            .conditional_update(Uuid::new_v4(), 0, fixtures::fields("Alpha", "a"))
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_every_call() {
        let store = InMemoryFilmStore::new();
        store.set_unavailable(true);

        assert!(matches!(
            store.find(&FilmFilter::default()).await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(store.health_check().await.is_err());

        store.set_unavailable(false);
        assert!(store.health_check().await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_reports_removal() {
        let store = InMemoryFilmStore::new();
        let record = store.insert(new_film("Alpha", "a")).await.unwrap();

        assert!(store.delete_by_id(record.id).await.unwrap());
        assert!(!store.delete_by_id(record.id).await.unwrap());
        assert!(store.is_empty().await);
    }
}
