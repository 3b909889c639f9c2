//! PostgreSQL film store

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{FilmStore, StoreError, StoreResult, UniqueField};
use crate::features::films::model::{FilmFields, FilmFilter, FilmRecord, Genre, NewFilm, Studio};

const FILM_COLUMNS: &str = "id, version, title, rating, genre, studio, price, discount, \
     available, release_date, description, website, cast_members, director, runtime_minutes, \
     created_at, updated_at";

#[derive(Clone)]
pub struct PgFilmStore {
    pool: PgPool,
}

impl PgFilmStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[derive(Debug, sqlx::FromRow)]
struct FilmRow {
    id: Uuid,
    version: i64,
    title: String,
    rating: Option<f64>,
    genre: Option<String>,
    studio: String,
    price: f64,
    discount: Option<f64>,
    available: Option<bool>,
    release_date: Option<NaiveDate>,
    description: String,
    website: Option<String>,
    cast_members: Vec<String>,
    director: Option<serde_json::Value>,
    runtime_minutes: Option<i32>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl FilmRow {
    fn into_record(self) -> StoreResult<FilmRecord> {
        let row = self;
        let id = row.id;
        let corrupt = |reason: String| StoreError::Corrupt { id, reason };

        let genre = row
            .genre
            .as_deref()
            .map(str::parse::<Genre>)
            .transpose()
            .map_err(|e| corrupt(format!("genre: {e}")))?;
        let studio = row
            .studio
            .parse::<Studio>()
            .map_err(|e| corrupt(format!("studio: {e}")))?;

        Ok(FilmRecord {
            id: row.id,
            version: row.version,
            fields: FilmFields {
                title: row.title,
                rating: row.rating,
                genre,
                studio,
                price: row.price,
                discount: row.discount,
                available: row.available,
                release_date: row.release_date,
                description: row.description,
                website: row.website,
                cast: row.cast_members,
                director: row.director,
                runtime_minutes: row.runtime_minutes,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Maps constraint violations on `films` to [`StoreError::Duplicate`].
fn map_write_error(error: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = error {
        if db_err.is_unique_violation() {
            match db_err.constraint() {
                Some(c) if c.contains("title") => return StoreError::Duplicate(UniqueField::Title),
                Some(c) if c.contains("description") => {
                    return StoreError::Duplicate(UniqueField::Description)
                },
                _ => {},
            }
        }
    }
    StoreError::Sqlx(error)
}

/// Escapes `LIKE` wildcards so user input matches literally.
fn like_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn select_films() -> QueryBuilder<'static, Postgres> {
    QueryBuilder::new(format!("SELECT {FILM_COLUMNS} FROM films WHERE TRUE"))
}

#[async_trait]
impl FilmStore for PgFilmStore {
    #[tracing::instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<FilmRecord>> {
        let row = sqlx::query_as::<_, FilmRow>(&format!(
            "SELECT {FILM_COLUMNS} FROM films WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(FilmRow::into_record).transpose()
    }

    #[tracing::instrument(skip(self))]
    async fn find_by_title(&self, title: &str) -> StoreResult<Option<FilmRecord>> {
        let row = sqlx::query_as::<_, FilmRow>(&format!(
            "SELECT {FILM_COLUMNS} FROM films WHERE title = $1"
        ))
        .bind(title)
        .fetch_optional(&self.pool)
        .await?;

        row.map(FilmRow::into_record).transpose()
    }

    #[tracing::instrument(skip(self))]
    async fn find(&self, filter: &FilmFilter) -> StoreResult<Vec<FilmRecord>> {
        let mut query = select_films();

        if let Some(title) = &filter.title {
            query.push(" AND title ILIKE ").push_bind(like_pattern(title));
        }
        if let Some(genre) = filter.genre {
            query.push(" AND genre = ").push_bind(genre.as_str());
        }
        if let Some(studio) = filter.studio {
            query.push(" AND studio = ").push_bind(studio.as_str());
        }
        if let Some(available) = filter.available {
            query.push(" AND available = ").push_bind(available);
        }
        if let Some(rating) = filter.rating {
            query.push(" AND rating = ").push_bind(rating);
        }
        query.push(" ORDER BY title ASC");

        let rows = query
            .build_query_as::<FilmRow>()
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(FilmRow::into_record).collect()
    }

    #[tracing::instrument(skip(self, film), fields(id = %film.id, title = %film.fields.title))]
    async fn insert(&self, film: NewFilm) -> StoreResult<FilmRecord> {
        let NewFilm { id, fields } = film;

        let row = sqlx::query_as::<_, FilmRow>(&format!(
            r#"
            INSERT INTO films (id, version, title, rating, genre, studio, price, discount,
                               available, release_date, description, website, cast_members,
                               director, runtime_minutes)
            VALUES ($1, 0, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {FILM_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(fields.title)
        .bind(fields.rating)
        .bind(fields.genre.map(|g| g.as_str()))
        .bind(fields.studio.as_str())
        .bind(fields.price)
        .bind(fields.discount)
        .bind(fields.available)
        .bind(fields.release_date)
        .bind(fields.description)
        .bind(fields.website)
        .bind(fields.cast)
        .bind(fields.director)
        .bind(fields.runtime_minutes)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)?;

        row.into_record()
    }

    #[tracing::instrument(skip(self, fields))]
    async fn conditional_update(
        &self,
        id: Uuid,
        max_version: i64,
        fields: FilmFields,
    ) -> StoreResult<Option<FilmRecord>> {
        let row = sqlx::query_as::<_, FilmRow>(&format!(
            r#"
            UPDATE films
            SET version = version + 1,
                title = $3, rating = $4, genre = $5, studio = $6, price = $7, discount = $8,
                available = $9, release_date = $10, website = $11, cast_members = $12,
                director = $13, runtime_minutes = $14, updated_at = NOW()
            WHERE id = $1 AND version <= $2
            RETURNING {FILM_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(max_version)
        .bind(fields.title)
        .bind(fields.rating)
        .bind(fields.genre.map(|g| g.as_str()))
        .bind(fields.studio.as_str())
        .bind(fields.price)
        .bind(fields.discount)
        .bind(fields.available)
        .bind(fields.release_date)
        .bind(fields.website)
        .bind(fields.cast)
        .bind(fields.director)
        .bind(fields.runtime_minutes)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_write_error)?;

        row.map(FilmRow::into_record).transpose()
    }

    #[tracing::instrument(skip(self))]
    async fn delete_by_id(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM films WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
