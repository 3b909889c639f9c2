//! GraphQL adapter for the film catalog
//!
//! Mounted at `POST /api/v1/graphql`. Queries and mutations call the same
//! command and query handlers as the REST routes. Business rejections become
//! GraphQL errors whose `extensions.code` names the outcome:
//!
//! | code                | extra extensions      |
//! |---------------------|-----------------------|
//! | `INVALID`           | `details` (field map) |
//! | `TITLE_EXISTS`      | `title`, `id`?        |
//! | `NOT_FOUND`         | `id`?                 |
//! | `VERSION_MALFORMED` | `token`?              |
//! | `VERSION_STALE`     | `id`, `version`       |
//!
//! Store faults surface as `INTERNAL_ERROR` with a generic message.

use async_graphql::{
    Context, EmptySubscription, ErrorExtensions, InputObject, Object, Schema, SimpleObject, ID,
};
use axum::{extract::State, routing::post, Json, Router};

use super::commands::{CreateFilmCommand, DeleteFilmCommand, UpdateFilmCommand};
use super::errors::{CreateFilmError, UpdateFilmError};
use super::model::{Film, FilmDraft};
use super::queries::{GetFilmError, GetFilmQuery, ListFilmsQuery};
use super::validation::ValidationErrors;
use crate::db::SharedFilmStore;
use crate::storage::SharedBlobStore;

pub type FilmSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// Builds the schema with both store handles in its context data.
pub fn build_schema(films: SharedFilmStore, blobs: SharedBlobStore) -> FilmSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(films)
        .data(blobs)
        .finish()
}

pub fn graphql_routes() -> Router<FilmSchema> {
    Router::new().route("/graphql", post(graphql_handler))
}

#[tracing::instrument(skip_all, fields(operation = ?request.operation_name))]
async fn graphql_handler(
    State(schema): State<FilmSchema>,
    Json(request): Json<async_graphql::Request>,
) -> Json<async_graphql::Response> {
    Json(schema.execute(request).await)
}

#[derive(Debug, Clone, SimpleObject)]
#[graphql(name = "Film")]
pub struct FilmObject {
    pub id: ID,
    pub version: i64,
    pub title: String,
    pub rating: Option<f64>,
    pub genre: Option<String>,
    pub studio: String,
    pub price: f64,
    pub discount: Option<f64>,
    pub available: Option<bool>,
    pub release_date: Option<String>,
    pub description: String,
    pub website: Option<String>,
    pub cast: Vec<String>,
    pub director: Option<async_graphql::Json<serde_json::Value>>,
    pub runtime_minutes: Option<i32>,
}

impl From<Film> for FilmObject {
    fn from(film: Film) -> Self {
        let fields = film.fields;
        Self {
            id: ID(film.id.to_string()),
            version: film.version,
            title: fields.title,
            rating: fields.rating,
            genre: fields.genre.map(|g| g.to_string()),
            studio: fields.studio.to_string(),
            price: fields.price,
            discount: fields.discount,
            available: fields.available,
            release_date: fields.release_date.map(|d| d.format("%Y-%m-%d").to_string()),
            description: fields.description,
            website: fields.website,
            cast: fields.cast,
            director: fields.director.map(async_graphql::Json),
            runtime_minutes: fields.runtime_minutes,
        }
    }
}

/// Attributes of a film to create or update
#[derive(Debug, Clone, Default, InputObject)]
pub struct FilmInput {
    pub title: Option<String>,
    pub rating: Option<f64>,
    pub genre: Option<String>,
    pub studio: Option<String>,
    pub price: Option<f64>,
    pub discount: Option<f64>,
    pub available: Option<bool>,
    pub release_date: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
    pub cast: Option<Vec<String>>,
    pub director: Option<async_graphql::Json<serde_json::Value>>,
    pub runtime_minutes: Option<f64>,
}

impl From<FilmInput> for FilmDraft {
    fn from(input: FilmInput) -> Self {
        FilmDraft {
            id: None,
            title: input.title,
            rating: input.rating,
            genre: input.genre,
            studio: input.studio,
            price: input.price,
            discount: input.discount,
            available: input.available,
            release_date: input.release_date,
            description: input.description,
            website: input.website,
            cast: input.cast,
            director: input.director.map(|d| d.0),
            runtime_minutes: input.runtime_minutes,
            mistyped: Default::default(),
        }
    }
}

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// Films whose title contains `title`, sorted by title
    async fn films(
        &self,
        ctx: &Context<'_>,
        title: Option<String>,
    ) -> async_graphql::Result<Vec<FilmObject>> {
        let store = ctx.data::<SharedFilmStore>()?.clone();
        let query = ListFilmsQuery {
            title,
            ..Default::default()
        };

        let films = super::queries::list::handle(store, query)
            .await
            .map_err(|e| internal_error(&e))?;

        Ok(films.into_iter().map(FilmObject::from).collect())
    }

    async fn film(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<Option<FilmObject>> {
        let store = ctx.data::<SharedFilmStore>()?.clone();

        match super::queries::get::handle(store, GetFilmQuery { id: id.0 }).await {
            Ok(film) => Ok(Some(film.into())),
            Err(GetFilmError::NotFound(_)) => Ok(None),
            Err(err @ GetFilmError::Store(_)) => Err(internal_error(&err)),
        }
    }
}

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    /// Creates a film and returns its id
    async fn create_film(&self, ctx: &Context<'_>, input: FilmInput) -> async_graphql::Result<ID> {
        let store = ctx.data::<SharedFilmStore>()?.clone();
        let command = CreateFilmCommand {
            draft: input.into(),
        };

        match super::commands::create::handle(store, command).await {
            Ok(response) => Ok(ID(response.id.to_string())),
            Err(err) => Err(create_error(err)),
        }
    }

    /// Updates a film and returns its new version
    ///
    /// A missing `version` counts as version 0.
    async fn update_film(
        &self,
        ctx: &Context<'_>,
        id: ID,
        version: Option<i64>,
        input: FilmInput,
    ) -> async_graphql::Result<i64> {
        let store = ctx.data::<SharedFilmStore>()?.clone();
        let token = version.unwrap_or(0).to_string();
        let command = UpdateFilmCommand::new(id.0, Some(token), input.into());

        match super::commands::update::handle(store, command).await {
            Ok(response) => Ok(response.version),
            Err(err) => Err(update_error(err)),
        }
    }

    /// Deletes a film; `false` when there was nothing to delete
    async fn delete_film(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<bool> {
        let store = ctx.data::<SharedFilmStore>()?.clone();
        let blobs = ctx.data::<SharedBlobStore>()?.clone();
        let Ok(id) = uuid::Uuid::parse_str(&id) else {
            return Ok(false);
        };

        let response = super::commands::delete::handle(store, blobs, DeleteFilmCommand { id })
            .await
            .map_err(|e| internal_error(&e))?;

        Ok(response.deleted)
    }
}

fn internal_error(err: &dyn std::fmt::Display) -> async_graphql::Error {
    tracing::error!("Store error during GraphQL request: {}", err);
    async_graphql::Error::new("An internal error occurred")
        .extend_with(|_, e| e.set("code", "INTERNAL_ERROR"))
}

fn invalid(message: String, errors: &ValidationErrors) -> async_graphql::Error {
    let details = serde_json::to_value(errors)
        .ok()
        .and_then(|json| async_graphql::Value::from_json(json).ok());

    async_graphql::Error::new(message).extend_with(|_, e| {
        e.set("code", "INVALID");
        if let Some(details) = details {
            e.set("details", details);
        }
    })
}

fn create_error(err: CreateFilmError) -> async_graphql::Error {
    let message = err.to_string();
    match err {
        CreateFilmError::Invalid(errors) => {
            tracing::debug!("createFilm rejected: {}", message);
            invalid(message, &errors)
        },
        CreateFilmError::TitleExists { title, id } => {
            tracing::debug!("createFilm rejected: {}", message);
            title_exists(message, title, id)
        },
        CreateFilmError::Store(e) => internal_error(&e),
    }
}

fn title_exists(message: String, title: String, id: Option<uuid::Uuid>) -> async_graphql::Error {
    async_graphql::Error::new(message).extend_with(|_, e| {
        e.set("code", "TITLE_EXISTS");
        e.set("title", title);
        if let Some(id) = id {
            e.set("id", id.to_string());
        }
    })
}

fn update_error(err: UpdateFilmError) -> async_graphql::Error {
    let message = err.to_string();
    if err.is_business_rejection() {
        tracing::debug!("updateFilm rejected: {}", message);
    }

    match err {
        UpdateFilmError::VersionMalformed { token } => {
            async_graphql::Error::new(message).extend_with(|_, e| {
                e.set("code", "VERSION_MALFORMED");
                if let Some(token) = token {
                    e.set("token", token);
                }
            })
        },
        UpdateFilmError::Invalid(errors) => invalid(message, &errors),
        UpdateFilmError::TitleExists { title, id } => title_exists(message, title, id),
        UpdateFilmError::NotFound { id } => {
            async_graphql::Error::new(message).extend_with(|_, e| {
                e.set("code", "NOT_FOUND");
                if let Some(id) = id {
                    e.set("id", id);
                }
            })
        },
        UpdateFilmError::VersionStale { id, version } => {
            async_graphql::Error::new(message).extend_with(|_, e| {
                e.set("code", "VERSION_STALE");
                e.set("id", id.to_string());
                e.set("version", version);
            })
        },
        UpdateFilmError::Store(e) => internal_error(&e),
    }
}
