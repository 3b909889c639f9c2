//! Film API routes
//!
//! # Route Structure
//!
//! - `GET /api/v1/films` - List films matching the query criteria
//! - `GET /api/v1/films/:id` - Get a single film, with `ETag`
//! - `POST /api/v1/films` - Create a new film
//! - `PUT /api/v1/films/:id` - Update a film (`If-Match` required)
//! - `DELETE /api/v1/films/:id` - Delete a film
//!
//! The entity tag of a film is its version in double quotes, e.g. `"3"`.

use crate::api::response::{ApiResponse, ErrorResponse};
use crate::db::SharedFilmStore;
use crate::features::FeatureState;
use crate::storage::SharedBlobStore;
use axum::{
    body::Bytes,
    extract::{OriginalUri, Path, Query, State},
    http::{
        header::{ETAG, IF_MATCH, IF_NONE_MATCH, LOCATION},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use super::{
    commands::{CreateFilmCommand, DeleteFilmCommand, DeleteFilmError, UpdateFilmCommand},
    errors::{CreateFilmError, UpdateFilmError},
    model::FilmDraft,
    queries::{GetFilmError, GetFilmQuery, ListFilmsError, ListFilmsQuery},
};

// ============================================================================
// Router Configuration
// ============================================================================

/// Creates the films router with all routes configured
///
/// ```rust,ignore
/// let app = Router::new()
///     .nest("/api/v1/films", films_routes())
///     .with_state(feature_state);
/// ```
pub fn films_routes() -> Router<FeatureState> {
    Router::new()
        .route("/", get(list_films).post(create_film))
        .route("/:id", get(get_film).put(update_film).delete(delete_film))
}

/// Strips the quotes of an entity tag; weak tags are taken at face value.
fn version_token(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(IF_MATCH)?.to_str().ok()?.trim();
    let raw = raw.strip_prefix("W/").unwrap_or(raw);
    let token = raw
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(raw);
    Some(token.to_string())
}

fn etag_header(version: i64) -> Option<HeaderValue> {
    HeaderValue::from_str(&format!("\"{version}\"")).ok()
}

// ============================================================================
// Command Handlers (Write Operations)
// ============================================================================

/// Create a new film
///
/// # Response
///
/// - `201 Created` - `Location` points at the new film
/// - `400 Bad Request` - Validation error (including fields of the wrong JSON
///   type) or title already taken
/// - `500 Internal Server Error` - Store error
#[tracing::instrument(skip(store, body), fields(size = body.len()))]
async fn create_film(
    State(store): State<SharedFilmStore>,
    OriginalUri(uri): OriginalUri,
    body: Bytes,
) -> Result<Response, FilmApiError> {
    let command = CreateFilmCommand {
        draft: FilmDraft::from_json_slice(&body),
    };
    let response = super::commands::create::handle(store, command).await?;

    tracing::info!(film_id = %response.id, "Film created via API");

    let location = format!("{}/{}", uri.path().trim_end_matches('/'), response.id);
    let mut http_response = (StatusCode::CREATED, Json(ApiResponse::success(response)))
        .into_response();
    if let Ok(value) = HeaderValue::from_str(&location) {
        http_response.headers_mut().insert(LOCATION, value);
    }
    Ok(http_response)
}

/// Update an existing film
///
/// The `If-Match` header carries the version the client last saw. It is
/// checked before the body, so a bad body never masks a missing version.
///
/// # Response
///
/// - `204 No Content` - `ETag` holds the new version
/// - `400 Bad Request` - Validation error or title already taken
/// - `412 Precondition Failed` - Film missing or version outdated
/// - `428 Precondition Required` - `If-Match` missing or malformed
#[tracing::instrument(skip(store, headers, body), fields(id = %id))]
async fn update_film(
    State(store): State<SharedFilmStore>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, FilmApiError> {
    let draft = FilmDraft::from_json_slice(&body);
    let command = UpdateFilmCommand::new(id, version_token(&headers), draft);

    let response = super::commands::update::handle(store, command).await?;

    tracing::info!(
        film_id = %response.id,
        version = response.version,
        "Film updated via API"
    );

    let mut http_response = StatusCode::NO_CONTENT.into_response();
    if let Some(etag) = etag_header(response.version) {
        http_response.headers_mut().insert(ETAG, etag);
    }
    Ok(http_response)
}

/// Delete a film
///
/// Always `204 No Content`, whether or not the film existed. The film's
/// attachments go with it.
#[tracing::instrument(skip(store, blobs), fields(id = %id))]
async fn delete_film(
    State(store): State<SharedFilmStore>,
    State(blobs): State<SharedBlobStore>,
    Path(id): Path<String>,
) -> Result<Response, FilmApiError> {
    let Ok(id) = Uuid::parse_str(&id) else {
        tracing::debug!("Film id is not a UUID, nothing to delete");
        return Ok(StatusCode::NO_CONTENT.into_response());
    };

    let response = super::commands::delete::handle(store, blobs, DeleteFilmCommand { id }).await?;

    tracing::debug!(film_id = %response.id, deleted = response.deleted, "Film delete via API");

    Ok(StatusCode::NO_CONTENT.into_response())
}

// ============================================================================
// Query Handlers (Read Operations)
// ============================================================================

/// Get a single film by id
///
/// # Response
///
/// - `200 OK` - Film found, `ETag` set
/// - `304 Not Modified` - `If-None-Match` equals the current `ETag`
/// - `404 Not Found` - No such film
#[tracing::instrument(skip(store, headers), fields(id = %id))]
async fn get_film(
    State(store): State<SharedFilmStore>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, FilmApiError> {
    let film = super::queries::get::handle(store, GetFilmQuery { id }).await?;
    let etag = film.etag();

    let unchanged = headers
        .get(IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim() == etag);

    let mut response = if unchanged {
        tracing::debug!(film_id = %film.id, "Film not modified");
        StatusCode::NOT_MODIFIED.into_response()
    } else {
        (StatusCode::OK, Json(ApiResponse::success(film))).into_response()
    };
    if let Ok(value) = HeaderValue::from_str(&etag) {
        response.headers_mut().insert(ETAG, value);
    }
    Ok(response)
}

/// List films
///
/// # Endpoint
///
/// `GET /api/v1/films?title=alp&genre=HORROR&studio=DISNEY&available=true&rating=4`
///
/// # Response
///
/// - `200 OK` - Films sorted by title
/// - `404 Not Found` - Nothing matched
#[tracing::instrument(skip(store))]
async fn list_films(
    State(store): State<SharedFilmStore>,
    Query(query): Query<ListFilmsQuery>,
) -> Result<Response, FilmApiError> {
    let films = super::queries::list::handle(store, query).await?;

    if films.is_empty() {
        return Err(FilmApiError::NoMatch);
    }

    tracing::debug!(count = films.len(), "Films listed via API");

    Ok((StatusCode::OK, Json(ApiResponse::success(films))).into_response())
}

// ============================================================================
// Error Handling
// ============================================================================

/// Unified error type for film API endpoints
#[derive(Debug)]
enum FilmApiError {
    CreateError(CreateFilmError),
    UpdateError(UpdateFilmError),
    DeleteError(DeleteFilmError),
    GetError(GetFilmError),
    ListError(ListFilmsError),
    NoMatch,
}

impl From<CreateFilmError> for FilmApiError {
    fn from(err: CreateFilmError) -> Self {
        Self::CreateError(err)
    }
}

impl From<UpdateFilmError> for FilmApiError {
    fn from(err: UpdateFilmError) -> Self {
        Self::UpdateError(err)
    }
}

impl From<DeleteFilmError> for FilmApiError {
    fn from(err: DeleteFilmError) -> Self {
        Self::DeleteError(err)
    }
}

impl From<GetFilmError> for FilmApiError {
    fn from(err: GetFilmError) -> Self {
        Self::GetError(err)
    }
}

impl From<ListFilmsError> for FilmApiError {
    fn from(err: ListFilmsError) -> Self {
        Self::ListError(err)
    }
}

fn validation_details(errors: &super::validation::ValidationErrors) -> serde_json::Value {
    serde_json::to_value(errors).unwrap_or_default()
}

fn internal_error(context: &str, err: &dyn std::fmt::Display) -> Response {
    tracing::error!("Store error during {}: {}", context, err);
    let error = ErrorResponse::new("INTERNAL_ERROR", "A database error occurred");
    (StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response()
}

impl IntoResponse for FilmApiError {
    fn into_response(self) -> Response {
        let (status, error) = match &self {
            // Create errors
            FilmApiError::CreateError(CreateFilmError::Invalid(errors)) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::with_details(
                    "VALIDATION_ERROR",
                    self.to_string(),
                    validation_details(errors),
                ),
            ),
            FilmApiError::CreateError(CreateFilmError::TitleExists { .. }) => {
                (StatusCode::BAD_REQUEST, ErrorResponse::new("TITLE_EXISTS", self.to_string()))
            },
            FilmApiError::CreateError(CreateFilmError::Store(e)) => {
                return internal_error("film creation", e)
            },

            // Update errors
            FilmApiError::UpdateError(UpdateFilmError::Store(e)) => {
                return internal_error("film update", e)
            },
            FilmApiError::UpdateError(err) => {
                let status = match err {
                    UpdateFilmError::VersionMalformed { .. } => StatusCode::PRECONDITION_REQUIRED,
                    UpdateFilmError::Invalid(_) | UpdateFilmError::TitleExists { .. } => {
                        StatusCode::BAD_REQUEST
                    },
                    UpdateFilmError::NotFound { .. } | UpdateFilmError::VersionStale { .. } => {
                        StatusCode::PRECONDITION_FAILED
                    },
                    UpdateFilmError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                let error = match err {
                    UpdateFilmError::Invalid(errors) => ErrorResponse::with_details(
                        err.code(),
                        err.to_string(),
                        validation_details(errors),
                    ),
                    _ => ErrorResponse::new(err.code(), err.to_string()),
                };
                (status, error)
            },

            // Delete errors
            FilmApiError::DeleteError(DeleteFilmError::Store(e)) => {
                return internal_error("film deletion", e)
            },
            FilmApiError::DeleteError(DeleteFilmError::Blob(e)) => {
                return internal_error("film file deletion", e)
            },

            // Get errors
            FilmApiError::GetError(GetFilmError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, ErrorResponse::new("NOT_FOUND", self.to_string()))
            },
            FilmApiError::GetError(GetFilmError::Store(e)) => {
                return internal_error("film retrieval", e)
            },

            // List errors
            FilmApiError::ListError(ListFilmsError::Store(e)) => {
                return internal_error("films listing", e)
            },
            FilmApiError::NoMatch => (
                StatusCode::NOT_FOUND,
                ErrorResponse::new("NOT_FOUND", self.to_string()),
            ),
        };

        tracing::debug!(status = %status, "Film request rejected: {}", self);
        (status, Json(error)).into_response()
    }
}

impl std::fmt::Display for FilmApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CreateError(e) => write!(f, "{}", e),
            Self::UpdateError(e) => write!(f, "{}", e),
            Self::DeleteError(e) => write!(f, "{}", e),
            Self::GetError(e) => write!(f, "{}", e),
            Self::ListError(e) => write!(f, "{}", e),
            Self::NoMatch => write!(f, "No film matches the query"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::StoreError;

    fn if_match(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(IF_MATCH, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_version_token_strips_quotes() {
        assert_eq!(version_token(&if_match("\"3\"")).as_deref(), Some("3"));
        assert_eq!(version_token(&if_match("W/\"3\"")).as_deref(), Some("3"));
        assert_eq!(version_token(&if_match("3")).as_deref(), Some("3"));
        assert_eq!(version_token(&if_match("\"abc\"")).as_deref(), Some("abc"));
        assert_eq!(version_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_update_error_statuses() {
        let cases = [
            (UpdateFilmError::VersionMalformed { token: None }, StatusCode::PRECONDITION_REQUIRED),
            (UpdateFilmError::NotFound { id: None }, StatusCode::PRECONDITION_FAILED),
            (
                UpdateFilmError::VersionStale { id: Uuid::nil(), version: 0 },
                StatusCode::PRECONDITION_FAILED,
            ),
            (
                UpdateFilmError::TitleExists { title: "Alpha".into(), id: None },
                StatusCode::BAD_REQUEST,
            ),
            (
                UpdateFilmError::Store(StoreError::Unavailable("down".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(FilmApiError::from(err).into_response().status(), status);
        }
    }

    #[test]
    fn test_empty_list_is_not_found() {
        assert_eq!(FilmApiError::NoMatch.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_routes_structure() {
        let router = films_routes();
        assert!(format!("{:?}", router).contains("Router"));
    }
}
