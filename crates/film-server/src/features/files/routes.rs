//! Film attachment routes
//!
//! - `PUT /api/v1/films/:id/file` - Store the raw request body as the film's file
//! - `GET /api/v1/films/:id/file` - Stream the film's file back

use crate::api::response::ErrorResponse;
use crate::features::FeatureState;
use axum::{
    body::{Body, Bytes},
    extract::{DefaultBodyLimit, Path, State},
    http::{header::CONTENT_TYPE, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::put,
    Json, Router,
};

use super::{
    commands::{UploadFileCommand, UploadFileError},
    queries::{DownloadFileError, DownloadFileQuery},
};

/// Largest accepted attachment
pub const MAX_FILE_BYTES: usize = 32 * 1024 * 1024;

pub fn files_routes() -> Router<FeatureState> {
    Router::new()
        .route("/:id/file", put(upload_file).get(download_file))
        .layer(DefaultBodyLimit::max(MAX_FILE_BYTES))
}

#[tracing::instrument(skip(state, headers, body), fields(id = %id, size = body.len()))]
async fn upload_file(
    State(state): State<FeatureState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, FileApiError> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let command = UploadFileCommand {
        film_id: id,
        content: body,
        content_type,
    };

    let response = super::commands::upload::handle(state.films, state.blobs, command).await?;

    tracing::info!(
        key = %response.key,
        size = response.size,
        checksum = ?response.checksum,
        "File uploaded via API"
    );

    Ok(StatusCode::NO_CONTENT.into_response())
}

#[tracing::instrument(skip(state), fields(id = %id))]
async fn download_file(
    State(state): State<FeatureState>,
    Path(id): Path<String>,
) -> Result<Response, FileApiError> {
    let query = DownloadFileQuery { film_id: id };

    let blob = super::queries::download::handle(state.films, state.blobs, query).await?;

    tracing::debug!(key = %blob.info.key, size = blob.info.size, "File download via API");

    let content_type = blob
        .info
        .content_type
        .as_deref()
        .and_then(|ct| HeaderValue::from_str(ct).ok())
        .unwrap_or_else(|| HeaderValue::from_static("application/octet-stream"));

    Ok((
        StatusCode::OK,
        [(CONTENT_TYPE, content_type)],
        Body::from_stream(blob.body),
    )
        .into_response())
}

#[derive(Debug)]
enum FileApiError {
    UploadError(UploadFileError),
    DownloadError(DownloadFileError),
}

impl From<UploadFileError> for FileApiError {
    fn from(err: UploadFileError) -> Self {
        Self::UploadError(err)
    }
}

impl From<DownloadFileError> for FileApiError {
    fn from(err: DownloadFileError) -> Self {
        Self::DownloadError(err)
    }
}

impl IntoResponse for FileApiError {
    fn into_response(self) -> Response {
        match self {
            FileApiError::UploadError(UploadFileError::FilmNotFound(_))
            | FileApiError::DownloadError(DownloadFileError::FilmNotFound(_)) => {
                tracing::debug!("File request for missing film: {}", self);
                let error = ErrorResponse::new("NOT_FOUND", self.to_string());
                (StatusCode::PRECONDITION_FAILED, Json(error)).into_response()
            },
            FileApiError::UploadError(UploadFileError::ContentRequired) => {
                let error = ErrorResponse::new("VALIDATION_ERROR", self.to_string());
                (StatusCode::BAD_REQUEST, Json(error)).into_response()
            },
            FileApiError::DownloadError(DownloadFileError::FileNotFound(_)) => {
                let error = ErrorResponse::new("NOT_FOUND", self.to_string());
                (StatusCode::NOT_FOUND, Json(error)).into_response()
            },
            FileApiError::DownloadError(DownloadFileError::MultipleFiles { .. }) => {
                tracing::error!("Inconsistent file storage: {}", self);
                let error = ErrorResponse::new("MULTIPLE_FILES", self.to_string());
                (StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response()
            },
            FileApiError::UploadError(UploadFileError::Store(_))
            | FileApiError::DownloadError(DownloadFileError::Store(_)) => {
                tracing::error!("Store error during file request: {}", self);
                let error = ErrorResponse::new("INTERNAL_ERROR", "A database error occurred");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response()
            },
            FileApiError::UploadError(UploadFileError::Blob(_))
            | FileApiError::DownloadError(DownloadFileError::Blob(_)) => {
                tracing::error!("Storage error during file request: {}", self);
                let error = ErrorResponse::new("STORAGE_ERROR", "A storage error occurred");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response()
            },
        }
    }
}

impl std::fmt::Display for FileApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UploadError(e) => write!(f, "{}", e),
            Self::DownloadError(e) => write!(f, "{}", e),
        }
    }
}
