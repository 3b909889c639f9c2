pub mod response;

use crate::config::{Config, StoreBackend};
use crate::db::{self, InMemoryFilmStore, PgFilmStore, SharedFilmStore};
use crate::error::ServerResult;
use crate::features;
use crate::middleware;
use crate::storage::{config::StorageConfig, InMemoryBlobStore, S3BlobStore, SharedBlobStore};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub films: SharedFilmStore,
    pub blobs: SharedBlobStore,
}

impl AppState {
    /// Both stores in process memory, optionally pre-filled with the demo films
    pub fn in_memory(seed: bool) -> Self {
        let films = if seed {
            InMemoryFilmStore::with_records(db::seed::demo_films())
        } else {
            InMemoryFilmStore::new()
        };

        Self {
            films: Arc::new(films),
            blobs: Arc::new(InMemoryBlobStore::new()),
        }
    }
}

/// Connects the configured backends, running migrations for PostgreSQL
pub async fn build_state(
    config: &Config,
    storage: StorageConfig,
    seed: bool,
) -> ServerResult<AppState> {
    match config.server.store_backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory stores; data is lost on shutdown");
            Ok(AppState::in_memory(seed))
        },
        StoreBackend::Postgres => {
            if seed {
                tracing::warn!("--seed only applies to the memory backend, ignoring");
            }

            let pool = db::create_pool(&config.database).await?;
            tracing::info!("Database connection pool established");

            sqlx::migrate!("../../migrations").run(&pool).await?;
            tracing::info!("Database migrations completed");

            let blobs = S3BlobStore::new(storage).await;

            Ok(AppState {
                films: Arc::new(PgFilmStore::new(pool)),
                blobs: Arc::new(blobs),
            })
        },
    }
}

/// Create the application router with all routes and middleware
pub fn create_router(state: AppState, config: &Config) -> Router {
    let feature_state = features::FeatureState {
        films: state.films.clone(),
        blobs: state.blobs.clone(),
    };

    Router::new()
        .route("/health", get(health_check))
        .with_state(state)
        .nest("/api/v1", features::router(feature_state))
        // Apply layers from innermost to outermost
        .layer(CompressionLayer::new())
        .layer(middleware::tracing_layer())
        .layer(middleware::cors_layer(&config.cors))
}

/// Health check handler
async fn health_check(State(state): State<AppState>) -> Result<Response, StatusCode> {
    match state.films.health_check().await {
        Ok(()) => Ok((
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "store": "connected"
            })),
        )
            .into_response()),
        Err(e) => {
            tracing::error!("Store health check failed: {:?}", e);
            Err(StatusCode::SERVICE_UNAVAILABLE)
        },
    }
}
