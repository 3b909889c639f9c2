//! Feature modules implementing the film catalog API
//!
//! Each feature is a vertical slice with its own commands, queries and
//! routes:
//!
//! - **films**: catalog entries with optimistic concurrency (REST and GraphQL)
//! - **files**: one binary attachment per film, kept in the blob store
//!
//! Commands and queries implement the mediator pattern using the `mediator`
//! crate; routes call the handlers directly.

pub mod files;
pub mod films;

use axum::{extract::FromRef, Router};

use crate::db::SharedFilmStore;
use crate::storage::SharedBlobStore;

/// Shared state for all feature routes
///
/// Handlers extract the single store they need through `FromRef`.
#[derive(Clone, FromRef)]
pub struct FeatureState {
    pub films: SharedFilmStore,
    pub blobs: SharedBlobStore,
}

/// Creates the main API router with all feature routes mounted
///
/// - `/films` - Film catalog and film files
/// - `/graphql` - GraphQL endpoint over the same catalog
pub fn router(state: FeatureState) -> Router<()> {
    let schema = films::build_schema(state.films.clone(), state.blobs.clone());

    Router::new()
        .nest(
            "/films",
            films::films_routes()
                .merge(files::files_routes())
                .with_state(state),
        )
        .merge(films::graphql::graphql_routes().with_state(schema))
}
