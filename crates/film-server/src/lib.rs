//! Film Catalog Server Library
//!
//! HTTP backend for a catalog of films.
//!
//! # Overview
//!
//! - **REST API**: `/api/v1/films`, with entity tags for optimistic concurrency
//! - **GraphQL API**: `/api/v1/graphql`, the same operations as a schema
//! - **Attachments**: one binary file per film in S3-compatible storage
//! - **Persistence**: PostgreSQL via SQLx, or process memory for development
//!
//! # Architecture
//!
//! The server follows a **CQRS (Command Query Responsibility Segregation)** layout:
//!
//! - **Commands** (write operations): create, update and delete films, upload files
//! - **Queries** (read operations): get and list films, download files
//!
//! Every update names the version the client last saw. The store applies it
//! only if no other update got there first and bumps the version by one.
//!
//! # Example
//!
//! ```no_run
//! use film_server::{api, config::Config};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = Config::load()?;
//! let app = api::create_router(api::AppState::in_memory(true), &config);
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:8000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod cqrs;
pub mod db;
pub mod error;
pub mod features;
pub mod middleware;
pub mod storage;

// Re-export commonly used types
pub use error::{ServerError, ServerResult};
