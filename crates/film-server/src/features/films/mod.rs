//! Film catalog feature
//!
//! - `model` - entity shapes and the closed genre/studio sets
//! - `validation` - local constraints on a draft
//! - `errors` - business rejections of the write path
//! - `commands/` - create, update (optimistic concurrency), delete
//! - `queries/` - get by id, list with criteria
//! - `routes.rs` - REST adapter
//! - `graphql.rs` - GraphQL adapter

pub mod commands;
pub mod errors;
pub mod graphql;
pub mod model;
pub mod queries;
pub mod routes;
pub mod validation;

pub use commands::{
    CreateFilmCommand, CreateFilmResponse, DeleteFilmCommand, DeleteFilmError,
    DeleteFilmResponse, UpdateFilmCommand, UpdateFilmResponse,
};
pub use errors::{CreateFilmError, UpdateFilmError};
pub use graphql::{build_schema, FilmSchema};
pub use model::{Film, FilmDraft, FilmFields, FilmFilter, FilmRecord, Genre, NewFilm, Studio};
pub use queries::{GetFilmError, GetFilmQuery, ListFilmsError, ListFilmsQuery};
pub use routes::films_routes;
pub use validation::{validate, ValidationErrors};
