pub mod create;
pub mod delete;
pub mod update;

pub use create::{CreateFilmCommand, CreateFilmResponse};
pub use delete::{DeleteFilmCommand, DeleteFilmError, DeleteFilmResponse};
pub use update::{parse_version, UpdateFilmCommand, UpdateFilmResponse};
