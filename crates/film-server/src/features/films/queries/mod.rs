pub mod get;
pub mod list;

pub use get::{GetFilmError, GetFilmQuery};
pub use list::{ListFilmsError, ListFilmsQuery};
