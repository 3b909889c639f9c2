//! Binary attachments of films, kept in the blob store
pub mod commands;
pub mod queries;
pub mod routes;

pub use commands::{UploadFileCommand, UploadFileError, UploadFileResponse};

pub use queries::{DownloadFileError, DownloadFileQuery};

pub use routes::files_routes;
