//! Film Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Pieces shared by the film catalog crates:
//!
//! - **Error Handling**: [`FilmCommonError`] and its `Result` alias
//! - **Logging**: subscriber configuration for every binary
//! - **Checksums**: content digests for stored attachments

pub mod checksum;
pub mod error;
pub mod logging;

pub use error::{FilmCommonError, Result};
