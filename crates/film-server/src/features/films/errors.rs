//! Rejections a film write can produce
//!
//! Business outcomes are plain enum variants so every adapter has to handle
//! each of them. Store failures travel separately in the `Store` variant and
//! are rendered as generic server errors.

use uuid::Uuid;

use super::validation::ValidationErrors;
use crate::db::StoreError;

/// Errors that can occur when creating a film
#[derive(Debug, thiserror::Error)]
pub enum CreateFilmError {
    /// One or more local constraints failed
    #[error("Film is invalid: {0}")]
    Invalid(ValidationErrors),
    /// Another film already uses the title
    #[error("Title '{title}' already exists")]
    TitleExists { title: String, id: Option<Uuid> },
    /// The store could not be reached or returned garbage
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl CreateFilmError {
    pub fn is_business_rejection(&self) -> bool {
        !matches!(self, Self::Store(_))
    }
}

/// Errors that can occur when updating a film
#[derive(Debug, thiserror::Error)]
pub enum UpdateFilmError {
    /// The version token is absent or not a non-negative integer
    #[error("Version token {} is not valid", display_token(.token))]
    VersionMalformed { token: Option<String> },
    #[error("Film is invalid: {0}")]
    Invalid(ValidationErrors),
    /// Title belongs to another film
    #[error("{}", title_exists_message(.title, .id))]
    TitleExists { title: String, id: Option<Uuid> },
    /// No film with this id exists
    #[error("{}", not_found_message(.id))]
    NotFound { id: Option<String> },
    /// Supplied version is older than the stored one
    #[error("Version {version} of film {id} is outdated")]
    VersionStale { id: Uuid, version: i64 },
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl UpdateFilmError {
    pub fn is_business_rejection(&self) -> bool {
        !matches!(self, Self::Store(_))
    }

    /// Stable tag shared by every adapter.
    pub fn code(&self) -> &'static str {
        match self {
            Self::VersionMalformed { .. } => "VERSION_MALFORMED",
            Self::Invalid(_) => "VALIDATION_ERROR",
            Self::TitleExists { .. } => "TITLE_EXISTS",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::VersionStale { .. } => "VERSION_STALE",
            Self::Store(_) => "INTERNAL_ERROR",
        }
    }
}

fn display_token(token: &Option<String>) -> String {
    match token {
        Some(t) => format!("'{t}'"),
        None => "(missing)".to_string(),
    }
}

fn title_exists_message(title: &str, id: &Option<Uuid>) -> String {
    match id {
        Some(id) => format!("Title '{title}' already exists at film {id}"),
        None => format!("Title '{title}' already exists"),
    }
}

fn not_found_message(id: &Option<String>) -> String {
    match id {
        Some(id) => format!("No film with id {id} exists"),
        None => "No film id was given".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_error_messages() {
        let id = Uuid::nil();
        assert_eq!(
            UpdateFilmError::VersionMalformed { token: Some("abc".into()) }.to_string(),
            "Version token 'abc' is not valid"
        );
        assert_eq!(
            UpdateFilmError::VersionMalformed { token: None }.to_string(),
            "Version token (missing) is not valid"
        );
        assert_eq!(
            UpdateFilmError::TitleExists { title: "Alpha".into(), id: Some(id) }.to_string(),
            format!("Title 'Alpha' already exists at film {id}")
        );
        assert_eq!(
            UpdateFilmError::NotFound { id: None }.to_string(),
            "No film id was given"
        );
        assert_eq!(
            UpdateFilmError::VersionStale { id, version: 0 }.to_string(),
            format!("Version 0 of film {id} is outdated")
        );
    }

    #[test]
    fn test_store_faults_are_not_business_rejections() {
        let fault = UpdateFilmError::Store(StoreError::Unavailable("down".into()));
        assert!(!fault.is_business_rejection());
        assert_eq!(fault.code(), "INTERNAL_ERROR");
        assert!(CreateFilmError::TitleExists { title: "A".into(), id: None }
            .is_business_rejection());
    }
}
