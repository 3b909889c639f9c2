//! Film entity model
//!
//! Three shapes of the same entity travel through the catalog:
//!
//! - [`FilmDraft`]: what a client sends. Every attribute is optional and
//!   enumerations, dates and URIs are still raw strings.
//! - [`FilmFields`]: the typed attribute set produced by the validator.
//! - [`FilmRecord`]: what the store persists, including bookkeeping
//!   timestamps. [`FilmRecord::into_film`] builds the public [`Film`] read
//!   shape, which omits them.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Closed set of genres accepted by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Genre {
    #[serde(rename = "DOKUMENTATION")]
    Documentary,
    #[serde(rename = "KOMOEDIE")]
    Comedy,
    #[serde(rename = "DRAMA")]
    Drama,
    #[serde(rename = "HORROR")]
    Horror,
    #[serde(rename = "ACTION")]
    Action,
}

impl Genre {
    pub const ALL: [Genre; 5] = [
        Genre::Documentary,
        Genre::Comedy,
        Genre::Drama,
        Genre::Horror,
        Genre::Action,
    ];

    /// Wire and storage name.
    pub fn as_str(self) -> &'static str {
        match self {
            Genre::Documentary => "DOKUMENTATION",
            Genre::Comedy => "KOMOEDIE",
            Genre::Drama => "DRAMA",
            Genre::Horror => "HORROR",
            Genre::Action => "ACTION",
        }
    }
}

impl FromStr for Genre {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Genre::ALL
            .into_iter()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed set of production studios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Studio {
    #[serde(rename = "DISNEY")]
    Disney,
    #[serde(rename = "UNIVERSAL")]
    Universal,
    #[serde(rename = "WARNERBROS")]
    WarnerBros,
}

impl Studio {
    pub const ALL: [Studio; 3] = [Studio::Disney, Studio::Universal, Studio::WarnerBros];

    pub fn as_str(self) -> &'static str {
        match self {
            Studio::Disney => "DISNEY",
            Studio::Universal => "UNIVERSAL",
            Studio::WarnerBros => "WARNERBROS",
        }
    }
}

impl FromStr for Studio {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Studio::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}

impl fmt::Display for Studio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A string that names no variant of a closed enumeration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown variant '{0}'")]
pub struct UnknownVariant(pub String);

/// Candidate film as submitted by a client.
///
/// Unknown keys, including a client-supplied `version`, are ignored on
/// deserialization so they can never reach the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilmDraft {
    /// Target id for updates; taken from the request path, never the body.
    #[serde(skip)]
    pub id: Option<String>,
    pub title: Option<String>,
    pub rating: Option<f64>,
    pub genre: Option<String>,
    pub studio: Option<String>,
    pub price: Option<f64>,
    pub discount: Option<f64>,
    pub available: Option<bool>,
    pub release_date: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
    pub cast: Option<Vec<String>>,
    pub director: Option<serde_json::Value>,
    pub runtime_minutes: Option<f64>,
    /// Fields present in the request with a JSON type the field cannot take.
    #[serde(skip)]
    pub mistyped: BTreeSet<String>,
}

impl FilmDraft {
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Reads a draft from a raw request body.
    ///
    /// Unlike plain deserialization this never fails: a field holding the
    /// wrong JSON type is left empty and listed in `mistyped`, so the
    /// validator reports it with that field's message. A body that is not a
    /// JSON object yields an empty draft.
    pub fn from_json_slice(body: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(body) {
            Ok(value) => Self::from_json(&value),
            Err(e) => {
                tracing::debug!("Request body is not JSON: {}", e);
                Self::default()
            },
        }
    }

    pub fn from_json(value: &Value) -> Self {
        let empty = Map::new();
        let object = value.as_object().unwrap_or(&empty);
        let mut mistyped = BTreeSet::new();

        let title = read_field(object, "title", &mut mistyped);
        let rating = read_field(object, "rating", &mut mistyped);
        let genre = read_field(object, "genre", &mut mistyped);
        let studio = read_field(object, "studio", &mut mistyped);
        let price = read_field(object, "price", &mut mistyped);
        let discount = read_field(object, "discount", &mut mistyped);
        let available = read_field(object, "available", &mut mistyped);
        let release_date = read_field(object, "release_date", &mut mistyped);
        let description = read_field(object, "description", &mut mistyped);
        let website = read_field(object, "website", &mut mistyped);
        let cast = read_field(object, "cast", &mut mistyped);
        let director = read_field(object, "director", &mut mistyped);
        let runtime_minutes = read_field(object, "runtime_minutes", &mut mistyped);

        Self {
            id: None,
            title,
            rating,
            genre,
            studio,
            price,
            discount,
            available,
            release_date,
            description,
            website,
            cast,
            director,
            runtime_minutes,
            mistyped,
        }
    }
}

fn read_field<T: DeserializeOwned>(
    object: &Map<String, Value>,
    name: &str,
    mistyped: &mut BTreeSet<String>,
) -> Option<T> {
    match object.get(name) {
        None | Some(Value::Null) => None,
        Some(value) => match T::deserialize(value) {
            Ok(typed) => Some(typed),
            Err(_) => {
                mistyped.insert(name.to_string());
                None
            },
        },
    }
}

/// Attribute set that passed validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilmFields {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<Genre>,
    pub studio: Studio,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_date: Option<NaiveDate>,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default)]
    pub cast: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub director: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime_minutes: Option<i32>,
}

/// Public read shape of a film.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Film {
    pub id: Uuid,
    pub version: i64,
    #[serde(flatten)]
    pub fields: FilmFields,
}

impl Film {
    /// Strong entity tag for HTTP caching and `If-Match`.
    pub fn etag(&self) -> String {
        format!("\"{}\"", self.version)
    }
}

/// Persisted film including bookkeeping columns.
#[derive(Debug, Clone, PartialEq)]
pub struct FilmRecord {
    pub id: Uuid,
    pub version: i64,
    pub fields: FilmFields,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FilmRecord {
    pub fn into_film(self) -> Film {
        Film {
            id: self.id,
            version: self.version,
            fields: self.fields,
        }
    }
}

/// Insert payload; the store sets version 0 and the timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct NewFilm {
    pub id: Uuid,
    pub fields: FilmFields,
}

/// Read criteria. Every populated field narrows the result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilmFilter {
    /// Case-insensitive substring of the title.
    pub title: Option<String>,
    pub genre: Option<Genre>,
    pub studio: Option<Studio>,
    pub available: Option<bool>,
    pub rating: Option<f64>,
}

impl FilmFilter {
    pub fn is_empty(&self) -> bool {
        self == &FilmFilter::default()
    }

    /// In-process evaluation, shared by the memory store and tests.
    pub fn matches(&self, fields: &FilmFields) -> bool {
        if let Some(title) = &self.title {
            if !fields.title.to_lowercase().contains(&title.to_lowercase()) {
                return false;
            }
        }
        if self.genre.is_some() && fields.genre != self.genre {
            return false;
        }
        if let Some(studio) = self.studio {
            if fields.studio != studio {
                return false;
            }
        }
        if self.available.is_some() && fields.available != self.available {
            return false;
        }
        if self.rating.is_some() && fields.rating != self.rating {
            return false;
        }
        true
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genre_wire_names() {
        assert_eq!("KOMOEDIE".parse::<Genre>().unwrap(), Genre::Comedy);
        assert_eq!(Genre::Documentary.to_string(), "DOKUMENTATION");
        assert_eq!(serde_json::to_value(Genre::Horror).unwrap(), "HORROR");
        assert!("komoedie".parse::<Genre>().is_err());
    }

    #[test]
    fn test_studio_wire_names() {
        assert_eq!("WARNERBROS".parse::<Studio>().unwrap(), Studio::WarnerBros);
        assert_eq!(
            "WARNER BROS".parse::<Studio>(),
            Err(UnknownVariant("WARNER BROS".to_string()))
        );
    }

    #[test]
    fn test_draft_ignores_client_version_and_id() {
        let draft: FilmDraft = serde_json::from_value(serde_json::json!({
            "id": "00000000-0000-0000-0000-000000000001",
            "version": 7,
            "title": "Alpha",
            "price": null
        }))
        .unwrap();

        assert_eq!(draft.id, None);
        assert_eq!(draft.title.as_deref(), Some("Alpha"));
        assert_eq!(draft.price, None);
    }

    #[test]
    fn test_draft_from_json_records_mistyped_fields() {
        let draft = FilmDraft::from_json(&serde_json::json!({
            "title": "Alpha",
            "price": "cheap",
            "available": "yes",
            "cast": ["Jane", 3],
            "runtime_minutes": 90.5,
            "rating": null,
            "version": "ignored"
        }));

        assert_eq!(draft.title.as_deref(), Some("Alpha"));
        assert_eq!(draft.price, None);
        assert_eq!(draft.runtime_minutes, Some(90.5));
        assert_eq!(draft.rating, None);
        let mistyped: Vec<_> = draft.mistyped.iter().map(String::as_str).collect();
        assert_eq!(mistyped, vec!["available", "cast", "price"]);
    }

    #[test]
    fn test_draft_from_unusable_body_is_empty() {
        assert_eq!(FilmDraft::from_json_slice(b"not json"), FilmDraft::default());
        assert_eq!(FilmDraft::from_json_slice(b"[1, 2]"), FilmDraft::default());
    }

    #[test]
    fn test_film_serializes_flat_without_timestamps() {
        let record = FilmRecord {
            id: Uuid::nil(),
            version: 3,
            fields: fixtures::fields("Alpha", "desc-A"),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let film = record.into_film();
        let json = serde_json::to_value(&film).unwrap();

        assert_eq!(json["version"], 3);
        assert_eq!(json["title"], "Alpha");
        assert_eq!(json["genre"], "DOKUMENTATION");
        assert_eq!(json["release_date"], "2020-02-01");
        assert!(json.get("created_at").is_none());
        assert!(json.get("updated_at").is_none());
        assert_eq!(film.etag(), "\"3\"");
    }

    #[test]
    fn test_filter_matches() {
        let fields = fixtures::fields("Alpha", "desc-A");

        assert!(FilmFilter::default().matches(&fields));
        assert!(FilmFilter { title: Some("ALP".into()), ..Default::default() }.matches(&fields));
        assert!(!FilmFilter { title: Some("beta".into()), ..Default::default() }.matches(&fields));
        assert!(!FilmFilter { studio: Some(Studio::Universal), ..Default::default() }
            .matches(&fields));
        assert!(FilmFilter { genre: Some(Genre::Documentary), available: Some(true), ..Default::default() }
            .matches(&fields));
    }
}
