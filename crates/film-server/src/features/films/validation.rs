//! Local constraint checks for film drafts
//!
//! [`validate`] checks every static rule of a film independently and either
//! returns the typed [`FilmFields`] or a [`ValidationErrors`] map holding one
//! fixed message per violated field. Uniqueness and existence need the store
//! and are checked by the command handlers instead.
//!
//! Absent and `null` values are the same thing here: an optional field that
//! is missing is fine, a required one is reported. A field the request sent
//! with the wrong JSON type (see [`FilmDraft::mistyped`]) is reported with
//! that field's message.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::model::{FilmDraft, FilmFields, Genre, Studio};

pub const MAX_RATING: f64 = 5.0;

pub const TITLE_MESSAGE: &str = "A film title must start with a letter, a digit or _.";
pub const RATING_MESSAGE: &str = "A rating must be between 0 and 5.";
pub const GENRE_MESSAGE: &str =
    "The genre of a film can only be DOKUMENTATION, KOMOEDIE, DRAMA, HORROR or ACTION.";
pub const STUDIO_MESSAGE: &str =
    "The production studio of a film must be DISNEY, UNIVERSAL or WARNERBROS.";
pub const PRICE_MESSAGE: &str = "The price must be given and must not be negative.";
pub const DISCOUNT_MESSAGE: &str = "The discount must be a value between 0 and 1.";
pub const RELEASE_DATE_MESSAGE: &str = "The release date must use the format yyyy-MM-dd.";
pub const DESCRIPTION_MESSAGE: &str = "The description must start with a letter, a digit or _.";
pub const WEBSITE_MESSAGE: &str = "The URL of the website is not correct.";
pub const RUNTIME_MESSAGE: &str = "The runtime must be a non-negative number of minutes.";
pub const AVAILABLE_MESSAGE: &str = "The availability must be true or false.";
pub const CAST_MESSAGE: &str = "The cast must be a list of names.";

/// Field name to message, ordered by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Keeps the first message recorded for a field.
    pub fn add(&mut self, field: &str, message: &str) {
        self.0
            .entry(field.to_string())
            .or_insert_with(|| message.to_string());
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .0
            .iter()
            .map(|(field, message)| format!("{field}: {message}"))
            .collect::<Vec<_>>()
            .join("; ");
        f.write_str(&joined)
    }
}

/// Checks a draft against every local rule.
///
/// Never mutates its input and performs no I/O, so two calls with the same
/// draft always give the same answer.
pub fn validate(draft: &FilmDraft) -> Result<FilmFields, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    for field in &draft.mistyped {
        errors.add(field, field_message(field));
    }

    let title = match draft.title.as_deref() {
        Some(t) if starts_with_word_char(t) => Some(t.to_string()),
        _ => {
            errors.add("title", TITLE_MESSAGE);
            None
        },
    };

    let rating = draft.rating;
    if let Some(r) = rating {
        if !(r.is_finite() && (0.0..=MAX_RATING).contains(&r)) {
            errors.add("rating", RATING_MESSAGE);
        }
    }

    let genre = match draft.genre.as_deref().map(str::parse::<Genre>) {
        None => None,
        Some(Ok(g)) => Some(g),
        Some(Err(_)) => {
            errors.add("genre", GENRE_MESSAGE);
            None
        },
    };

    let studio = match draft.studio.as_deref().map(str::parse::<Studio>) {
        Some(Ok(s)) => Some(s),
        _ => {
            errors.add("studio", STUDIO_MESSAGE);
            None
        },
    };

    let price = match draft.price {
        Some(p) if p.is_finite() && p >= 0.0 => Some(p),
        _ => {
            errors.add("price", PRICE_MESSAGE);
            None
        },
    };

    let discount = draft.discount;
    if let Some(d) = discount {
        if !(d.is_finite() && d > 0.0 && d < 1.0) {
            errors.add("discount", DISCOUNT_MESSAGE);
        }
    }

    let release_date = match draft.release_date.as_deref().map(parse_date) {
        None => None,
        Some(Some(date)) => Some(date),
        Some(None) => {
            errors.add("release_date", RELEASE_DATE_MESSAGE);
            None
        },
    };

    let description = match draft.description.as_deref() {
        Some(d) if starts_with_word_char(d) => Some(d.to_string()),
        _ => {
            errors.add("description", DESCRIPTION_MESSAGE);
            None
        },
    };

    let website = draft.website.clone();
    if let Some(w) = website.as_deref() {
        if url::Url::parse(w).is_err() {
            errors.add("website", WEBSITE_MESSAGE);
        }
    }

    let runtime_minutes = match draft.runtime_minutes {
        None => None,
        Some(m) if m.fract() == 0.0 && (0.0..=f64::from(i32::MAX)).contains(&m) => Some(m as i32),
        Some(_) => {
            errors.add("runtime_minutes", RUNTIME_MESSAGE);
            None
        },
    };

    match (title, studio, price, description) {
        (Some(title), Some(studio), Some(price), Some(description)) if errors.is_empty() => {
            Ok(FilmFields {
                title,
                rating,
                genre,
                studio,
                price,
                discount,
                available: draft.available,
                release_date,
                description,
                website,
                cast: draft.cast.clone().unwrap_or_default(),
                director: draft.director.clone(),
                runtime_minutes,
            })
        },
        _ => Err(errors),
    }
}

fn field_message(field: &str) -> &'static str {
    match field {
        "title" => TITLE_MESSAGE,
        "rating" => RATING_MESSAGE,
        "genre" => GENRE_MESSAGE,
        "studio" => STUDIO_MESSAGE,
        "price" => PRICE_MESSAGE,
        "discount" => DISCOUNT_MESSAGE,
        "available" => AVAILABLE_MESSAGE,
        "release_date" => RELEASE_DATE_MESSAGE,
        "description" => DESCRIPTION_MESSAGE,
        "website" => WEBSITE_MESSAGE,
        "cast" => CAST_MESSAGE,
        _ => RUNTIME_MESSAGE,
    }
}

/// First character is an ASCII letter, digit or underscore.
fn starts_with_word_char(value: &str) -> bool {
    value
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    // chrono accepts unpadded months and days; the wire format does not
    if value.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}
