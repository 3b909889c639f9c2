//! Demo catalog for local development
//!
//! Loaded into the in-memory store when the server starts with `--seed`.

use chrono::{NaiveDate, TimeZone, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::features::films::model::{FilmFields, FilmRecord, Genre, Studio};

struct DemoFilm {
    id: u128,
    title: &'static str,
    rating: f64,
    genre: Genre,
    studio: Studio,
    price: f64,
    discount: f64,
    day: u32,
    description: &'static str,
    website: &'static str,
    runtime_minutes: i32,
}

const DEMO_FILMS: [DemoFilm; 5] = [
    DemoFilm {
        id: 1,
        title: "Alpha",
        rating: 4.0,
        genre: Genre::Documentary,
        studio: Studio::Disney,
        price: 11.1,
        discount: 0.011,
        day: 1,
        description: "Documentary about the animals of Africa",
        website: "https://acme.at/",
        runtime_minutes: 100,
    },
    DemoFilm {
        id: 2,
        title: "Beta",
        rating: 2.0,
        genre: Genre::Horror,
        studio: Studio::WarnerBros,
        price: 22.2,
        discount: 0.022,
        day: 2,
        description: "Horror film rated 18",
        website: "https://acme.biz/",
        runtime_minutes: 105,
    },
    DemoFilm {
        id: 3,
        title: "Gamma",
        rating: 1.0,
        genre: Genre::Comedy,
        studio: Studio::Universal,
        price: 33.3,
        discount: 0.033,
        day: 3,
        description: "Comedy without a single joke",
        website: "https://acme.com/",
        runtime_minutes: 99,
    },
    DemoFilm {
        id: 4,
        title: "Delta",
        rating: 3.0,
        genre: Genre::Documentary,
        studio: Studio::Disney,
        price: 44.4,
        discount: 0.044,
        day: 4,
        description: "Documentary about the ages of the earth",
        website: "https://acme.de/",
        runtime_minutes: 62,
    },
    DemoFilm {
        id: 5,
        title: "Epsilon",
        rating: 2.0,
        genre: Genre::Horror,
        studio: Studio::WarnerBros,
        price: 55.5,
        discount: 0.055,
        day: 5,
        description: "Horror film rated 18, part two",
        website: "https://acme.es/",
        runtime_minutes: 111,
    },
];

/// The five demo films with fixed ids `00000000-0000-0000-0000-00000000000N`.
pub fn demo_films() -> Vec<FilmRecord> {
    let loaded_at = Utc
        .with_ymd_and_hms(2020, 2, 1, 0, 0, 0)
        .single()
        .unwrap_or_else(Utc::now);

    DEMO_FILMS
        .iter()
        .map(|demo| FilmRecord {
            id: Uuid::from_u128(demo.id),
            version: 0,
            fields: FilmFields {
                title: demo.title.to_string(),
                rating: Some(demo.rating),
                genre: Some(demo.genre),
                studio: demo.studio,
                price: demo.price,
                discount: Some(demo.discount),
                available: Some(true),
                release_date: NaiveDate::from_ymd_opt(2020, 2, demo.day),
                description: demo.description.to_string(),
                website: Some(demo.website.to_string()),
                cast: vec![],
                director: Some(json!([{ "last_name": "Bond", "first_name": "James" }])),
                runtime_minutes: Some(demo.runtime_minutes),
            },
            created_at: loaded_at,
            updated_at: loaded_at,
        })
        .collect()
}
