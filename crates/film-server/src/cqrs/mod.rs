pub use mediator::DefaultAsyncMediator;

use crate::db::SharedFilmStore;
use crate::storage::SharedBlobStore;

pub mod middleware;

pub type AppMediator = DefaultAsyncMediator;

pub fn build_mediator(films: SharedFilmStore, blobs: SharedBlobStore) -> AppMediator {
    DefaultAsyncMediator::builder()
        // Films
        .add_handler({
            let films = films.clone();
            move |cmd| {
                let films = films.clone();
                async move { crate::features::films::commands::create::handle(films, cmd).await }
            }
        })
        .add_handler({
            let films = films.clone();
            move |cmd| {
                let films = films.clone();
                async move { crate::features::films::commands::update::handle(films, cmd).await }
            }
        })
        .add_handler({
            let films = films.clone();
            let blobs = blobs.clone();
            move |cmd| {
                let films = films.clone();
                let blobs = blobs.clone();
                async move { crate::features::films::commands::delete::handle(films, blobs, cmd).await }
            }
        })
        .add_handler({
            let films = films.clone();
            move |query| {
                let films = films.clone();
                async move { crate::features::films::queries::get::handle(films, query).await }
            }
        })
        .add_handler({
            let films = films.clone();
            move |query| {
                let films = films.clone();
                async move { crate::features::films::queries::list::handle(films, query).await }
            }
        })
        // Files
        .add_handler({
            let films = films.clone();
            let blobs = blobs.clone();
            move |cmd| {
                let films = films.clone();
                let blobs = blobs.clone();
                async move { crate::features::files::commands::upload::handle(films, blobs, cmd).await }
            }
        })
        .add_handler({
            let films = films.clone();
            let blobs = blobs.clone();
            move |query| {
                let films = films.clone();
                let blobs = blobs.clone();
                async move { crate::features::files::queries::download::handle(films, blobs, query).await }
            }
        })
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::seed::demo_films;
    use crate::db::InMemoryFilmStore;
    use crate::features::films::{Film, ListFilmsError, ListFilmsQuery};
    use crate::storage::InMemoryBlobStore;
    use mediator::AsyncMediator;
    use std::sync::Arc;

    #[tokio::test(flavor = "multi_thread")]
    async fn test_mediator_dispatches_queries() {
        let films: SharedFilmStore = Arc::new(InMemoryFilmStore::with_records(demo_films()));
        let blobs: SharedBlobStore = Arc::new(InMemoryBlobStore::new());
        let mut mediator = build_mediator(films, blobs);

        let result: Result<Vec<Film>, ListFilmsError> =
            mediator.send(ListFilmsQuery::default()).await.unwrap();

        assert_eq!(result.unwrap().len(), 5);
    }
}
