//! HTTP routes for the catalog module.

mod authors;
mod books;
mod dashboard;
mod genres;
mod instances;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use catalog_kernel::settings::CatalogSettings;
use catalog_kernel::Clock;
use chrono::NaiveDate;

use super::repository::CatalogRepository;

/// State shared by every catalog handler.
#[derive(Clone)]
pub struct CatalogState {
    pub repo: CatalogRepository,
    pub clock: Arc<dyn Clock>,
    pub settings: CatalogSettings,
}

impl CatalogState {
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }
}

pub fn router(state: CatalogState) -> Router {
    Router::new()
        .route("/", get(dashboard::index))
        .route("/genres", get(genres::list).post(genres::create))
        .route("/books", get(books::list).post(books::create))
        .route("/books/{id}", get(books::detail).delete(books::delete))
        .route("/authors", get(authors::list).post(authors::create))
        .route(
            "/authors/{id}",
            get(authors::detail)
                .put(authors::update)
                .delete(authors::delete),
        )
        .route("/bookinstances", post(instances::create))
        .route(
            "/bookinstances/{id}",
            get(instances::detail).put(instances::update),
        )
        .route(
            "/bookinstances/{id}/renew",
            get(instances::renew_form).post(instances::renew),
        )
        .route("/mybooks", get(instances::my_books))
        .route("/borrowed", get(instances::all_borrowed))
        .with_state(state)
}
