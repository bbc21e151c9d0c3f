//! Library catalog: genres, authors, books, physical copies and loan renewals.

pub mod models;
pub mod renewal;
pub mod repository;

mod openapi;
mod routes;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use catalog_kernel::{AppContext, InitCtx, Migration, Module};

use repository::CatalogRepository;
use routes::CatalogState;

const INIT_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS genres (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS authors (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    date_of_birth TEXT,
    date_of_death TEXT
);

CREATE TABLE IF NOT EXISTS books (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    author_id INTEGER REFERENCES authors(id) ON DELETE SET NULL,
    summary TEXT NOT NULL,
    isbn TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS book_genres (
    book_id INTEGER NOT NULL REFERENCES books(id) ON DELETE CASCADE,
    genre_id INTEGER NOT NULL REFERENCES genres(id) ON DELETE CASCADE,
    PRIMARY KEY (book_id, genre_id)
);

CREATE TABLE IF NOT EXISTS book_instances (
    id TEXT PRIMARY KEY NOT NULL,
    book_id INTEGER REFERENCES books(id) ON DELETE SET NULL,
    imprint TEXT NOT NULL,
    due_back TEXT,
    borrower_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
    status TEXT NOT NULL DEFAULT 'm' CHECK (status IN ('m', 'o', 'a', 'r'))
);

CREATE INDEX IF NOT EXISTS idx_books_author ON books(author_id);
CREATE INDEX IF NOT EXISTS idx_book_instances_book ON book_instances(book_id);
CREATE INDEX IF NOT EXISTS idx_book_instances_due_back ON book_instances(due_back);
"#;

pub struct CatalogModule;

impl CatalogModule {
    pub const fn new() -> Self {
        Self
    }
}

impl Default for CatalogModule {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Module for CatalogModule {
    fn name(&self) -> &'static str {
        "catalog"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            book_page_size = ctx.settings.catalog.book_page_size,
            borrowed_page_size = ctx.settings.catalog.borrowed_page_size,
            "catalog module initialized"
        );
        Ok(())
    }

    fn routes(&self, ctx: &AppContext) -> Router {
        routes::router(CatalogState {
            repo: CatalogRepository::new(ctx.db.clone()),
            clock: ctx.clock.clone(),
            settings: ctx.settings.catalog.clone(),
        })
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(openapi::document())
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_init",
            up: INIT_SQL,
        }]
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "catalog module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "catalog module stopped");
        Ok(())
    }
}

pub fn create_module() -> Arc<dyn Module> {
    Arc::new(CatalogModule::new())
}
