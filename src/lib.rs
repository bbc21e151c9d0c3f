//! Library catalog service: genres, authors, books, copies and loan renewals
//! served over a JSON HTTP API.

pub mod app;
pub mod modules;
pub mod utils;

pub use app::Application;
