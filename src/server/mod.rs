//! HTTP server module.
//!
//! Provides the record endpoints (insert, remove, update, read), the
//! threaded /average endpoint, and the HTML form pages.

pub mod pages;
pub mod routes;

pub use routes::{build_router, serve, AppState};
