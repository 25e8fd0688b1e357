//! API layer - HTTP handlers and routing
//!
//! Routes:
//! - `GET /` - listing of approved content
//! - `GET /content/{slug}` - single item
//! - `GET /upload`, `POST /upload` - upload form
//! - `GET /static/{*path}` - stylesheet and assets

pub mod flash;
pub mod middleware;
pub mod pages;
pub mod responses;
pub mod static_files;
pub mod upload;

#[cfg(test)]
mod tests;

use axum::{extract::DefaultBodyLimit, routing::get, Router};
use tower_http::trace::TraceLayer;

pub use middleware::{AppState, PageError};

/// Room for the text fields and multipart framing on top of the file itself
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// Build the complete router with middleware
pub fn build_router(state: AppState, max_file_size: u64) -> Router {
    let body_limit = usize::try_from(max_file_size)
        .unwrap_or(usize::MAX)
        .saturating_add(FORM_OVERHEAD_BYTES);

    Router::new()
        .route("/", get(pages::index))
        .route("/content/{slug}", get(pages::single_content))
        .route("/upload", get(upload::upload_form).post(upload::submit_upload))
        .route("/static/{*path}", get(static_files::serve_static))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
