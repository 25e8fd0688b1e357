//! Public pages
//!
//! - `GET /` - approved content, newest first
//! - `GET /content/{slug}` - one item, or a bare 404

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::Response,
};
use tera::Context as TeraContext;

use crate::api::middleware::{AppState, PageError};
use crate::api::responses::render_page;

/// GET / - list approved content.
///
/// A datastore failure is logged and the page renders with no items.
pub async fn index(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let contents = match state.content_service.list_approved().await {
        Ok(contents) => contents,
        Err(e) => {
            tracing::error!("Database error while listing content: {:#}", e);
            Vec::new()
        }
    };

    let mut context = TeraContext::new();
    context.insert("contents", &contents);
    render_page(&state, &headers, "index.html", context)
}

/// GET /content/{slug} - show one item
pub async fn single_content(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    headers: HeaderMap,
) -> Result<Response, PageError> {
    let content = state
        .content_service
        .find_by_slug(&slug)
        .await?
        .ok_or(PageError::NotFound)?;

    let mut context = TeraContext::new();
    context.insert("content", &content);
    Ok(render_page(&state, &headers, "single.html", context))
}
