//! Shared handler state and page errors

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use std::sync::Arc;

use crate::api::flash::FlashSigner;
use crate::services::{ContentService, IdentityProvider};
use crate::theme::ThemeEngine;

/// Application state shared across handlers.
///
/// Every process-wide collaborator is constructed once in `main` (or a test)
/// and passed in here; handlers hold no other state.
#[derive(Clone)]
pub struct AppState {
    pub content_service: Arc<ContentService>,
    pub theme_engine: Arc<ThemeEngine>,
    pub flash: Arc<FlashSigner>,
    pub identity: Arc<dyn IdentityProvider>,
}

/// Error response for page handlers
#[derive(Debug)]
pub enum PageError {
    /// Bare 404 with an empty body
    NotFound,
    /// 500 with a minimal HTML page
    Internal(String),
}

impl From<anyhow::Error> for PageError {
    fn from(error: anyhow::Error) -> Self {
        Self::Internal(format!("{:#}", error))
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND.into_response(),
            Self::Internal(message) => {
                tracing::error!("Request failed: {}", message);
                let html = ThemeEngine::simple_error_page("Internal Server Error", &message);
                (StatusCode::INTERNAL_SERVER_ERROR, Html(html)).into_response()
            }
        }
    }
}
