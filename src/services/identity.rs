//! Uploader identity
//!
//! The site has no login yet. Every upload is attributed through an
//! [`IdentityProvider`], so a session-backed provider can replace the
//! placeholder without touching the upload flow.

use axum::http::HeaderMap;

/// Resolves who is submitting a request
pub trait IdentityProvider: Send + Sync {
    /// Identifier recorded as the owner of content created by this request
    fn current_user(&self, headers: &HeaderMap) -> String;
}

/// Attributes every request to one fixed user id
#[derive(Debug, Clone)]
pub struct PlaceholderIdentity {
    user_id: String,
}

impl PlaceholderIdentity {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

impl IdentityProvider for PlaceholderIdentity {
    fn current_user(&self, _headers: &HeaderMap) -> String {
        self.user_id.clone()
    }
}
