//! Shared page responses
//!
//! Every rendered page consumes pending flash messages; every redirect after a
//! form submission carries new ones.

use axum::{
    http::{header, HeaderMap},
    response::{Html, IntoResponse, Redirect, Response},
};
use tera::Context as TeraContext;

use crate::api::flash::{cookie_header, FlashMessage};
use crate::api::middleware::AppState;

/// Render `template` with the request's flash messages added as `flashes`.
///
/// If a flash cookie came with the request, the response clears it.
pub fn render_page(state: &AppState, headers: &HeaderMap, template: &str, mut context: TeraContext) -> Response {
    let (flashes, had_cookie) = state.flash.take(headers);
    context.insert("flashes", &flashes);

    let html = state.theme_engine.render_with_fallback(template, &context);
    let mut response = Html(html).into_response();

    if had_cookie {
        if let Some(value) = cookie_header(&state.flash.clear_cookie()) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }

    response
}

/// 303 redirect to `to` carrying one flash message
pub fn redirect_with_flash(state: &AppState, to: &str, message: FlashMessage) -> Response {
    let mut response = Redirect::to(to).into_response();

    if let Some(value) = cookie_header(&state.flash.set_cookie(&[message])) {
        response.headers_mut().append(header::SET_COOKIE, value);
    }

    response
}
