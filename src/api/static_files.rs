//! Static file serving
//!
//! Stylesheets and other assets are embedded in the binary and served under
//! `/static/`. The active theme directory may provide a `static/` folder
//! whose files take precedence.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use rust_embed::RustEmbed;
use std::path::{Component, Path as FsPath, PathBuf};

use crate::api::middleware::AppState;

/// Embedded default assets
#[derive(RustEmbed)]
#[folder = "static/"]
struct DefaultAssets;

/// GET /static/{*path}
pub async fn serve_static(State(state): State<AppState>, Path(path): Path<String>) -> Response {
    if !is_plain_relative(&path) {
        return StatusCode::NOT_FOUND.into_response();
    }

    if let Some(theme_dir) = state.theme_engine.theme_dir() {
        if let Some(file) = resolve_theme_asset(&theme_dir.join("static"), &path).await {
            if let Ok(contents) = tokio::fs::read(&file).await {
                return build_response(&path, contents);
            }
        }
    }

    match DefaultAssets::get(&path) {
        Some(content) => build_response(&path, content.data.into_owned()),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Only plain `name/name` paths are served: no root, prefix, `.` or `..`.
fn is_plain_relative(path: &str) -> bool {
    !path.is_empty()
        && FsPath::new(path)
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
}

/// Resolve `path` under `static_dir`, following symlinks, and refuse
/// anything that lands outside it.
async fn resolve_theme_asset(static_dir: &FsPath, path: &str) -> Option<PathBuf> {
    let root = tokio::fs::canonicalize(static_dir).await.ok()?;
    let file = tokio::fs::canonicalize(root.join(path)).await.ok()?;
    file.starts_with(&root).then_some(file)
}

fn build_response(path: &str, data: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, get_content_type(path)),
            (header::CACHE_CONTROL, "public, max-age=3600"),
        ],
        Body::from(data),
    )
        .into_response()
}

/// Get content type from file extension
fn get_content_type(path: &str) -> &'static str {
    match path.rsplit('.').next().unwrap_or("") {
        "css" => "text/css",
        "js" => "application/javascript",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "webp" => "image/webp",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        _ => "application/octet-stream",
    }
}
