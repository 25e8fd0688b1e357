//! SQLite connection pool
//!
//! Used when `datastore.driver` is `sqlite`, for self-hosting and for tests.

use anyhow::{Context, Result};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

/// Create a SQLite connection pool from a path or `sqlite:` URL.
///
/// Parent directories of file-based databases are created on demand.
/// In-memory databases are limited to a single connection, since every
/// SQLite connection to `:memory:` opens its own private database.
pub async fn create_pool(url: &str) -> Result<SqlitePool> {
    let in_memory = is_memory_url(url);

    if !in_memory {
        let path = url.strip_prefix("sqlite:").unwrap_or(url);
        let path = path.split('?').next().unwrap_or(path);

        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create database directory: {:?}", parent))?;
            }
        }
    }

    let connection_url = if in_memory {
        "sqlite::memory:".to_string()
    } else if url.starts_with("sqlite:") {
        if url.contains('?') {
            url.to_string()
        } else {
            format!("{}?mode=rwc", url)
        }
    } else {
        format!("sqlite:{}?mode=rwc", url)
    };

    let mut options = SqlitePoolOptions::new().max_connections(20);
    if in_memory {
        // Dropping the only connection would drop the database with it.
        options = options
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None);
    }

    let pool = options
        .connect(&connection_url)
        .await
        .with_context(|| format!("Failed to connect to SQLite database: {}", url))?;

    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await
        .context("Failed to enable foreign keys")?;

    Ok(pool)
}

/// Create an in-memory SQLite pool for tests
pub async fn create_test_pool() -> Result<SqlitePool> {
    create_pool(":memory:").await
}

fn is_memory_url(url: &str) -> bool {
    url == ":memory:" || url.starts_with("sqlite::memory:")
}
