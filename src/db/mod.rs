//! Datastore layer
//!
//! This module provides datastore access for the Sahityik site.
//! It supports:
//! - A hosted table API (default), reached over HTTP via [`rest::RestClient`]
//! - SQLite, for self-hosting and tests
//!
//! The backend is selected by `datastore.driver`; the rest of the
//! application only sees the repository traits.
//!
//! # Usage
//!
//! ```ignore
//! use sahityik::config::DatastoreConfig;
//! use sahityik::db::open_repositories;
//!
//! let (contents, categories) = open_repositories(&DatastoreConfig::default()).await?;
//! let items = contents.list_approved().await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;
pub mod rest;

use anyhow::Result;
use std::sync::Arc;

use crate::config::{DatastoreConfig, DatastoreDriver};
use repositories::{
    CategoryRepository, ContentRepository, RestCategoryRepository, RestContentRepository,
    SqlxCategoryRepository, SqlxContentRepository,
};

pub use pool::{create_pool, create_test_pool};

/// Database file used by the SQLite backend when `datastore.url` is empty
pub const DEFAULT_SQLITE_PATH: &str = "data/sahityik.db";

fn sqlite_path(config: &DatastoreConfig) -> &str {
    if config.url.is_empty() {
        DEFAULT_SQLITE_PATH
    } else {
        &config.url
    }
}

/// Build the content and category repositories for the configured backend.
///
/// For SQLite this also runs pending migrations.
pub async fn open_repositories(
    config: &DatastoreConfig,
) -> Result<(Arc<dyn ContentRepository>, Arc<dyn CategoryRepository>)> {
    match config.driver {
        DatastoreDriver::Rest => {
            let client = rest::RestClient::new(config)?;
            tracing::info!("Using hosted datastore at {}", config.url);
            Ok((
                RestContentRepository::boxed(client.clone()),
                RestCategoryRepository::boxed(client),
            ))
        }
        DatastoreDriver::Sqlite => {
            let path = sqlite_path(config);
            let pool = create_pool(path).await?;
            migrations::run_migrations(&pool).await?;
            tracing::info!("Using SQLite datastore at {}", path);
            Ok((
                SqlxContentRepository::boxed(pool.clone()),
                SqlxCategoryRepository::boxed(pool),
            ))
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support;
