//! Category repository
//!
//! Read-only access to categories. Categories are maintained outside this
//! application, so the only operation is an unfiltered listing.
//!
//! This module provides:
//! - `CategoryRepository` trait defining the interface for category data access
//! - `SqlxCategoryRepository` for the SQLite backend
//! - `RestCategoryRepository` for the hosted table API

use crate::db::rest::{RestClient, TableQuery};
use crate::models::Category;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

/// Category repository trait
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// List all categories
    async fn list(&self) -> Result<Vec<Category>>;
}

/// SQLite category repository
pub struct SqlxCategoryRepository {
    pool: SqlitePool,
}

impl SqlxCategoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn CategoryRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl CategoryRepository for SqlxCategoryRepository {
    async fn list(&self) -> Result<Vec<Category>> {
        let rows = sqlx::query("SELECT id, name_bn FROM categories ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list categories")?;

        rows.iter()
            .map(|row| -> Result<Category> {
                Ok(Category {
                    id: row.try_get("id")?,
                    name_bn: row.try_get("name_bn")?,
                })
            })
            .collect()
    }
}

/// Hosted table API category repository
pub struct RestCategoryRepository {
    client: RestClient,
}

impl RestCategoryRepository {
    pub fn new(client: RestClient) -> Self {
        Self { client }
    }

    pub fn boxed(client: RestClient) -> Arc<dyn CategoryRepository> {
        Arc::new(Self::new(client))
    }
}

#[async_trait]
impl CategoryRepository for RestCategoryRepository {
    async fn list(&self) -> Result<Vec<Category>> {
        self.client
            .select("categories", &TableQuery::select("*"))
            .await
    }
}
