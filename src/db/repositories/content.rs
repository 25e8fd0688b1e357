//! Content repository
//!
//! Database operations for content items.
//!
//! This module provides:
//! - `ContentRepository` trait defining the interface for content data access
//! - `SqlxContentRepository` for the SQLite backend
//! - `RestContentRepository` for the hosted table API
//!
//! Both backends join the category display name into every row they return
//! and order listings by creation time, newest first.

use crate::db::rest::{RestClient, TableQuery};
use crate::models::{Content, NewContent};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{de, Deserialize, Deserializer};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use std::sync::Arc;

/// Projection used by the hosted API: every content column plus the
/// embedded category display name.
const CONTENT_SELECT: &str = "*,categories(name_bn)";

/// Content repository trait
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// All approved items, newest first
    async fn list_approved(&self) -> Result<Vec<Content>>;

    /// The first item whose slug matches, if any
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Content>>;

    /// Insert a new item and return it as stored
    async fn create(&self, content: &NewContent) -> Result<Content>;
}

// ============================================================================
// SQLite implementation
// ============================================================================

const SELECT_CONTENT_SQL: &str = r#"
    SELECT c.id, c.title, c.description, c.slug, c.alt_text, c.category_id,
           cat.name_bn AS category_name, c.file_url, c.is_approved, c.created_at, c.user_id
    FROM contents c
    LEFT JOIN categories cat ON cat.id = c.category_id
"#;

/// SQLite content repository
pub struct SqlxContentRepository {
    pool: SqlitePool,
}

impl SqlxContentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn ContentRepository> {
        Arc::new(Self::new(pool))
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Content>> {
        let sql = format!("{} WHERE c.id = ?", SELECT_CONTENT_SQL);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get content by id")?;

        row.as_ref().map(row_to_content).transpose()
    }
}

#[async_trait]
impl ContentRepository for SqlxContentRepository {
    async fn list_approved(&self) -> Result<Vec<Content>> {
        let sql = format!(
            "{} WHERE c.is_approved = 1 ORDER BY c.created_at DESC, c.id DESC",
            SELECT_CONTENT_SQL
        );
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list approved content")?;

        rows.iter().map(row_to_content).collect()
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Content>> {
        let sql = format!("{} WHERE c.slug = ? ORDER BY c.id LIMIT 1", SELECT_CONTENT_SQL);
        let row = sqlx::query(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get content by slug")?;

        row.as_ref().map(row_to_content).transpose()
    }

    async fn create(&self, content: &NewContent) -> Result<Content> {
        let result = sqlx::query(
            r#"
            INSERT INTO contents
                (title, description, slug, alt_text, category_id, file_url, is_approved, created_at, user_id)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&content.title)
        .bind(&content.description)
        .bind(&content.slug)
        .bind(&content.alt_text)
        .bind(&content.category_id)
        .bind(&content.file_url)
        .bind(content.is_approved)
        .bind(Utc::now())
        .bind(&content.user_id)
        .execute(&self.pool)
        .await
        .context("Failed to create content")?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Created content {} not found", id))
    }
}

fn row_to_content(row: &SqliteRow) -> Result<Content> {
    Ok(Content {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        slug: row.try_get("slug")?,
        alt_text: row.try_get("alt_text")?,
        category_id: row.try_get("category_id")?,
        category_name: row.try_get("category_name")?,
        file_url: row.try_get("file_url")?,
        is_approved: row.try_get("is_approved")?,
        created_at: row.try_get("created_at")?,
        user_id: row.try_get("user_id")?,
    })
}

// ============================================================================
// Hosted table API implementation
// ============================================================================

/// Row shape returned by the hosted API, with the category embedded as an
/// object under the foreign table's name.
///
/// Any column other than `id` and `created_at` may be null. Ids may arrive as
/// numbers or numeric strings; a `timestamp` column without an offset is read
/// as UTC.
#[derive(Debug, Deserialize)]
struct ContentRow {
    #[serde(deserialize_with = "deserialize_id")]
    id: i64,
    title: Option<String>,
    description: Option<String>,
    slug: Option<String>,
    alt_text: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    category_id: Option<i64>,
    file_url: Option<String>,
    is_approved: Option<bool>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    created_at: DateTime<Utc>,
    user_id: Option<String>,
    #[serde(default)]
    categories: Option<CategoryLabel>,
}

#[derive(Debug, Deserialize)]
struct CategoryLabel {
    name_bn: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(i64),
    Text(String),
}

impl RawId {
    fn into_i64<E: de::Error>(self) -> Result<i64, E> {
        match self {
            RawId::Number(id) => Ok(id),
            RawId::Text(text) => text
                .trim()
                .parse()
                .map_err(|_| E::custom(format!("invalid id {:?}", text))),
        }
    }
}

fn deserialize_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    RawId::deserialize(deserializer)?.into_i64()
}

fn deserialize_optional_id<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<i64>, D::Error> {
    Option::<RawId>::deserialize(deserializer)?
        .map(RawId::into_i64)
        .transpose()
}

fn deserialize_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp {:?}", raw)))
}

/// Parse an RFC 3339 timestamp, or a naive one taken as UTC
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }

    [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
    ]
    .iter()
    .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
    .map(|naive| Utc.from_utc_datetime(&naive))
}

impl From<ContentRow> for Content {
    fn from(row: ContentRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            slug: row.slug,
            alt_text: row.alt_text,
            category_id: row.category_id,
            category_name: row.categories.and_then(|c| c.name_bn),
            file_url: row.file_url.unwrap_or_default(),
            is_approved: row.is_approved.unwrap_or(false),
            created_at: row.created_at,
            user_id: row.user_id,
        }
    }
}

/// Decode rows one at a time. A row that cannot be read is logged and
/// skipped so it does not hide the others.
fn decode_rows(rows: Vec<serde_json::Value>) -> Vec<Content> {
    rows.into_iter()
        .filter_map(|row| match serde_json::from_value::<ContentRow>(row) {
            Ok(row) => Some(row.into()),
            Err(e) => {
                tracing::warn!("Skipping unreadable content row: {}", e);
                None
            }
        })
        .collect()
}

/// Hosted table API content repository
pub struct RestContentRepository {
    client: RestClient,
}

impl RestContentRepository {
    pub fn new(client: RestClient) -> Self {
        Self { client }
    }

    pub fn boxed(client: RestClient) -> Arc<dyn ContentRepository> {
        Arc::new(Self::new(client))
    }
}

#[async_trait]
impl ContentRepository for RestContentRepository {
    async fn list_approved(&self) -> Result<Vec<Content>> {
        let query = TableQuery::select(CONTENT_SELECT)
            .eq("is_approved", true)
            .order("created_at", true);
        let rows: Vec<serde_json::Value> = self.client.select("contents", &query).await?;

        Ok(decode_rows(rows))
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Content>> {
        let query = TableQuery::select(CONTENT_SELECT).eq("slug", slug);
        let rows: Vec<serde_json::Value> = self.client.select("contents", &query).await?;

        rows.into_iter()
            .next()
            .map(|row| {
                serde_json::from_value::<ContentRow>(row)
                    .map(Content::from)
                    .with_context(|| format!("Unreadable content row for slug '{}'", slug))
            })
            .transpose()
    }

    async fn create(&self, content: &NewContent) -> Result<Content> {
        let row: ContentRow = self.client.insert("contents", content).await?;
        Ok(row.into())
    }
}
