//! Hosted table API client
//!
//! Thin client for a PostgREST-style endpoint (as exposed by Supabase):
//! tables live under `{url}/rest/v1/{table}`, filters are query parameters
//! such as `slug=eq.poem`, `order=created_at.desc` sorts, and `select`
//! supports embedding a foreign table, e.g. `*,categories(name_bn)`.
//!
//! The client holds no per-request state and is shared by every repository.

use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;

use crate::config::DatastoreConfig;

/// Client for the hosted table API
#[derive(Clone)]
pub struct RestClient {
    client: Client,
    base_url: String,
    key: String,
}

/// Filters, ordering and projection for a table read
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableQuery {
    select: String,
    filters: Vec<(String, String)>,
    order: Option<String>,
}

impl TableQuery {
    /// Start a query projecting `select`
    pub fn select(columns: impl Into<String>) -> Self {
        Self {
            select: columns.into(),
            ..Self::default()
        }
    }

    /// Keep only rows where `column` equals `value`
    pub fn eq(mut self, column: &str, value: impl ToString) -> Self {
        self.filters
            .push((column.to_string(), format!("eq.{}", value.to_string())));
        self
    }

    /// Sort by `column`, newest/largest first when `descending`
    pub fn order(mut self, column: &str, descending: bool) -> Self {
        let direction = if descending { "desc" } else { "asc" };
        self.order = Some(format!("{}.{}", column, direction));
        self
    }

    /// Render as a URL query string (without the leading `?`)
    pub fn to_query_string(&self) -> String {
        let mut parts = vec![format!("select={}", urlencoding::encode(&self.select))];
        for (column, condition) in &self.filters {
            parts.push(format!(
                "{}={}",
                urlencoding::encode(column),
                urlencoding::encode(condition)
            ));
        }
        if let Some(order) = &self.order {
            parts.push(format!("order={}", urlencoding::encode(order)));
        }
        parts.join("&")
    }
}

impl RestClient {
    /// Create a client from datastore configuration
    pub fn new(config: &DatastoreConfig) -> Result<Self> {
        if config.url.trim().is_empty() {
            anyhow::bail!("datastore.url is not set (SUPABASE_URL)");
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("Sahityik/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create datastore HTTP client")?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            key: config.key.clone(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
    }

    /// Read rows from `table`
    pub async fn select<T: DeserializeOwned>(&self, table: &str, query: &TableQuery) -> Result<Vec<T>> {
        let url = format!("{}?{}", self.table_url(table), query.to_query_string());
        tracing::debug!("GET {}", url);

        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .with_context(|| format!("Request to table '{}' failed", table))?;

        let response = ensure_success(response, table).await?;
        response
            .json::<Vec<T>>()
            .await
            .with_context(|| format!("Invalid rows returned from table '{}'", table))
    }

    /// Insert one row into `table` and return the stored representation
    pub async fn insert<B, T>(&self, table: &str, row: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .authorize(self.client.post(self.table_url(table)))
            .header("Prefer", "return=representation")
            .json(row)
            .send()
            .await
            .with_context(|| format!("Insert into table '{}' failed", table))?;

        let response = ensure_success(response, table).await?;
        let mut rows: Vec<T> = response
            .json()
            .await
            .with_context(|| format!("Invalid insert result from table '{}'", table))?;

        rows.pop()
            .ok_or_else(|| anyhow::anyhow!("Insert into table '{}' returned no row", table))
    }
}

async fn ensure_success(response: Response, table: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    anyhow::bail!("Table '{}' responded with {}: {}", table, status, body)
}
