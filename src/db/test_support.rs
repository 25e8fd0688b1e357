//! Shared fixtures for datastore and remote-client tests

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use sqlx::SqlitePool;
use std::sync::{Arc, Mutex};

use crate::models::{Content, NewContent};

/// In-memory pool with the schema applied
pub async fn setup_test_pool() -> SqlitePool {
    let pool = super::create_test_pool()
        .await
        .expect("Failed to create test pool");
    super::migrations::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

/// Insert a category and return its id
pub async fn seed_category(pool: &SqlitePool, name_bn: &str) -> i64 {
    sqlx::query("INSERT INTO categories (name_bn) VALUES (?)")
        .bind(name_bn)
        .execute(pool)
        .await
        .expect("Failed to seed category")
        .last_insert_rowid()
}

/// Insert a content row with an explicit timestamp and return its id
pub async fn seed_content(
    pool: &SqlitePool,
    slug: &str,
    category_id: Option<i64>,
    is_approved: bool,
    created_at: &str,
) -> i64 {
    let created_at: chrono::DateTime<chrono::Utc> =
        created_at.parse().expect("Invalid timestamp");

    sqlx::query(
        "INSERT INTO contents (title, description, slug, alt_text, category_id, file_url, is_approved, created_at, user_id) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(format!("Title {}", slug))
    .bind(format!("Description {}", slug))
    .bind(slug)
    .bind(format!("Alt {}", slug))
    .bind(category_id)
    .bind(format!("https://i.ibb.co/{}.png", slug))
    .bind(is_approved)
    .bind(created_at)
    .bind("seed-user")
    .execute(pool)
    .await
    .expect("Failed to seed content")
    .last_insert_rowid()
}

/// Content repository whose every call fails, for degraded-datastore tests
pub struct FailingContentRepository;

#[async_trait::async_trait]
impl super::repositories::ContentRepository for FailingContentRepository {
    async fn list_approved(&self) -> anyhow::Result<Vec<Content>> {
        anyhow::bail!("datastore unavailable")
    }

    async fn find_by_slug(&self, _slug: &str) -> anyhow::Result<Option<Content>> {
        anyhow::bail!("datastore unavailable")
    }

    async fn create(&self, _content: &NewContent) -> anyhow::Result<Content> {
        anyhow::bail!("datastore unavailable")
    }
}

/// A request received by [`FakeRemote`]
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Local HTTP server standing in for a remote API.
///
/// Every request gets the same status and JSON body; the requests are kept
/// for inspection.
#[derive(Clone)]
pub struct FakeRemote {
    status: StatusCode,
    body: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl FakeRemote {
    /// Start serving on an ephemeral local port; returns the base URL
    pub async fn start(status: StatusCode, body: impl Into<String>) -> (Self, String) {
        let remote = Self {
            status,
            body: body.into(),
            requests: Arc::new(Mutex::new(Vec::new())),
        };
        let router = Router::new().fallback(record).with_state(remote.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake remote");
        let addr = listener.local_addr().expect("Fake remote has no address");
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        (remote, format!("http://{}", addr))
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

async fn record(
    State(remote): State<FakeRemote>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    remote.requests.lock().unwrap().push(RecordedRequest {
        method,
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        headers,
        body: body.to_vec(),
    });

    (
        remote.status,
        [(header::CONTENT_TYPE, "application/json")],
        remote.body.clone(),
    )
        .into_response()
}
