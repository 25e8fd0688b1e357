//! End-to-end handler tests
//!
//! The router runs against an in-memory SQLite datastore and an in-process
//! image host, so no network access is needed.

use super::*;
use crate::api::flash::{FlashLevel, FlashMessage, FlashSigner};
use crate::api::upload::{MISSING_FILE_MESSAGE, SUCCESS_MESSAGE, UPLOAD_PROBLEM_MESSAGE};
use crate::db::repositories::{
    CategoryRepository, ContentRepository, SqlxCategoryRepository, SqlxContentRepository,
};
use crate::db::test_support::{seed_category, seed_content, setup_test_pool, FailingContentRepository};
use crate::services::content::test_support::{FakeImageHost, FakeOutcome};
use crate::services::{ContentService, PlaceholderIdentity};
use crate::config::ThemeConfig;
use crate::theme::ThemeEngine;
use axum::http::{header, HeaderValue, StatusCode};
use axum_test::multipart::{MultipartForm, Part};
use axum_test::{TestResponse, TestServer};
use proptest::prelude::*;
use sqlx::SqlitePool;
use std::sync::Arc;

const SECRET: &str = "test-secret";
const COOKIE: &str = "sahityik_flash";
const PLACEHOLDER_USER: &str = "DEFAULT_USER_ID";
const HOSTED_URL: &str = "https://i.ibb.co/Xyz987/poem.png";

struct TestApp {
    server: TestServer,
    pool: SqlitePool,
    host: Arc<FakeImageHost>,
}

fn build_server(
    contents: Arc<dyn ContentRepository>,
    categories: Arc<dyn CategoryRepository>,
    host: Arc<FakeImageHost>,
) -> TestServer {
    build_themed_server(contents, categories, host, ThemeEngine::embedded().unwrap())
}

fn build_themed_server(
    contents: Arc<dyn ContentRepository>,
    categories: Arc<dyn CategoryRepository>,
    host: Arc<FakeImageHost>,
    theme_engine: ThemeEngine,
) -> TestServer {
    let state = AppState {
        content_service: Arc::new(ContentService::new(contents, categories, host)),
        theme_engine: Arc::new(theme_engine),
        flash: Arc::new(FlashSigner::new(SECRET, COOKIE).unwrap()),
        identity: Arc::new(PlaceholderIdentity::new(PLACEHOLDER_USER)),
    };

    TestServer::new(build_router(state, 1024 * 1024)).unwrap()
}

async fn test_app(outcome: FakeOutcome) -> TestApp {
    let pool = setup_test_pool().await;
    let host = FakeImageHost::new(outcome);
    let server = build_server(
        SqlxContentRepository::boxed(pool.clone()),
        SqlxCategoryRepository::boxed(pool.clone()),
        host.clone(),
    );

    TestApp { server, pool, host }
}

fn signer() -> FlashSigner {
    FlashSigner::new(SECRET, COOKIE).unwrap()
}

fn location(response: &TestResponse) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Flash messages set by the response, decoded with the test secret
fn flashes(response: &TestResponse) -> Vec<FlashMessage> {
    let prefix = format!("{}=", COOKIE);
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|cookie| cookie.strip_prefix(&prefix))
        .filter_map(|rest| rest.split(';').next())
        .filter(|value| !value.is_empty())
        .flat_map(|value| signer().decode(value).unwrap())
        .collect()
}

fn full_form(category_id: i64) -> MultipartForm {
    MultipartForm::new()
        .add_text("title", "নদীর গান")
        .add_text("description", "ভাটিয়ালি সুরে লেখা")
        .add_text("slug", "river-song")
        .add_text("alt_text", "boat on a river")
        .add_text("category_id", category_id.to_string())
}

fn image_part() -> Part {
    Part::bytes(b"\x89PNG\r\n\x1a\n fake image".to_vec())
        .file_name("river.png")
        .mime_type("image/png")
}

async fn count_contents(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM contents")
        .fetch_one(pool)
        .await
        .unwrap()
}

// ============================================================================
// Listing
// ============================================================================

#[tokio::test]
async fn test_index_lists_only_approved_newest_first() {
    let app = test_app(FakeOutcome::Hosted(HOSTED_URL.to_string())).await;
    let category = seed_category(&app.pool, "কবিতা").await;
    seed_content(&app.pool, "older", Some(category), true, "2026-02-01T08:00:00Z").await;
    seed_content(&app.pool, "pending", Some(category), false, "2026-02-02T08:00:00Z").await;
    seed_content(&app.pool, "newer", None, true, "2026-02-03T08:00:00Z").await;

    let response = app.server.get("/").await;

    response.assert_status_ok();
    let html = response.text();
    let newer = html.find("href=\"/content/newer\"").expect("newer listed");
    let older = html.find("href=\"/content/older\"").expect("older listed");
    assert!(newer < older);
    assert!(!html.contains("/content/pending"));
    assert!(html.contains("কবিতা"));
}

#[tokio::test]
async fn test_index_survives_datastore_failure() {
    let pool = setup_test_pool().await;
    let server = build_server(
        Arc::new(FailingContentRepository),
        SqlxCategoryRepository::boxed(pool),
        FakeImageHost::hosting(HOSTED_URL),
    );

    let response = server.get("/").await;

    response.assert_status_ok();
    let html = response.text();
    assert!(html.contains("class=\"empty\""));
    assert!(!html.contains("content-card"));
}

#[tokio::test]
async fn test_index_consumes_flash_cookie() {
    let app = test_app(FakeOutcome::Hosted(HOSTED_URL.to_string())).await;
    let cookie = format!(
        "{}={}",
        COOKIE,
        signer().encode(&[FlashMessage::success(SUCCESS_MESSAGE)])
    );

    let response = app
        .server
        .get("/")
        .add_header(header::COOKIE, HeaderValue::from_str(&cookie).unwrap())
        .await;

    let html = response.text();
    assert!(html.contains(SUCCESS_MESSAGE));
    assert!(html.contains("flash-success"));

    let cleared = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(cleared.starts_with("sahityik_flash=;"));
    assert!(cleared.contains("Max-Age=0"));
}

#[tokio::test]
async fn test_index_ignores_forged_flash_cookie() {
    let app = test_app(FakeOutcome::Hosted(HOSTED_URL.to_string())).await;
    let forged = FlashSigner::new("wrong-secret", COOKIE)
        .unwrap()
        .encode(&[FlashMessage::error("forged notice")]);

    let response = app
        .server
        .get("/")
        .add_header(
            header::COOKIE,
            HeaderValue::from_str(&format!("{}={}", COOKIE, forged)).unwrap(),
        )
        .await;

    response.assert_status_ok();
    assert!(!response.text().contains("forged notice"));
}

// ============================================================================
// Detail
// ============================================================================

#[tokio::test]
async fn test_single_content_unknown_slug_is_bare_404() {
    let app = test_app(FakeOutcome::Hosted(HOSTED_URL.to_string())).await;

    let response = app.server.get("/content/missing").await;

    response.assert_status(StatusCode::NOT_FOUND);
    assert!(response.text().is_empty());
}

#[tokio::test]
async fn test_single_content_shows_fields() {
    let app = test_app(FakeOutcome::Hosted(HOSTED_URL.to_string())).await;
    let category = seed_category(&app.pool, "গল্প").await;
    seed_content(&app.pool, "monsoon", Some(category), true, "2026-07-01T12:00:00Z").await;

    let response = app.server.get("/content/monsoon").await;

    response.assert_status_ok();
    let html = response.text();
    assert!(html.contains("Title monsoon"));
    assert!(html.contains("Description monsoon"));
    assert!(html.contains("Alt monsoon"));
    assert!(html.contains("গল্প"));
    assert!(html.contains(&tera::escape_html("https://i.ibb.co/monsoon.png")));
}

#[tokio::test]
async fn test_single_content_datastore_failure_is_500() {
    let pool = setup_test_pool().await;
    let server = build_server(
        Arc::new(FailingContentRepository),
        SqlxCategoryRepository::boxed(pool),
        FakeImageHost::hosting(HOSTED_URL),
    );

    let response = server.get("/content/anything").await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
}

// ============================================================================
// Upload form
// ============================================================================

#[tokio::test]
async fn test_upload_form_lists_categories() {
    let app = test_app(FakeOutcome::Hosted(HOSTED_URL.to_string())).await;
    let poetry = seed_category(&app.pool, "কবিতা").await;
    let essay = seed_category(&app.pool, "প্রবন্ধ").await;

    let response = app.server.get("/upload").await;

    response.assert_status_ok();
    let html = response.text();
    assert!(html.contains(&format!("<option value=\"{}\">কবিতা</option>", poetry)));
    assert!(html.contains(&format!("<option value=\"{}\">প্রবন্ধ</option>", essay)));
}

#[tokio::test]
async fn test_upload_without_file_makes_no_calls() {
    let app = test_app(FakeOutcome::Hosted(HOSTED_URL.to_string())).await;
    let category = seed_category(&app.pool, "কবিতা").await;

    let response = app.server.post("/upload").multipart(full_form(category)).await;

    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/upload");
    assert_eq!(flashes(&response), vec![FlashMessage::error(MISSING_FILE_MESSAGE)]);
    assert!(app.host.uploads().is_empty());
    assert_eq!(count_contents(&app.pool).await, 0);
}

#[tokio::test]
async fn test_upload_with_empty_file_part_counts_as_missing() {
    let app = test_app(FakeOutcome::Hosted(HOSTED_URL.to_string())).await;
    let category = seed_category(&app.pool, "কবিতা").await;
    let form = full_form(category).add_part("file", Part::bytes(Vec::new()).file_name(""));

    let response = app.server.post("/upload").multipart(form).await;

    assert_eq!(location(&response), "/upload");
    assert_eq!(flashes(&response), vec![FlashMessage::error(MISSING_FILE_MESSAGE)]);
    assert!(app.host.uploads().is_empty());
}

#[tokio::test]
async fn test_upload_rejected_by_image_host() {
    let app = test_app(FakeOutcome::Rejected).await;
    let category = seed_category(&app.pool, "কবিতা").await;
    let form = full_form(category).add_part("file", image_part());

    let response = app.server.post("/upload").multipart(form).await;

    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/upload");
    assert_eq!(flashes(&response), vec![FlashMessage::error(UPLOAD_PROBLEM_MESSAGE)]);
    assert_eq!(app.host.uploads().len(), 1);
    assert_eq!(count_contents(&app.pool).await, 0);
}

#[tokio::test]
async fn test_upload_malformed_host_response_uses_generic_error() {
    let app = test_app(FakeOutcome::Malformed).await;
    let category = seed_category(&app.pool, "কবিতা").await;
    let form = full_form(category).add_part("file", image_part());

    let response = app.server.post("/upload").multipart(form).await;

    assert_eq!(location(&response), "/upload");
    let flashes = flashes(&response);
    assert_eq!(flashes.len(), 1);
    assert_eq!(flashes[0].level, FlashLevel::Error);
    assert!(flashes[0].message.starts_with("একটি ত্রুটি ঘটেছে: "));
    assert_eq!(count_contents(&app.pool).await, 0);
}

#[tokio::test]
async fn test_upload_success_creates_record() {
    let app = test_app(FakeOutcome::Hosted(HOSTED_URL.to_string())).await;
    let category = seed_category(&app.pool, "কবিতা").await;
    let form = full_form(category).add_part("file", image_part());

    let response = app.server.post("/upload").multipart(form).await;

    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    assert_eq!(flashes(&response), vec![FlashMessage::success(SUCCESS_MESSAGE)]);

    let uploads = app.host.uploads();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].bytes, b"\x89PNG\r\n\x1a\n fake image".to_vec());
    assert_eq!(uploads[0].filename.as_deref(), Some("river.png"));

    let stored = SqlxContentRepository::new(app.pool.clone())
        .find_by_slug("river-song")
        .await
        .unwrap()
        .expect("record stored");
    assert!(stored.is_approved);
    assert_eq!(stored.user_id.as_deref(), Some(PLACEHOLDER_USER));
    assert_eq!(stored.file_url, HOSTED_URL);
    assert_eq!(stored.title.as_deref(), Some("নদীর গান"));
    assert_eq!(stored.description.as_deref(), Some("ভাটিয়ালি সুরে লেখা"));
    assert_eq!(stored.alt_text.as_deref(), Some("boat on a river"));
    assert_eq!(stored.category_id, Some(category));
}

#[tokio::test]
async fn test_upload_datastore_failure_uses_generic_error() {
    let app = test_app(FakeOutcome::Hosted(HOSTED_URL.to_string())).await;
    // No such category: the foreign key rejects the insert
    let form = full_form(999).add_part("file", image_part());

    let response = app.server.post("/upload").multipart(form).await;

    assert_eq!(location(&response), "/upload");
    let flashes = flashes(&response);
    assert_eq!(flashes.len(), 1);
    assert!(flashes[0].message.starts_with("একটি ত্রুটি ঘটেছে: "));
    // The image was hosted before the insert failed
    assert_eq!(app.host.uploads().len(), 1);
    assert_eq!(count_contents(&app.pool).await, 0);
}

#[tokio::test]
async fn test_upload_without_category_is_stored_uncategorized() {
    let app = test_app(FakeOutcome::Hosted(HOSTED_URL.to_string())).await;
    let form = MultipartForm::new()
        .add_text("title", "বিষয়হীন")
        .add_text("slug", "no-category")
        .add_part("file", image_part());

    let response = app.server.post("/upload").multipart(form).await;

    assert_eq!(location(&response), "/");
    assert_eq!(flashes(&response), vec![FlashMessage::success(SUCCESS_MESSAGE)]);

    let stored = SqlxContentRepository::new(app.pool.clone())
        .find_by_slug("no-category")
        .await
        .unwrap()
        .expect("record stored");
    assert_eq!(stored.title.as_deref(), Some("বিষয়হীন"));
    assert_eq!(stored.category_id, None);
    assert_eq!(stored.description, None);
    assert_eq!(stored.alt_text, None);

    let listing = app.server.get("/").await.text();
    assert!(listing.contains("বিষয়হীন"));
}

#[tokio::test]
async fn test_identical_submission_twice_is_refused_by_slug_uniqueness() {
    let app = test_app(FakeOutcome::Hosted(HOSTED_URL.to_string())).await;
    let category = seed_category(&app.pool, "কবিতা").await;

    let first = app
        .server
        .post("/upload")
        .multipart(full_form(category).add_part("file", image_part()))
        .await;
    assert_eq!(location(&first), "/");

    let second = app
        .server
        .post("/upload")
        .multipart(full_form(category).add_part("file", image_part()))
        .await;

    // Nothing is deduplicated up front: the image is hosted again and the
    // datastore refuses the repeated slug.
    assert_eq!(location(&second), "/upload");
    let flashes = flashes(&second);
    assert_eq!(flashes.len(), 1);
    assert_eq!(flashes[0].level, FlashLevel::Error);
    assert!(flashes[0].message.starts_with("একটি ত্রুটি ঘটেছে: "));
    assert!(flashes[0].message.contains("UNIQUE"));
    assert_eq!(app.host.uploads().len(), 2);
    assert_eq!(count_contents(&app.pool).await, 1);
}

#[tokio::test]
async fn test_identical_slugless_submission_twice_creates_two_records() {
    let app = test_app(FakeOutcome::Hosted(HOSTED_URL.to_string())).await;
    let category = seed_category(&app.pool, "কবিতা").await;

    for _ in 0..2 {
        let form = MultipartForm::new()
            .add_text("title", "একই লেখা")
            .add_text("category_id", category.to_string())
            .add_part("file", image_part());
        let response = app.server.post("/upload").multipart(form).await;
        assert_eq!(location(&response), "/");
    }

    assert_eq!(app.host.uploads().len(), 2);
    assert_eq!(count_contents(&app.pool).await, 2);
}

#[tokio::test]
async fn test_listing_links_reach_slugs_with_reserved_characters() {
    let app = test_app(FakeOutcome::Hosted(HOSTED_URL.to_string())).await;
    let slug = "spring rain?part#2/b";
    seed_content(&app.pool, slug, None, true, "2026-02-01T08:00:00Z").await;

    let listing = app.server.get("/").await.text();
    let href = "/content/spring%20rain%3Fpart%232%2Fb";
    assert!(listing.contains(&format!("href=\"{}\"", href)));

    let response = app.server.get(href).await;
    response.assert_status_ok();
    assert!(response.text().contains(&format!("Title {}", tera::escape_html(slug))));
}

#[tokio::test]
async fn test_static_stylesheet_is_served() {
    let app = test_app(FakeOutcome::Hosted(HOSTED_URL.to_string())).await;

    let response = app.server.get("/static/style.css").await;

    response.assert_status_ok();
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/css"
    );

    app.server
        .get("/static/missing.css")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_static_serves_theme_files_but_nothing_outside_them() {
    let dir = tempfile::TempDir::new().unwrap();
    let static_dir = dir.path().join("default").join("static");
    std::fs::create_dir_all(&static_dir).unwrap();
    std::fs::write(static_dir.join("site.css"), "body { color: teal; }").unwrap();
    let secret = dir.path().join("secret.txt");
    std::fs::write(&secret, "TOP-SECRET").unwrap();

    let pool = setup_test_pool().await;
    let theme = ThemeEngine::new(&ThemeConfig {
        active: "default".to_string(),
        path: dir.path().to_path_buf(),
    })
    .unwrap();
    let server = build_themed_server(
        SqlxContentRepository::boxed(pool.clone()),
        SqlxCategoryRepository::boxed(pool),
        FakeImageHost::hosting(HOSTED_URL),
        theme,
    );

    let response = server.get("/static/site.css").await;
    response.assert_status_ok();
    assert_eq!(response.text(), "body { color: teal; }");

    let absolute = urlencoding::encode(&secret.to_string_lossy()).into_owned();
    for path in [
        format!("/static/{}", absolute),
        "/static/%2Fetc%2Fpasswd".to_string(),
        "/static/..%2F..%2Fsecret.txt".to_string(),
    ] {
        let response = server.get(&path).await;
        response.assert_status(StatusCode::NOT_FOUND);
        assert!(!response.text().contains("TOP-SECRET"), "{} leaked", path);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_listing_preserves_creation_order(
        offsets in prop::collection::btree_set(0i64..1_000_000, 1..8),
        approvals in prop::collection::vec(any::<bool>(), 8),
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let app = test_app(FakeOutcome::Hosted(HOSTED_URL.to_string())).await;
            let base = chrono::DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").unwrap();

            let mut expected = Vec::new();
            for (i, offset) in offsets.iter().enumerate() {
                let slug = format!("item-{:02}", i);
                let created_at = (base + chrono::Duration::seconds(*offset)).to_rfc3339();
                seed_content(&app.pool, &slug, None, approvals[i], &created_at).await;
                if approvals[i] {
                    expected.push((*offset, slug));
                }
            }
            expected.sort_by(|a, b| b.0.cmp(&a.0));

            let html = app.server.get("/").await.text();

            let mut positions = Vec::new();
            for i in 0..offsets.len() {
                let slug = format!("item-{:02}", i);
                if let Some(pos) = html.find(&format!("href=\"/content/{}\"", slug)) {
                    positions.push((pos, slug));
                }
            }
            positions.sort();
            let listed: Vec<String> = positions.into_iter().map(|(_, slug)| slug).collect();
            let expected: Vec<String> = expected.into_iter().map(|(_, slug)| slug).collect();

            prop_assert_eq!(listed, expected);
            Ok(())
        })?;
    }
}
