//! Sahityik - a small Bengali literature publishing site

use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sahityik::{
    api::{self, flash::FlashSigner, AppState},
    config::Config,
    db,
    services::{ContentService, ImgbbClient, PlaceholderIdentity},
    theme::ThemeEngine,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sahityik=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Sahityik...");

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.yml"));
    let config = Config::load_with_env(&config_path)?;
    tracing::info!("Configuration loaded from {:?}", config_path);

    // Datastore
    let (contents, categories) = db::open_repositories(&config.datastore).await?;
    tracing::info!("Datastore ready: {:?}", config.datastore.driver);

    // Image host
    let image_host = Arc::new(ImgbbClient::new(&config.image_host)?);

    // Theme
    let theme_engine = ThemeEngine::new(&config.theme)?;
    tracing::info!("Theme '{}' loaded", theme_engine.active_theme());

    let state = AppState {
        content_service: Arc::new(ContentService::new(contents, categories, image_host)),
        theme_engine: Arc::new(theme_engine),
        flash: Arc::new(FlashSigner::new(
            &config.session.secret_key,
            &config.session.flash_cookie,
        )?),
        identity: Arc::new(PlaceholderIdentity::new(
            config.upload.placeholder_user_id.clone(),
        )),
    };

    let app = api::build_router(state, config.upload.max_file_size);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
