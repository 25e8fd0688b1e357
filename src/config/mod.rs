//! Configuration management
//!
//! This module handles loading and parsing configuration for the Sahityik site.
//! Configuration can be loaded from:
//! - config.yml file
//! - Environment variables (override file settings)
//!
//! Missing optional values are filled with sensible defaults. Credentials are
//! not validated here: an empty datastore key or image-host key surfaces as a
//! failure on first use.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Datastore configuration
    #[serde(default)]
    pub datastore: DatastoreConfig,
    /// Image host configuration
    #[serde(default)]
    pub image_host: ImageHostConfig,
    /// Session (flash cookie) configuration
    #[serde(default)]
    pub session: SessionConfig,
    /// Theme configuration
    #[serde(default)]
    pub theme: ThemeConfig,
    /// Upload configuration
    #[serde(default)]
    pub upload: UploadConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

/// Datastore configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatastoreConfig {
    /// Datastore backend
    #[serde(default)]
    pub driver: DatastoreDriver,
    /// Base URL of the hosted datastore, or the SQLite path for `sqlite`.
    /// Empty by default: the hosted URL must be supplied, SQLite falls back
    /// to `data/sahityik.db`.
    #[serde(default)]
    pub url: String,
    /// Access key for the hosted datastore
    #[serde(default)]
    pub key: String,
    /// Request timeout for the hosted datastore
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for DatastoreConfig {
    fn default() -> Self {
        Self {
            driver: DatastoreDriver::default(),
            url: String::new(),
            key: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

/// Datastore backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatastoreDriver {
    /// Hosted table API (default)
    #[default]
    Rest,
    /// Local SQLite database
    Sqlite,
}

/// Image host configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageHostConfig {
    /// Upload endpoint
    #[serde(default = "default_image_endpoint")]
    pub endpoint: String,
    /// API key sent as the `key` query parameter
    #[serde(default)]
    pub api_key: String,
    /// Optional auto-delete delay for hosted images
    #[serde(default)]
    pub expiration_secs: Option<u64>,
    /// Request timeout for uploads
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ImageHostConfig {
    fn default() -> Self {
        Self {
            endpoint: default_image_endpoint(),
            api_key: String::new(),
            expiration_secs: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_image_endpoint() -> String {
    "https://api.imgbb.com/1/upload".to_string()
}

/// Session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Key used to sign flash cookies
    #[serde(default = "default_secret_key")]
    pub secret_key: String,
    /// Name of the flash cookie
    #[serde(default = "default_flash_cookie")]
    pub flash_cookie: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secret_key: default_secret_key(),
            flash_cookie: default_flash_cookie(),
        }
    }
}

fn default_secret_key() -> String {
    "sahityik_secret_key_2026".to_string()
}

fn default_flash_cookie() -> String {
    "sahityik_flash".to_string()
}

/// Theme configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeConfig {
    /// Active theme name
    #[serde(default = "default_theme")]
    pub active: String,
    /// Path to themes directory
    #[serde(default = "default_theme_path")]
    pub path: PathBuf,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            active: default_theme(),
            path: default_theme_path(),
        }
    }
}

fn default_theme() -> String {
    "default".to_string()
}

fn default_theme_path() -> PathBuf {
    PathBuf::from("themes")
}

/// Upload configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Maximum request body size for the upload form (default: 10MB)
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// Identity recorded as the owner of uploaded content
    #[serde(default = "default_placeholder_user_id")]
    pub placeholder_user_id: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
            placeholder_user_id: default_placeholder_user_id(),
        }
    }
}

fn default_max_file_size() -> u64 {
    10 * 1024 * 1024 // 10MB
}

fn default_placeholder_user_id() -> String {
    "DEFAULT_USER_ID".to_string()
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError { path: String, message: String },
}

impl Config {
    /// Load configuration from file
    ///
    /// If the file doesn't exist or is empty, returns default configuration.
    /// If the file exists but is invalid YAML, returns an error with details.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.display().to_string(),
            message: format_yaml_error(&e),
        })?;

        Ok(config)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Credentials use the names the hosted services document:
    /// - SECRET_KEY
    /// - SUPABASE_URL
    /// - SUPABASE_KEY
    /// - IMGBB_API_KEY
    ///
    /// Everything else follows `SAHITYIK_<SECTION>_<KEY>`:
    /// - SAHITYIK_SERVER_HOST
    /// - SAHITYIK_SERVER_PORT
    /// - SAHITYIK_DATASTORE_DRIVER
    /// - SAHITYIK_THEME_ACTIVE
    /// - SAHITYIK_THEME_PATH
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(secret) = std::env::var("SECRET_KEY") {
            self.session.secret_key = secret;
        }
        if let Ok(url) = std::env::var("SUPABASE_URL") {
            self.datastore.url = url;
        }
        if let Ok(key) = std::env::var("SUPABASE_KEY") {
            self.datastore.key = key;
        }
        if let Ok(key) = std::env::var("IMGBB_API_KEY") {
            self.image_host.api_key = key;
        }

        if let Ok(host) = std::env::var("SAHITYIK_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("SAHITYIK_SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }

        if let Ok(driver) = std::env::var("SAHITYIK_DATASTORE_DRIVER") {
            match driver.to_lowercase().as_str() {
                "rest" => self.datastore.driver = DatastoreDriver::Rest,
                "sqlite" => self.datastore.driver = DatastoreDriver::Sqlite,
                _ => {} // Ignore invalid values
            }
        }

        if let Ok(active) = std::env::var("SAHITYIK_THEME_ACTIVE") {
            self.theme.active = active;
        }
        if let Ok(path) = std::env::var("SAHITYIK_THEME_PATH") {
            self.theme.path = PathBuf::from(path);
        }
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Shared by every test that touches process environment variables.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());
