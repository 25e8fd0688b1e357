//! Image host client
//!
//! Uploaded images are not stored locally. The raw bytes are forwarded to a
//! third-party image host which answers with a public URL; only that URL is
//! persisted with the content record.

use async_trait::async_trait;
use reqwest::{multipart, Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

use crate::config::ImageHostConfig;
use crate::models::ImageUpload;

/// Image host errors
#[derive(Debug, thiserror::Error)]
pub enum ImageHostError {
    /// The host answered but refused the upload
    #[error("Image host rejected the upload ({status}): {message}")]
    Rejected { status: StatusCode, message: String },

    /// The host reported success but the body could not be understood
    #[error("Malformed response from image host: {0}")]
    MalformedResponse(String),

    /// The request never completed
    #[error("Image host request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// A successfully hosted image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedImage {
    /// Public URL of the image
    pub url: String,
}

/// External image hosting service
#[async_trait]
pub trait ImageHost: Send + Sync {
    /// Upload the image and return where it is publicly reachable
    async fn upload(&self, image: &ImageUpload) -> Result<HostedImage, ImageHostError>;
}

/// Client for the ImgBB upload API
pub struct ImgbbClient {
    client: Client,
    endpoint: String,
    api_key: String,
    expiration_secs: Option<u64>,
}

/// Response envelope of the upload API
#[derive(Debug, Deserialize)]
struct UploadEnvelope {
    #[serde(default)]
    success: bool,
    data: Option<UploadData>,
    error: Option<UploadErrorBody>,
}

#[derive(Debug, Deserialize)]
struct UploadData {
    url: String,
}

#[derive(Debug, Deserialize)]
struct UploadErrorBody {
    message: Option<String>,
}

impl ImgbbClient {
    /// Create a client from configuration
    pub fn new(config: &ImageHostConfig) -> Result<Self, ImageHostError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("Sahityik/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            expiration_secs: config.expiration_secs,
        })
    }

    fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("key", self.api_key.clone())];
        if let Some(expiration) = self.expiration_secs {
            params.push(("expiration", expiration.to_string()));
        }
        params
    }
}

#[async_trait]
impl ImageHost for ImgbbClient {
    async fn upload(&self, image: &ImageUpload) -> Result<HostedImage, ImageHostError> {
        let form = multipart::Form::new().part("image", image_part(image));

        let response = self
            .client
            .post(&self.endpoint)
            .query(&self.query_params())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        tracing::debug!("Image host responded with {}", status);

        interpret_response(status, &body)
    }
}

/// Multipart part carrying the raw image bytes.
///
/// Unparseable client MIME types are dropped.
fn image_part(image: &ImageUpload) -> multipart::Part {
    let filename = image
        .filename
        .clone()
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "image".to_string());

    let part = multipart::Part::bytes(image.bytes.clone()).file_name(filename.clone());
    match &image.content_type {
        Some(content_type) => part
            .mime_str(content_type)
            .unwrap_or_else(|_| multipart::Part::bytes(image.bytes.clone()).file_name(filename)),
        None => part,
    }
}

/// Turn the host's answer into a hosted image or an error.
///
/// A non-success status is a rejection whatever the body says. A success
/// status must carry `success: true` and a URL.
fn interpret_response(status: StatusCode, body: &str) -> Result<HostedImage, ImageHostError> {
    if !status.is_success() {
        let message = serde_json::from_str::<UploadEnvelope>(body)
            .ok()
            .and_then(|envelope| envelope.error)
            .and_then(|error| error.message)
            .unwrap_or_else(|| truncate(body, 200));
        return Err(ImageHostError::Rejected { status, message });
    }

    let envelope: UploadEnvelope = serde_json::from_str(body)
        .map_err(|e| ImageHostError::MalformedResponse(e.to_string()))?;

    if !envelope.success {
        let message = envelope
            .error
            .and_then(|error| error.message)
            .unwrap_or_else(|| "upload reported failure".to_string());
        return Err(ImageHostError::Rejected { status, message });
    }

    envelope
        .data
        .map(|data| HostedImage { url: data.url })
        .ok_or_else(|| ImageHostError::MalformedResponse("missing data.url".to_string()))
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
