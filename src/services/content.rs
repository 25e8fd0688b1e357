//! Content service
//!
//! Implements the publishing flow and the read paths used by the pages:
//! - List approved content, newest first
//! - Look up one item by slug
//! - List categories for the upload form
//! - Publish a submission: host the image, then insert the record
//!
//! Publishing is two independent remote operations. If the insert fails after
//! the image was hosted, the hosted image is left in place (at-most-once, no
//! compensation) and the orphaned URL is logged.

use crate::db::repositories::{CategoryRepository, ContentRepository};
use crate::models::{Category, Content, NewContent, Submission};
use crate::services::approval::{ApprovalPolicy, AutoApprove};
use crate::services::image_host::{ImageHost, ImageHostError};
use anyhow::Result;
use std::sync::Arc;

/// Error types for publishing
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// The form carried no file
    #[error("No file was submitted")]
    MissingFile,

    /// The image host could not be used
    #[error(transparent)]
    ImageHost(#[from] ImageHostError),

    /// The record could not be stored
    #[error("Failed to save content: {0:#}")]
    Datastore(anyhow::Error),
}

impl PublishError {
    /// Whether the image host answered and refused the upload
    pub fn is_image_rejection(&self) -> bool {
        matches!(self, Self::ImageHost(ImageHostError::Rejected { .. }))
    }
}

/// Content service
pub struct ContentService {
    contents: Arc<dyn ContentRepository>,
    categories: Arc<dyn CategoryRepository>,
    image_host: Arc<dyn ImageHost>,
    approval: Arc<dyn ApprovalPolicy>,
}

impl ContentService {
    /// Create a content service that approves every submission
    pub fn new(
        contents: Arc<dyn ContentRepository>,
        categories: Arc<dyn CategoryRepository>,
        image_host: Arc<dyn ImageHost>,
    ) -> Self {
        Self {
            contents,
            categories,
            image_host,
            approval: Arc::new(AutoApprove),
        }
    }

    /// Replace the approval policy
    pub fn with_approval_policy(mut self, approval: Arc<dyn ApprovalPolicy>) -> Self {
        self.approval = approval;
        self
    }

    /// All approved content, newest first
    pub async fn list_approved(&self) -> Result<Vec<Content>> {
        self.contents.list_approved().await
    }

    /// Content with the given slug, if any
    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<Content>> {
        self.contents.find_by_slug(slug).await
    }

    /// All categories, for the upload form
    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        self.categories.list().await
    }

    /// Publish a submission on behalf of `user_id`.
    ///
    /// # Errors
    /// - `MissingFile` without touching the image host or the datastore
    /// - `ImageHost` without touching the datastore
    /// - `Datastore` after the image was already hosted
    pub async fn publish(&self, submission: &Submission, user_id: String) -> Result<Content, PublishError> {
        let image = submission.image.as_ref().ok_or(PublishError::MissingFile)?;

        let hosted = self.image_host.upload(image).await?;
        tracing::debug!("Image hosted at {}", hosted.url);

        let mut record = NewContent::from_submission(submission, hosted.url, user_id, false);
        record.is_approved = self.approval.approve(&record);

        match self.contents.create(&record).await {
            Ok(content) => {
                tracing::info!("Published content {:?} (id {})", content.slug, content.id);
                Ok(content)
            }
            Err(e) => {
                tracing::warn!(
                    "Insert failed after hosting image {}; the image is orphaned: {:#}",
                    record.file_url,
                    e
                );
                Err(PublishError::Datastore(e))
            }
        }
    }
}
