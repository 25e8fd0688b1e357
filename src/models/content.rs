//! Content model
//!
//! A content item is a published unit: title, description, hosted image and an
//! optional category. Items are created by the upload form and never updated
//! or deleted by this application.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Content entity as read back from the datastore, with its category's
/// display name already joined in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Content {
    /// Unique identifier
    pub id: i64,
    /// Title
    pub title: Option<String>,
    /// Free-text description
    pub description: Option<String>,
    /// Public lookup key used in `/content/{slug}`
    pub slug: Option<String>,
    /// Alt text for the image
    pub alt_text: Option<String>,
    /// Category reference
    pub category_id: Option<i64>,
    /// Category display name, joined from `categories.name_bn`
    pub category_name: Option<String>,
    /// Public URL of the externally hosted image
    pub file_url: String,
    /// Visibility gate for the public pages
    pub is_approved: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Owning user
    pub user_id: Option<String>,
}

/// Record inserted into the `contents` table.
///
/// Text fields are taken from the form verbatim; nothing beyond the presence
/// of an image is validated. A field the form did not send is stored as null.
/// Slug uniqueness is left to the datastore.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NewContent {
    pub user_id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub slug: Option<String>,
    pub alt_text: Option<String>,
    pub category_id: Option<String>,
    pub file_url: String,
    pub is_approved: bool,
}

/// An image received from the upload form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    /// Client-supplied file name, if any
    pub filename: Option<String>,
    /// Client-supplied MIME type, if any
    pub content_type: Option<String>,
    /// Raw file bytes
    pub bytes: Vec<u8>,
}

/// A parsed upload form submission. Text fields are `None` when the form
/// carried no part of that name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Submission {
    pub title: Option<String>,
    pub description: Option<String>,
    pub slug: Option<String>,
    pub alt_text: Option<String>,
    pub category_id: Option<String>,
    /// `None` when the form carried no file, or an empty file part
    pub image: Option<ImageUpload>,
}

impl NewContent {
    /// Build the record for a submission whose image is already hosted at
    /// `file_url`.
    pub fn from_submission(
        submission: &Submission,
        file_url: String,
        user_id: String,
        is_approved: bool,
    ) -> Self {
        Self {
            user_id,
            title: submission.title.clone(),
            description: submission.description.clone(),
            slug: submission.slug.clone(),
            alt_text: submission.alt_text.clone(),
            category_id: submission.category_id.clone(),
            file_url,
            is_approved,
        }
    }
}
