//! Upload form
//!
//! - `GET /upload` - the form, with categories to choose from
//! - `POST /upload` - multipart submission
//!
//! Every submission outcome is a redirect with a flash message: back to the
//! form on failure, to the listing on success.

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::HeaderMap,
    response::Response,
};
use tera::Context as TeraContext;

use crate::api::flash::FlashMessage;
use crate::api::middleware::{AppState, PageError};
use crate::api::responses::{redirect_with_flash, render_page};
use crate::models::{ImageUpload, Submission};
use crate::services::PublishError;

pub const MISSING_FILE_MESSAGE: &str = "দয়া করে একটি ফাইল নির্বাচন করুন।";
pub const UPLOAD_PROBLEM_MESSAGE: &str = "ছবি আপলোডে সমস্যা হয়েছে।";
pub const SUCCESS_MESSAGE: &str = "কন্টেন্ট সফলভাবে আপলোড হয়েছে!";

/// Flash text for any other failure
pub fn error_message(error: &impl std::fmt::Display) -> String {
    format!("একটি ত্রুটি ঘটেছে: {}", error)
}

/// GET /upload - show the form
pub async fn upload_form(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, PageError> {
    let categories = state.content_service.list_categories().await?;

    let mut context = TeraContext::new();
    context.insert("categories", &categories);
    Ok(render_page(&state, &headers, "upload.html", context))
}

/// POST /upload - publish a submission
pub async fn submit_upload(State(state): State<AppState>, headers: HeaderMap, multipart: Multipart) -> Response {
    let submission = match read_submission(multipart).await {
        Ok(submission) => submission,
        Err(e) => {
            tracing::warn!("Failed to read upload form: {}", e);
            return redirect_with_flash(&state, "/upload", FlashMessage::error(error_message(&e)));
        }
    };

    let user_id = state.identity.current_user(&headers);

    match state.content_service.publish(&submission, user_id).await {
        Ok(_) => redirect_with_flash(&state, "/", FlashMessage::success(SUCCESS_MESSAGE)),
        Err(PublishError::MissingFile) => {
            redirect_with_flash(&state, "/upload", FlashMessage::error(MISSING_FILE_MESSAGE))
        }
        Err(e) if e.is_image_rejection() => {
            tracing::warn!("Upload rejected: {}", e);
            redirect_with_flash(&state, "/upload", FlashMessage::error(UPLOAD_PROBLEM_MESSAGE))
        }
        Err(e) => {
            tracing::warn!("Upload failed: {}", e);
            redirect_with_flash(&state, "/upload", FlashMessage::error(error_message(&e)))
        }
    }
}

/// Collect the form fields and the `file` part.
///
/// A text field the form did not send stays `None`; one sent empty is kept
/// as an empty string. A file part without a file name or
/// without content counts as no file.
async fn read_submission(mut multipart: Multipart) -> Result<Submission, MultipartError> {
    let mut submission = Submission::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "title" => submission.title = Some(field.text().await?),
            "description" => submission.description = Some(field.text().await?),
            "slug" => submission.slug = Some(field.text().await?),
            "alt_text" => submission.alt_text = Some(field.text().await?),
            "category_id" => submission.category_id = Some(field.text().await?),
            "file" => {
                let filename = field.file_name().map(|s| s.to_string());
                let content_type = field.content_type().map(|s| s.to_string());
                let bytes = field.bytes().await?;

                let has_name = filename.as_deref().is_some_and(|n| !n.is_empty());
                if has_name && !bytes.is_empty() {
                    submission.image = Some(ImageUpload {
                        filename,
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            _ => {}
        }
    }

    Ok(submission)
}
