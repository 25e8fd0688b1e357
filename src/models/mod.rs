//! Data models
//!
//! This module contains the data structures used throughout the Sahityik site.
//! Models represent:
//! - Datastore entities (Content, Category)
//! - Upload inputs handed from the form to the publishing service

mod category;
mod content;

pub use category::Category;
pub use content::{Content, ImageUpload, NewContent, Submission};
