//! Category model
//!
//! Categories are created and managed outside this application. They are read
//! to populate the upload form and to annotate content items for display.

use serde::{Deserialize, Serialize};

/// Category entity as stored in the `categories` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    /// Unique identifier
    pub id: i64,
    /// Display name (Bengali)
    pub name_bn: String,
}

impl Category {
    pub fn new(id: i64, name_bn: impl Into<String>) -> Self {
        Self {
            id,
            name_bn: name_bn.into(),
        }
    }
}
