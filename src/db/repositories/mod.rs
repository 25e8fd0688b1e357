//! Datastore repositories
//!
//! Repository pattern implementations for datastore access.
//! Each repository handles one table and comes in two backends:
//! SQLite (`Sqlx*`) and the hosted table API (`Rest*`).

pub mod category;
pub mod content;

pub use category::{CategoryRepository, RestCategoryRepository, SqlxCategoryRepository};
pub use content::{ContentRepository, RestContentRepository, SqlxContentRepository};
