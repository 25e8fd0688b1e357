//! Services layer - Business logic
//!
//! Services sit between the HTTP handlers and the external systems:
//! - Publishing (image host then datastore) and the read paths
//! - The identity and approval seams
//! - The image host client

pub mod approval;
pub mod content;
pub mod identity;
pub mod image_host;

pub use approval::{ApprovalPolicy, AutoApprove};
pub use content::{ContentService, PublishError};
pub use identity::{IdentityProvider, PlaceholderIdentity};
pub use image_host::{HostedImage, ImageHost, ImageHostError, ImgbbClient};
