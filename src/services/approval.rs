//! Approval policy
//!
//! Decides the approval flag of newly submitted content. Only approved
//! content shows up in the public listing.

use crate::models::NewContent;

/// Decides whether a new record is published immediately
pub trait ApprovalPolicy: Send + Sync {
    fn approve(&self, draft: &NewContent) -> bool;
}

/// Publishes everything without moderation
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoApprove;

impl ApprovalPolicy for AutoApprove {
    fn approve(&self, _draft: &NewContent) -> bool {
        true
    }
}
