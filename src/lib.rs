//! Sahityik - a small Bengali literature publishing site
//!
//! Visitors browse approved content and open single items by slug; uploaders
//! submit new items whose image is stored on an external image host.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
pub mod theme;
