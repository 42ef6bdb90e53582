//! ReadUp Common Library
//!
//! Shared code for the ReadUp services including:
//! - Database entities and repository pattern
//! - Review and reading-list services
//! - Catalog (bestseller feed / volume search) clients
//! - Identity-provider client and session verification
//! - Error types and handling
//! - Configuration management
//! - Metrics and observability

pub mod auth;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod db;
pub mod errors;
pub mod identity;
pub mod lists;
pub mod metrics;
pub mod reviews;

// Re-export commonly used types
pub use config::AppConfig;
pub use db::Repository;
pub use errors::{AppError, Result};
pub use identity::{IdentityProvider, UserProfile};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Placeholder nickname used when an identity lookup fails or yields no name
pub const ANONYMOUS_NICKNAME: &str = "Anonymous";
