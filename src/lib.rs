//! # URL Shortener
//!
//! A URL shortening service built with Axum, with asynchronous audit delivery
//! and batched background deletion.
//!
//! ## Architecture
//!
//! This crate follows Clean Architecture principles with clear layer separation:
//!
//! - **Domain Layer** ([`domain`]) - Entities, events and repository traits
//! - **Application Layer** ([`application`]) - Business logic and service orchestration
//! - **Infrastructure Layer** ([`infrastructure`]) - Memory and file storage
//! - **API Layer** ([`api`]) - REST API handlers, DTOs, and middleware
//!
//! Two background subsystems keep slow side effects off the request path:
//!
//! - [`audit`] - fans shorten/follow events out to HTTP and file sinks
//! - [`deletion`] - groups bulk-delete requests into size/time bounded batches
//!
//! ## Quick Start
//!
//! ```bash
//! export AUTH_SECRET="change-me"
//! export AUDIT_FILE="/tmp/audit.log"     # Optional
//! export FILE_STORAGE_PATH="urls.jsonl"  # Optional, in-memory otherwise
//!
//! cargo run
//! ```
//!
//! ## Configuration
//!
//! Service configuration is loaded from environment variables via [`config::Config`].
//! See [`config`] module for available options.

pub mod api;
pub mod application;
pub mod audit;
pub mod deletion;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod state;
pub mod utils;

pub mod config;
pub mod server;

pub mod routes;

pub use error::AppError;
pub use state::AppState;

/// Commonly used types for external consumers.
///
/// Re-exports frequently used types to simplify imports for library users
/// and integration tests.
pub mod prelude {
    pub use crate::application::services::{AuthService, LinkService, Shortened};
    pub use crate::audit::{AuditDispatcher, AuditSink};
    pub use crate::deletion::{BatchConfig, DeletionPipeline};
    pub use crate::domain::audit_event::{AuditAction, AuditEvent};
    pub use crate::domain::delete_request::{DeleteBatch, DeleteRequest};
    pub use crate::domain::entities::{CurrentUser, UrlRecord};
    pub use crate::domain::repositories::{StorageError, UrlRepository};
    pub use crate::error::AppError;
    pub use crate::state::AppState;
}
