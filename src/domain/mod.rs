//! Domain layer containing business entities and background event models.
//!
//! # Architecture
//!
//! - [`entities`] - Stored data structures
//! - [`repositories`] - Storage trait definitions
//! - [`audit_event`] - Audit event published after shorten/follow operations
//! - [`delete_request`] - Units of work for the batched deletion pipeline
//!
//! # Background Processing Flow
//!
//! 1. A handler completes a shorten or redirect
//! 2. An [`audit_event::AuditEvent`] is published to [`crate::audit::AuditDispatcher`]
//! 3. A bulk-delete request is split into [`delete_request::DeleteRequest`]s
//! 4. [`crate::deletion::DeletionPipeline`] groups them into batches for
//!    [`repositories::UrlRepository::bulk_delete`]

pub mod audit_event;
pub mod delete_request;
pub mod entities;
pub mod repositories;
