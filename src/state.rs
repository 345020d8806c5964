//! Shared application state injected into handlers.

use std::sync::Arc;

use crate::application::services::{AuthService, LinkService};
use crate::audit::AuditDispatcher;
use crate::deletion::DeletionPipeline;

/// Handles to the services and background stages.
///
/// Cloned per request; every field is reference counted.
#[derive(Clone)]
pub struct AppState {
    pub link_service: Arc<LinkService>,
    pub auth_service: Arc<AuthService>,
    pub audit: Arc<AuditDispatcher>,
    pub deletion: Arc<DeletionPipeline>,
}
