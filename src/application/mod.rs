//! Application layer services implementing business logic.
//!
//! Services coordinate repository calls, validation and the background
//! audit and deletion stages, and expose a small API to HTTP handlers.
//!
//! # Available Services
//!
//! - [`services::link_service::LinkService`] - Shorten, expand, list and delete links
//! - [`services::auth_service::AuthService`] - Signed identity cookies

pub mod services;
