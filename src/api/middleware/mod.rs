//! HTTP middleware for request processing.
//!
//! Provides identity resolution and observability middleware.

pub mod auth;
pub mod tracing;
