//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET    /{short_id}`     - Short link redirect (public)
//! - `GET    /ping`           - Storage and pipeline health (public)
//! - `POST   /`               - Create a short URL from a text/plain body
//! - `POST   /api/shorten`    - Create a short URL (identity issued if missing)
//! - `POST   /api/shorten/batch` - Create several short URLs
//! - `GET    /api/user/urls`  - Caller's links (identity cookie required)
//! - `DELETE /api/user/urls`  - Bulk delete (identity cookie required)
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Identity** - Signed cookie, issued or required per route group
//! - **Compression** - gzip request bodies are inflated, responses gzipped
//!   when the client accepts it
//! - **Path normalization** - Trailing slash handling

use crate::api;
use crate::api::handlers::{health_handler, redirect_handler, shorten_text_handler};
use crate::api::middleware::{auth, tracing};
use crate::state::AppState;
use axum::routing::{get, post};
use axum::{Router, middleware};
use tower::Layer;
use tower_http::compression::CompressionLayer;
use tower_http::decompression::RequestDecompressionLayer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Constructs the application router with all routes and middleware.
pub fn app_router(state: AppState) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(router(state))
}

/// Routes and middleware without path normalization.
pub fn router(state: AppState) -> Router {
    let identify = middleware::from_fn_with_state(state.clone(), auth::identify);

    let public_root = Router::new()
        .route("/", post(shorten_text_handler))
        .route_layer(identify.clone());

    let public_api = api::routes::public_routes().route_layer(identify);

    let protected_api = api::routes::protected_routes().route_layer(
        middleware::from_fn_with_state(state.clone(), auth::require),
    );

    Router::new()
        .route("/ping", get(health_handler))
        .route("/{short_id}", get(redirect_handler))
        .merge(public_root)
        .nest("/api", public_api.merge(protected_api))
        .with_state(state)
        .layer(RequestDecompressionLayer::new())
        .layer(CompressionLayer::new())
        .layer(tracing::layer())
}
