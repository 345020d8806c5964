//! API route configuration.

use crate::api::handlers::{
    delete_user_urls_handler, shorten_batch_handler, shorten_handler, user_urls_handler,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

/// Routes open to anonymous callers; an identity is issued on first use.
///
/// # Endpoints
///
/// - `POST /shorten`       - Create a short URL
/// - `POST /shorten/batch` - Create several short URLs
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/shorten", post(shorten_handler))
        .route("/shorten/batch", post(shorten_batch_handler))
}

/// Routes that require an existing identity cookie.
///
/// # Endpoints
///
/// - `GET    /user/urls` - List the caller's links
/// - `DELETE /user/urls` - Queue deletion of the caller's links
pub fn protected_routes() -> Router<AppState> {
    Router::new().route(
        "/user/urls",
        get(user_urls_handler).delete(delete_user_urls_handler),
    )
}
