//! Handler for short URL redirect.

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::{IntoResponse, Redirect},
};

use crate::api::middleware::auth::current_user;
use crate::error::AppError;
use crate::state::AppState;

/// Redirects a short id to its original URL.
///
/// # Endpoint
///
/// `GET /{short_id}`
///
/// A `follow` audit event is published for every successful redirect, carrying
/// the caller's id when a valid identity cookie is present.
///
/// # Errors
///
/// Returns 404 Not Found if the short id doesn't exist.
/// Returns 410 Gone if the link was deleted.
pub async fn redirect_handler(
    Path(short_id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let user = current_user(&state.auth_service, &headers);

    let original_url = state
        .link_service
        .expand(&short_id, user.as_ref().map(|u| u.user_id.as_str()))
        .await?;

    Ok(Redirect::temporary(&original_url))
}
