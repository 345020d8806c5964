//! Handlers for the caller's own links.

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::api::dto::user_urls::UserUrlItem;
use crate::domain::entities::CurrentUser;
use crate::error::AppError;
use crate::state::AppState;

/// Lists the caller's live links.
///
/// # Endpoint
///
/// `GET /api/user/urls`
///
/// # Response
///
/// - **200 OK**: `[{"short_url": "...", "original_url": "..."}]`
/// - **204 No Content**: the caller owns no live links
pub async fn user_urls_handler(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Response, AppError> {
    let items: Vec<UserUrlItem> = state
        .link_service
        .user_urls(&user.user_id)
        .await?
        .into_iter()
        .map(UserUrlItem::from)
        .collect();

    if items.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }
    Ok(Json(items).into_response())
}

/// Queues deletion of the caller's links.
///
/// # Endpoint
///
/// `DELETE /api/user/urls`
///
/// # Request Body
///
/// ```json
/// ["Ab3dE_fG9hIj", "Zx8yW-vU7tSr"]
/// ```
///
/// Always answers **202 Accepted**: deletion happens in the background, and
/// ids the caller does not own are ignored.
pub async fn delete_user_urls_handler(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(short_ids): Json<Vec<String>>,
) -> StatusCode {
    state.link_service.delete_urls(&user.user_id, short_ids);
    StatusCode::ACCEPTED
}
