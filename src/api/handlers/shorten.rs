//! Handler for link shortening endpoint.

use axum::{
    Extension, Json,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
};
use validator::Validate;

use crate::api::dto::shorten::{
    BatchShortenItem, BatchShortenResult, ShortenRequest, ShortenResponse,
};
use crate::application::services::Shortened;
use crate::domain::entities::CurrentUser;
use crate::error::AppError;
use crate::state::AppState;

/// Creates a short URL for one long URL.
///
/// # Endpoint
///
/// `POST /api/shorten`
///
/// # Request Body
///
/// ```json
/// { "url": "https://example.com" }
/// ```
///
/// # Response
///
/// ```json
/// { "result": "http://localhost:8080/Ab3dE_fG9hIj" }
/// ```
///
/// - **201 Created**: a new short URL was stored
/// - **409 Conflict**: the URL was already shortened; `result` is the existing short URL
///
/// # Errors
///
/// Returns 400 Bad Request if the URL is not a valid HTTP(S) URL.
pub async fn shorten_handler(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<ShortenRequest>,
) -> Result<(StatusCode, Json<ShortenResponse>), AppError> {
    payload.validate()?;

    let (status, result) = match state
        .link_service
        .shorten(&payload.url, &user.user_id)
        .await?
    {
        Shortened::Created(url) => (StatusCode::CREATED, url),
        Shortened::Existing(url) => (StatusCode::CONFLICT, url),
    };

    Ok((status, Json(ShortenResponse { result })))
}

/// Creates a short URL from a plain-text body.
///
/// # Endpoint
///
/// `POST /`
///
/// The body is the URL itself; the response body is the short URL as
/// `text/plain`, with the same 201/409/400 codes as `POST /api/shorten`.
pub async fn shorten_text_handler(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    body: String,
) -> Result<impl IntoResponse, AppError> {
    let (status, result) = match state.link_service.shorten(&body, &user.user_id).await? {
        Shortened::Created(url) => (StatusCode::CREATED, url),
        Shortened::Existing(url) => (StatusCode::CONFLICT, url),
    };

    Ok((
        status,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        result,
    ))
}

/// Creates short URLs for several long URLs at once.
///
/// # Endpoint
///
/// `POST /api/shorten/batch`
///
/// # Request Body
///
/// ```json
/// [{ "correlation_id": "1", "original_url": "https://example.com" }]
/// ```
///
/// # Response
///
/// **201 Created** with one result per item, in request order:
///
/// ```json
/// [{ "correlation_id": "1", "short_url": "http://localhost:8080/Ab3dE_fG9hIj" }]
/// ```
///
/// Already shortened URLs resolve to their existing short URL.
///
/// # Errors
///
/// Returns 400 Bad Request for an empty batch or if any URL is invalid;
/// nothing is stored in that case.
pub async fn shorten_batch_handler(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(items): Json<Vec<BatchShortenItem>>,
) -> Result<(StatusCode, Json<Vec<BatchShortenResult>>), AppError> {
    let urls: Vec<String> = items.iter().map(|i| i.original_url.clone()).collect();
    let short_urls = state.link_service.shorten_batch(&urls, &user.user_id).await?;

    let results = items
        .into_iter()
        .zip(short_urls)
        .map(|(item, short_url)| BatchShortenResult {
            correlation_id: item.correlation_id,
            short_url,
        })
        .collect();

    Ok((StatusCode::CREATED, Json(results)))
}
