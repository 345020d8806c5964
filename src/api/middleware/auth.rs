//! Identity cookie middleware.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, header},
    middleware::Next,
    response::Response,
};
use serde_json::json;
use tracing::{debug, warn};

use crate::application::services::AuthService;
use crate::domain::entities::CurrentUser;
use crate::{error::AppError, state::AppState};

/// Resolves the caller, issuing a new identity when the cookie is missing.
///
/// # Identity Flow
///
/// 1. Read the identity cookie and verify its signature
/// 2. If absent or invalid, create a fresh user id and sign it
/// 3. Insert [`CurrentUser`] into request extensions
/// 4. Run the handler and attach `Set-Cookie` for newly issued identities
///
/// Used on routes that work for anonymous callers, such as shortening.
pub async fn identify(State(st): State<AppState>, mut req: Request, next: Next) -> Response {
    if let Some(user) = current_user(&st.auth_service, req.headers()) {
        req.extensions_mut().insert(user);
        return next.run(req).await;
    }

    let (user_id, cookie) = st.auth_service.issue();
    debug!(user_id = %user_id, "Issued new identity");
    req.extensions_mut().insert(CurrentUser::new(user_id));

    let mut response = next.run(req).await;
    match HeaderValue::from_str(&st.auth_service.set_cookie(&cookie)) {
        Ok(value) => {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
        Err(e) => warn!(error = %e, "Failed to encode identity cookie"),
    }
    response
}

/// Requires a valid identity cookie.
///
/// # Errors
///
/// Returns `401 Unauthorized` if the cookie is missing or its signature does
/// not match.
pub async fn require(
    State(st): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = current_user(&st.auth_service, req.headers()).ok_or_else(|| {
        AppError::unauthorized(
            "Unauthorized",
            json!({"reason": "Identity cookie is missing or invalid"}),
        )
    })?;

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Returns the caller carried by a valid identity cookie, if any.
pub fn current_user(auth: &AuthService, headers: &HeaderMap) -> Option<CurrentUser> {
    cookie_value(headers, auth.cookie_name())
        .and_then(|value| auth.verify(value))
        .map(CurrentUser::new)
}

fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}
