//! Handler for the ping endpoint.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::health::{CheckStatus, HealthChecks, HealthResponse};
use crate::state::AppState;

/// Returns service health with component checks.
///
/// # Endpoint
///
/// `GET /ping`
///
/// # Response Codes
///
/// - **200 OK**: storage answers
/// - **503 Service Unavailable**: storage or the deletion pipeline is down
///
/// The audit check is informational: it reports whether any sink is
/// configured and how many events were dropped.
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let storage = match state.link_service.ping().await {
        Ok(()) => CheckStatus::ok("Storage reachable"),
        Err(e) => CheckStatus::error(format!("Storage error: {e}")),
    };

    let audit = if state.audit.is_enabled() {
        CheckStatus::ok(format!("Dropped events: {}", state.audit.dropped_events()))
    } else {
        CheckStatus::ok("No sinks configured")
    };

    let deletion = if state.deletion.is_running() {
        CheckStatus::ok("Running")
    } else {
        CheckStatus::error("Deletion pipeline stopped")
    };

    let all_healthy = storage.is_ok() && deletion.is_ok();

    let response = HealthResponse {
        status: if all_healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            storage,
            audit,
            deletion,
        },
    };

    if all_healthy {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}
