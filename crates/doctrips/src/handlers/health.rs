//! Health check endpoints.
//!
//! - `/livez` - liveness check (immediate 200, touches nothing)
//! - `/healthz` - storage check, reporting the current trips year

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::state::AppState;

/// GET /livez - Basic liveness check.
#[axum::debug_handler]
pub async fn livez() -> StatusCode {
    StatusCode::OK
}

/// GET /healthz - 200 when storage answers, 503 otherwise.
#[axum::debug_handler]
pub async fn healthz(State(state): State<AppState>) -> Response {
    match state.years.current_year().await {
        Ok(year) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "trips_year": year.map(|y| y.year),
            })),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unavailable",
                    "error": e.to_string(),
                })),
            )
                .into_response()
        }
    }
}
