use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::AppState;

#[axum::debug_handler]
pub async fn health() -> impl IntoResponse {
    let config = crate::config::get_config();
    let body = json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "ai_configured": config.gemini_api_key.is_some(),
    });
    (StatusCode::OK, Json(body))
}

/// Readiness: 200 once the database answers, 503 otherwise.
#[axum::debug_handler]
pub async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    match sqlx::query("SELECT 1").execute(&state.pool).await {
        Ok(_) => (StatusCode::OK, Json(json!({ "status": "ready" }))),
        Err(e) => {
            tracing::warn!(error = %e, "readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable" })),
            )
        }
    }
}
