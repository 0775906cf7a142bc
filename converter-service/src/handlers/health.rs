use axum::{response::IntoResponse, Json};
use serde_json::json;

/// Liveness probe. Never touches the converter.
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "message": "PDF Converter API is running"
    }))
}
