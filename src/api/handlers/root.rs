use axum::response::{IntoResponse, Json};
use serde_json::json;

/// Liveness only; does not touch the identity provider.
pub async fn root() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
