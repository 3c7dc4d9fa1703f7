//! HTTP route handlers for the triage server.

pub mod predict;

use axum::Json;

use crate::dto::RootResponse;

/// Liveness and info message.
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Triage API is running. POST to /predict/text, /predict/image, or /predict/voice.".into(),
    })
}

/// Health check endpoint.
pub async fn health() -> &'static str {
    "OK"
}
