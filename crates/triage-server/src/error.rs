//! Application error types and Axum response conversion.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::debug;
use triage_core::AgentError;

/// An agent failure, tagged with the endpoint family that produced it.
///
/// Every variant is reported as a 500 with a `detail` string; the image and
/// voice families prefix the detail so clients can tell the paths apart.
#[derive(Debug)]
pub enum AppError {
    Text(AgentError),
    Image(AgentError),
    Voice(AgentError),
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

impl AppError {
    /// Human-readable detail sent to the client.
    pub fn detail(&self) -> String {
        match self {
            AppError::Text(e) => e.to_string(),
            AppError::Image(e) => format!("Image processing failed: {e}"),
            AppError::Voice(e) => format!("Voice processing failed: {e}"),
        }
    }

    fn source(&self) -> &AgentError {
        match self {
            AppError::Text(e) | AppError::Image(e) | AppError::Voice(e) => e,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self.source() {
            AgentError::Decode { .. } | AgentError::Model(_) | AgentError::InvalidInput(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let detail = self.detail();
        debug!(status = status.as_u16(), "{}", detail);
        (status, Json(ErrorResponse { detail })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::capture_logs;
    use tracing::Level;
    use triage_core::MediaKind;

    #[test]
    fn detail_is_prefixed_per_endpoint_family() {
        let err = AppError::Text(AgentError::model("boom"));
        assert_eq!(err.detail(), "boom");

        let err = AppError::Image(AgentError::decode(MediaKind::Image, "bad header"));
        assert_eq!(err.detail(), "Image processing failed: could not decode image: bad header");

        let err = AppError::Voice(AgentError::invalid_input("missing file"));
        assert_eq!(err.detail(), "Voice processing failed: invalid input: missing file");
    }

    #[test]
    fn every_kind_maps_to_internal_error() {
        let errors = [
            AppError::Text(AgentError::invalid_input("x")),
            AppError::Image(AgentError::model("x")),
            AppError::Voice(AgentError::decode(MediaKind::Audio, "x")),
        ];
        for err in errors {
            assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    #[test]
    fn conversion_leaves_error_level_logging_to_the_trace_layer() {
        let (logs, _guard) = capture_logs(Level::ERROR);
        let response = AppError::Image(AgentError::model("backend unavailable")).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(logs.contents().is_empty());
    }
}
