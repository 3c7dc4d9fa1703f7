//! Prediction handlers, one per agent.

use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use tracing::{debug, info};
use triage_core::AgentError;

use crate::dto::{ImageAnalysisResponse, TextPredictionResponse, VoiceAnalysisResponse};
use crate::error::AppError;
use crate::extract::{read_upload, TextSubmission};
use crate::ServerState;

/// Text prediction. Served at both `/predict` and `/predict/text`.
pub async fn text(
    State(state): State<Arc<ServerState>>,
    submission: TextSubmission,
) -> Result<Json<TextPredictionResponse>, AppError> {
    info!(chars = submission.text.chars().count(), "Text request");
    debug!(
        temperature = ?submission.temperature,
        location = ?submission.location,
        image_bytes = submission.image.as_ref().map(|i| i.bytes.len()),
        "unused text request fields"
    );

    let outcome = state
        .agents
        .text
        .predict(&submission.text)
        .await
        .map_err(AppError::Text)?;
    Ok(Json(outcome.into()))
}

/// Image classification from a multipart upload.
pub async fn image(
    State(state): State<Arc<ServerState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ImageAnalysisResponse>, AppError> {
    let multipart = multipart.map_err(|e| AppError::Image(AgentError::invalid_input(e.body_text())))?;
    let upload = read_upload(multipart).await.map_err(AppError::Image)?;
    info!(file = ?upload.file_name, bytes = upload.bytes.len(), "Image request");

    let outcome = state
        .agents
        .vision
        .analyze(upload.bytes)
        .await
        .map_err(AppError::Image)?;
    Ok(Json(outcome.into()))
}

/// Speech transcription followed by symptom classification.
pub async fn voice(
    State(state): State<Arc<ServerState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<VoiceAnalysisResponse>, AppError> {
    let multipart = multipart.map_err(|e| AppError::Voice(AgentError::invalid_input(e.body_text())))?;
    let upload = read_upload(multipart).await.map_err(AppError::Voice)?;
    info!(file = ?upload.file_name, bytes = upload.bytes.len(), "Voice request");

    let (bytes, hint) = upload.into_audio();
    let outcome = state
        .agents
        .voice
        .transcribe_and_analyze(bytes, hint)
        .await
        .map_err(AppError::Voice)?;
    Ok(Json(outcome.into()))
}
