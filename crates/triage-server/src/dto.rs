//! Data transfer objects for HTTP message serialization.

use serde::{Deserialize, Serialize};
use triage_core::{AgentTag, ConditionPrediction, DiseasePrediction};
use triage_engine::{TextOutcome, VisionOutcome, VoiceOutcome};

/// Outcome marker carried by every success envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
}

/// Response from `GET /`.
#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: String,
}

// === Text Types ===

/// Text fields accepted by the text endpoint, from any body encoding.
#[derive(Debug, Default, Deserialize)]
pub struct TextFields {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub temperature: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

/// Response from the text endpoint.
#[derive(Debug, Serialize)]
pub struct TextPredictionResponse {
    pub top_predictions: Vec<DiseasePrediction>,
    pub status: Status,
    pub agent: AgentTag,
}

impl From<TextOutcome> for TextPredictionResponse {
    fn from(outcome: TextOutcome) -> Self {
        Self {
            top_predictions: outcome.predictions,
            status: Status::Success,
            agent: outcome.agent,
        }
    }
}

// === Media Types ===

/// Response from the image endpoint.
#[derive(Debug, Serialize)]
pub struct ImageAnalysisResponse {
    pub analysis: Vec<ConditionPrediction>,
    pub status: Status,
    pub agent: AgentTag,
}

impl From<VisionOutcome> for ImageAnalysisResponse {
    fn from(outcome: VisionOutcome) -> Self {
        Self {
            analysis: outcome.predictions,
            status: Status::Success,
            agent: AgentTag::Vision,
        }
    }
}

/// Response from the voice endpoint.
#[derive(Debug, Serialize)]
pub struct VoiceAnalysisResponse {
    pub transcription: String,
    pub symptom_analysis: Vec<DiseasePrediction>,
    pub status: Status,
    pub agent: AgentTag,
}

impl From<VoiceOutcome> for VoiceAnalysisResponse {
    fn from(outcome: VoiceOutcome) -> Self {
        Self {
            transcription: outcome.transcription,
            symptom_analysis: outcome.symptom_analysis,
            status: Status::Success,
            agent: AgentTag::Voice,
        }
    }
}
