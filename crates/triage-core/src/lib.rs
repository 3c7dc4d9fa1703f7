//! Core domain types and error definitions for triage.
//!
//! This crate provides the fundamental types shared across the triage service:
//!
//! - [`AgentError`] — Error type for decoding, pipeline, and input failures
//! - [`AgentTag`] — Identifies which agent served a request
//! - [`PredictionCandidate`] — A labeled score produced by a pipeline
//! - [`DiseasePrediction`] and [`ConditionPrediction`] — Client-facing predictions
//! - [`format_confidence`] — Score to percentage-string conversion
//!
//! # Example
//!
//! ```rust
//! use triage_core::{format_confidence, DiseasePrediction, PredictionCandidate};
//!
//! let candidate = PredictionCandidate::new("Malaria", 0.2567);
//! assert_eq!(format_confidence(candidate.score), "25.67%");
//!
//! let prediction = DiseasePrediction::from(&candidate);
//! assert_eq!(prediction.disease, "Malaria");
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while serving an agent request.
///
/// All variants currently surface as the same HTTP status; the split exists
/// so callers can branch on the failure kind.
#[derive(Error, Debug)]
pub enum AgentError {
    /// Uploaded media bytes could not be decoded.
    #[error("could not decode {media}: {reason}")]
    Decode { media: MediaKind, reason: String },

    /// The underlying pipeline failed or returned an unusable payload.
    #[error("{0}")]
    Model(String),

    /// The request was missing a field or carried a malformed one.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl AgentError {
    /// Creates a decode error for the given media kind.
    pub fn decode(media: MediaKind, reason: impl ToString) -> Self {
        Self::Decode { media, reason: reason.to_string() }
    }

    /// Creates a model invocation error.
    pub fn model(reason: impl ToString) -> Self {
        Self::Model(reason.to_string())
    }

    /// Creates an invalid input error.
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput(reason.into())
    }
}

impl From<serde_json::Error> for AgentError {
    fn from(err: serde_json::Error) -> Self {
        AgentError::Model(format!("malformed pipeline output: {err}"))
    }
}

/// Kind of uploaded media.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Audio,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Image => f.write_str("image"),
            MediaKind::Audio => f.write_str("audio"),
        }
    }
}

/// Identifies the agent that produced a response.
///
/// Serialized verbatim into the `agent` field of every response envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentTag {
    /// Static keyword guardrail on the text path.
    #[serde(rename = "Rule_Based_Engine")]
    RuleBased,
    /// Text classification model.
    #[serde(rename = "Text_BioBERT")]
    Text,
    /// Image classification model.
    #[serde(rename = "Vision_Model")]
    Vision,
    /// Speech transcription followed by text classification.
    #[serde(rename = "Voice_Whisper")]
    Voice,
}

impl AgentTag {
    /// Returns the wire name of this tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentTag::RuleBased => "Rule_Based_Engine",
            AgentTag::Text => "Text_BioBERT",
            AgentTag::Vision => "Vision_Model",
            AgentTag::Voice => "Voice_Whisper",
        }
    }
}

impl fmt::Display for AgentTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single labeled score produced by a classification pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionCandidate {
    /// Class label reported by the model.
    pub label: String,
    /// Probability in `[0, 1]`.
    pub score: f64,
}

impl PredictionCandidate {
    /// Creates a new candidate.
    pub fn new(label: impl Into<String>, score: f64) -> Self {
        Self { label: label.into(), score }
    }
}

/// Formats a probability as a percentage string with two decimals.
///
/// `0.2567` becomes `"25.67%"`.
pub fn format_confidence(score: f64) -> String {
    format!("{:.2}%", score * 100.0)
}

/// A disease prediction as returned by the text and voice agents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiseasePrediction {
    pub disease: String,
    pub confidence: String,
}

impl From<&PredictionCandidate> for DiseasePrediction {
    fn from(candidate: &PredictionCandidate) -> Self {
        Self {
            disease: candidate.label.clone(),
            confidence: format_confidence(candidate.score),
        }
    }
}

/// A visual condition prediction as returned by the vision agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionPrediction {
    pub condition: String,
    pub confidence: String,
}

impl From<&PredictionCandidate> for ConditionPrediction {
    fn from(candidate: &PredictionCandidate) -> Self {
        Self {
            condition: candidate.label.clone(),
            confidence: format_confidence(candidate.score),
        }
    }
}
