//! The three request agents and their output normalization.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};
use triage_core::{AgentError, AgentTag, ConditionPrediction, DiseasePrediction, MediaKind};
use triage_models::{
    decode_audio, decode_image, AudioHint, ImageClassifier, TextClassifier, Transcriber,
};

use crate::guardrail::GuardrailMatcher;

/// Number of candidates requested from the text classifier.
pub const TEXT_TOP_K: usize = 3;

/// Result of the text agent.
#[derive(Debug, Clone, PartialEq)]
pub struct TextOutcome {
    pub agent: AgentTag,
    pub predictions: Vec<DiseasePrediction>,
}

/// Result of the vision agent.
#[derive(Debug, Clone, PartialEq)]
pub struct VisionOutcome {
    pub predictions: Vec<ConditionPrediction>,
}

/// Result of the voice agent.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceOutcome {
    pub transcription: String,
    pub symptom_analysis: Vec<DiseasePrediction>,
}

/// Classifies text and keeps the top three, formatted for clients.
async fn top_diseases(
    classifier: &dyn TextClassifier,
    text: &str,
) -> Result<Vec<DiseasePrediction>, AgentError> {
    let candidates = classifier.classify_text(text, TEXT_TOP_K).await?;
    if candidates.len() > TEXT_TOP_K {
        warn!(model = classifier.name(), returned = candidates.len(), "classifier ignored top_k; truncating");
    }
    Ok(candidates
        .iter()
        .take(TEXT_TOP_K)
        .map(DiseasePrediction::from)
        .collect())
}

/// Text agent: guardrail first, then the text classifier.
pub struct TextAgent {
    classifier: Arc<dyn TextClassifier>,
    guardrail: GuardrailMatcher,
}

impl TextAgent {
    pub fn new(classifier: Arc<dyn TextClassifier>, guardrail: GuardrailMatcher) -> Self {
        Self { classifier, guardrail }
    }

    /// Predicts diseases for a free-text symptom description.
    pub async fn predict(&self, text: &str) -> Result<TextOutcome, AgentError> {
        if text.is_empty() {
            return Err(AgentError::invalid_input("text must not be empty"));
        }

        if let Some(hit) = self.guardrail.check(text) {
            info!(disease = %hit.disease, "guardrail matched");
            return Ok(TextOutcome {
                agent: AgentTag::RuleBased,
                predictions: vec![hit],
            });
        }

        let start = Instant::now();
        let predictions = top_diseases(self.classifier.as_ref(), text).await?;
        info!(
            model = self.classifier.name(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "text agent finished"
        );
        Ok(TextOutcome {
            agent: AgentTag::Text,
            predictions,
        })
    }
}

/// Vision agent: decode the upload, then classify it.
pub struct VisionAgent {
    classifier: Arc<dyn ImageClassifier>,
}

impl VisionAgent {
    pub fn new(classifier: Arc<dyn ImageClassifier>) -> Self {
        Self { classifier }
    }

    /// Analyzes an uploaded image. Every candidate the model returns is kept.
    pub async fn analyze(&self, bytes: Vec<u8>) -> Result<VisionOutcome, AgentError> {
        if bytes.is_empty() {
            return Err(AgentError::invalid_input("uploaded image is empty"));
        }

        let image = tokio::task::spawn_blocking(move || decode_image(bytes))
            .await
            .map_err(|e| AgentError::decode(MediaKind::Image, e))??;

        let candidates = self.classifier.classify_image(&image).await?;
        info!(
            model = self.classifier.name(),
            width = image.width,
            height = image.height,
            count = candidates.len(),
            "vision agent finished"
        );
        Ok(VisionOutcome {
            predictions: candidates.iter().map(ConditionPrediction::from).collect(),
        })
    }
}

/// Voice agent: transcribe the upload, then run the transcript through the
/// text classifier. The guardrail is not consulted.
pub struct VoiceAgent {
    transcriber: Arc<dyn Transcriber>,
    classifier: Arc<dyn TextClassifier>,
}

impl VoiceAgent {
    pub fn new(transcriber: Arc<dyn Transcriber>, classifier: Arc<dyn TextClassifier>) -> Self {
        Self { transcriber, classifier }
    }

    pub async fn transcribe_and_analyze(
        &self,
        bytes: Vec<u8>,
        hint: AudioHint,
    ) -> Result<VoiceOutcome, AgentError> {
        if bytes.is_empty() {
            return Err(AgentError::invalid_input("uploaded audio is empty"));
        }

        let audio = tokio::task::spawn_blocking(move || decode_audio(bytes, &hint))
            .await
            .map_err(|e| AgentError::decode(MediaKind::Audio, e))??;

        let transcription = self.transcriber.transcribe(&audio).await?;
        info!(model = self.transcriber.name(), duration_secs = ?audio.duration_secs, "transcribed audio");

        let symptom_analysis = top_diseases(self.classifier.as_ref(), &transcription).await?;
        Ok(VoiceOutcome {
            transcription,
            symptom_analysis,
        })
    }
}
