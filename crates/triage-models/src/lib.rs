//! Pipeline abstractions and the hosted inference backend.
//!
//! This crate provides the seam between the triage agents and the models
//! that actually produce predictions:
//!
//! - [`TextClassifier`], [`ImageClassifier`], [`Transcriber`] — Pipeline traits
//! - [`DecodedImage`] and [`DecodedAudio`] — Validated media payloads
//! - [`HubPipeline`] — Hugging Face inference protocol client
//!
//! # Implementing a Custom Pipeline
//!
//! ```rust,ignore
//! use triage_models::TextClassifier;
//! use triage_core::{AgentError, PredictionCandidate};
//! use async_trait::async_trait;
//!
//! struct KeywordModel;
//!
//! #[async_trait]
//! impl TextClassifier for KeywordModel {
//!     fn name(&self) -> &str { "keyword-model" }
//!
//!     async fn classify_text(&self, text: &str, top_k: usize) -> Result<Vec<PredictionCandidate>, AgentError> {
//!         Ok(vec![PredictionCandidate::new("Malaria", 0.9)])
//!     }
//! }
//! ```
//!
//! # Using the Hosted Backend
//!
//! ```rust,ignore
//! use triage_models::{decode_image, HubPipeline, ImageClassifier};
//!
//! let vision = HubPipeline::new(&config.hub, &config.models.image);
//! let image = decode_image(bytes)?;
//! let candidates = vision.classify_image(&image).await?;
//! ```

mod hub;
mod media;

pub use hub::HubPipeline;
pub use media::{decode_audio, decode_image, AudioHint, DecodedAudio, DecodedImage};

use async_trait::async_trait;
use triage_core::{AgentError, PredictionCandidate};

/// A model that assigns labeled scores to free text.
#[async_trait]
pub trait TextClassifier: Send + Sync {
    /// Returns the model identifier, for logging.
    fn name(&self) -> &str;

    /// Classifies `text`, returning at most `top_k` candidates ordered by score.
    async fn classify_text(
        &self,
        text: &str,
        top_k: usize,
    ) -> Result<Vec<PredictionCandidate>, AgentError>;
}

/// A model that assigns labeled scores to an image.
#[async_trait]
pub trait ImageClassifier: Send + Sync {
    /// Returns the model identifier, for logging.
    fn name(&self) -> &str;

    /// Classifies a decoded image. The candidate count is the model's default.
    async fn classify_image(
        &self,
        image: &DecodedImage,
    ) -> Result<Vec<PredictionCandidate>, AgentError>;
}

/// A model that turns speech into text.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Returns the model identifier, for logging.
    fn name(&self) -> &str;

    /// Transcribes decoded audio into plain text.
    async fn transcribe(&self, audio: &DecodedAudio) -> Result<String, AgentError>;
}
