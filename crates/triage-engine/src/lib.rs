//! Request agents for the triage service.
//!
//! Three stateless agents sit behind the HTTP routes:
//!
//! | Agent | Input | Output |
//! |-------|-------|--------|
//! | [`TextAgent`] | symptom text | top 3 diseases, or a guardrail hit |
//! | [`VisionAgent`] | image bytes | every condition the model reports |
//! | [`VoiceAgent`] | audio bytes | transcript plus top 3 diseases |
//!
//! [`Agents`] bundles them into the single immutable context shared by all
//! request handlers. It is built once at startup.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use triage_engine::Agents;
//! use triage_models::HubPipeline;
//!
//! let text = Arc::new(HubPipeline::new(&config.hub, &config.models.text));
//! let image = Arc::new(HubPipeline::new(&config.hub, &config.models.image));
//! let voice = Arc::new(HubPipeline::new(&config.hub, &config.models.voice));
//!
//! let agents = Agents::new(text, image, voice, &config.guardrail_rules()?);
//! let outcome = agents.text.predict("I have a cold").await?;
//! ```

mod agents;
mod guardrail;

pub use agents::{TextAgent, TextOutcome, VisionAgent, VisionOutcome, VoiceAgent, VoiceOutcome, TEXT_TOP_K};
pub use guardrail::{GuardrailMatcher, GUARDRAIL_MAX_CHARS};

use std::sync::Arc;

use triage_config::GuardrailRules;
use triage_models::{ImageClassifier, TextClassifier, Transcriber};

/// The three agents, constructed once and shared read-only.
pub struct Agents {
    pub text: TextAgent,
    pub vision: VisionAgent,
    pub voice: VoiceAgent,
}

impl Agents {
    /// Wires the pipelines into agents. The text classifier is shared by the
    /// text and voice agents.
    pub fn new(
        text_classifier: Arc<dyn TextClassifier>,
        image_classifier: Arc<dyn ImageClassifier>,
        transcriber: Arc<dyn Transcriber>,
        rules: &GuardrailRules,
    ) -> Self {
        Self {
            text: TextAgent::new(Arc::clone(&text_classifier), GuardrailMatcher::new(rules)),
            vision: VisionAgent::new(image_classifier),
            voice: VoiceAgent::new(transcriber, text_classifier),
        }
    }
}
