//! Hugging Face inference protocol client.
//!
//! One [`HubPipeline`] wraps one hosted model. Text classification posts a
//! JSON body; image classification and speech recognition post the raw
//! media bytes with their MIME type.

use std::time::Instant;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use triage_config::HubSettings;
use triage_core::{AgentError, PredictionCandidate};

use crate::{DecodedAudio, DecodedImage, ImageClassifier, TextClassifier, Transcriber};

#[derive(Debug, Serialize)]
struct TextRequest<'a> {
    inputs: &'a str,
    parameters: TextParameters,
}

#[derive(Debug, Serialize)]
struct TextParameters {
    top_k: usize,
}

/// Classification payloads come back flat for single inputs on some
/// deployments and nested one level on others.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ClassificationOutput {
    Flat(Vec<PredictionCandidate>),
    Nested(Vec<Vec<PredictionCandidate>>),
}

impl ClassificationOutput {
    fn into_candidates(self) -> Vec<PredictionCandidate> {
        match self {
            ClassificationOutput::Flat(c) => c,
            ClassificationOutput::Nested(batches) => batches.into_iter().next().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TranscriptionOutput {
    text: String,
}

#[derive(Debug, Deserialize)]
struct HubErrorBody {
    error: String,
}

/// Client for a single model served over the Hugging Face inference protocol.
#[derive(Debug, Clone)]
pub struct HubPipeline {
    client: Client,
    model_id: String,
    url: String,
    token: Option<String>,
}

impl HubPipeline {
    /// Creates a client for `model_id` using the given backend settings.
    pub fn new(settings: &HubSettings, model_id: &str) -> Self {
        Self {
            client: Client::new(),
            model_id: model_id.to_string(),
            url: format!("{}/models/{}", settings.api_base.trim_end_matches('/'), model_id),
            token: settings.token.clone(),
        }
    }

    fn post(&self) -> RequestBuilder {
        let request = self.client.post(&self.url);
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Sends the request and rejects non-success statuses with the upstream message.
    async fn send(&self, request: RequestBuilder) -> Result<Response, AgentError> {
        let start = Instant::now();
        let response = request
            .send()
            .await
            .map_err(|e| AgentError::model(format!("{} request failed: {}", self.model_id, e)))?;

        let status = response.status();
        debug!(model = %self.model_id, status = status.as_u16(), elapsed_ms = start.elapsed().as_millis() as u64, "pipeline responded");

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<HubErrorBody>(&body)
            .map(|b| b.error)
            .unwrap_or(body);
        Err(AgentError::model(format!("{} returned {}: {}", self.model_id, status, message)))
    }

    async fn read_json<T: serde::de::DeserializeOwned>(&self, response: Response) -> Result<T, AgentError> {
        let body = response
            .bytes()
            .await
            .map_err(|e| AgentError::model(format!("{} response unreadable: {}", self.model_id, e)))?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl TextClassifier for HubPipeline {
    fn name(&self) -> &str {
        &self.model_id
    }

    async fn classify_text(&self, text: &str, top_k: usize) -> Result<Vec<PredictionCandidate>, AgentError> {
        let body = TextRequest {
            inputs: text,
            parameters: TextParameters { top_k },
        };
        let response = self.send(self.post().json(&body)).await?;
        let output: ClassificationOutput = self.read_json(response).await?;
        let candidates = output.into_candidates();
        info!(model = %self.model_id, count = candidates.len(), "text classified");
        Ok(candidates)
    }
}

#[async_trait]
impl ImageClassifier for HubPipeline {
    fn name(&self) -> &str {
        &self.model_id
    }

    async fn classify_image(&self, image: &DecodedImage) -> Result<Vec<PredictionCandidate>, AgentError> {
        let request = self
            .post()
            .header(CONTENT_TYPE, image.mime())
            .body(image.bytes.clone());
        let response = self.send(request).await?;
        let output: ClassificationOutput = self.read_json(response).await?;
        let candidates = output.into_candidates();
        info!(model = %self.model_id, count = candidates.len(), "image classified");
        Ok(candidates)
    }
}

#[async_trait]
impl Transcriber for HubPipeline {
    fn name(&self) -> &str {
        &self.model_id
    }

    async fn transcribe(&self, audio: &DecodedAudio) -> Result<String, AgentError> {
        let request = self
            .post()
            .header(CONTENT_TYPE, audio.mime.as_str())
            .body(audio.bytes.clone());
        let response = self.send(request).await?;
        let output: TranscriptionOutput = self.read_json(response).await?;
        info!(model = %self.model_id, chars = output.text.len(), "audio transcribed");
        Ok(output.text)
    }
}
