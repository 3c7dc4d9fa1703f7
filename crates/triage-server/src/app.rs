//! Axum router setup.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::DefaultBodyLimit;
use axum::http::{Request, Response};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

use crate::handlers;
use crate::ServerState;

/// Builds the application router with CORS, tracing, and the upload limit.
pub fn build_router(state: Arc<ServerState>, max_upload_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request<Body>| {
            tracing::info_span!(
                "request",
                id = %Uuid::new_v4(),
                method = %req.method(),
                uri = %req.uri(),
                version = ?req.version(),
            )
        })
        .on_response(|res: &Response<Body>, latency: Duration, _span: &tracing::Span| {
            info!(
                latency = %format!("{} ms", latency.as_millis()),
                status = %res.status().as_u16(),
                "finished processing request"
            );
        });

    let logged_routes = Router::new()
        .route("/", get(handlers::root))
        .route("/predict", post(handlers::predict::text))
        .route("/predict/text", post(handlers::predict::text))
        .route("/predict/image", post(handlers::predict::image))
        .route("/predict/voice", post(handlers::predict::voice))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(trace_layer);

    Router::new()
        .merge(logged_routes)
        .route("/health", get(handlers::health))
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use axum::http::{header, Method, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use tracing::Level;
    use triage_config::GuardrailRules;
    use triage_core::{AgentError, PredictionCandidate};
    use triage_engine::Agents;
    use crate::testing::capture_logs;
    use triage_models::{DecodedAudio, DecodedImage, ImageClassifier, TextClassifier, Transcriber};

    const BOUNDARY: &str = "triage-test-boundary";
    const LIMIT: usize = 1024 * 1024;

    #[derive(Default)]
    struct FakeText {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TextClassifier for FakeText {
        fn name(&self) -> &str {
            "fake-text"
        }

        async fn classify_text(&self, _text: &str, _top_k: usize) -> Result<Vec<PredictionCandidate>, AgentError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![
                PredictionCandidate::new("Malaria", 0.2567),
                PredictionCandidate::new("Typhoid", 0.19),
                PredictionCandidate::new("Dengue", 0.12),
                PredictionCandidate::new("Cholera", 0.08),
            ])
        }
    }

    struct FakeVision;

    #[async_trait]
    impl ImageClassifier for FakeVision {
        fn name(&self) -> &str {
            "fake-vision"
        }

        async fn classify_image(&self, _image: &DecodedImage) -> Result<Vec<PredictionCandidate>, AgentError> {
            Ok(vec![
                PredictionCandidate::new("nevus", 0.7),
                PredictionCandidate::new("melanoma", 0.2),
                PredictionCandidate::new("keratosis", 0.06),
                PredictionCandidate::new("vascular", 0.04),
            ])
        }
    }

    struct FakeTranscriber;

    #[async_trait]
    impl Transcriber for FakeTranscriber {
        fn name(&self) -> &str {
            "fake-whisper"
        }

        async fn transcribe(&self, _audio: &DecodedAudio) -> Result<String, AgentError> {
            Ok("my head hurts and I feel feverish".into())
        }
    }

    fn app_with(text: Arc<FakeText>) -> Router {
        let agents = Agents::new(
            text,
            Arc::new(FakeVision),
            Arc::new(FakeTranscriber),
            &GuardrailRules::builtin(),
        );
        build_router(Arc::new(ServerState { agents }), LIMIT)
    }

    fn app() -> Router {
        app_with(Arc::new(FakeText::default()))
    }

    enum Part<'a> {
        Text(&'a str, &'a str),
        File { name: &'a str, file_name: &'a str, content_type: &'a str, bytes: &'a [u8] },
    }

    fn multipart(parts: &[Part<'_>]) -> Vec<u8> {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match part {
                Part::Text(name, value) => {
                    body.extend_from_slice(format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes());
                    body.extend_from_slice(value.as_bytes());
                }
                Part::File { name, file_name, content_type, bytes } => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(bytes);
                }
            }
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn multipart_request(uri: &str, parts: &[Part<'_>]) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(multipart(parts)))
            .unwrap()
    }

    fn form_request(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap())
    }

    fn png() -> Vec<u8> {
        let img = image::RgbImage::new(2, 2);
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn wav() -> Vec<u8> {
        let data_len: u32 = 1600;
        let mut out = Vec::new();
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + data_len).to_le_bytes());
        out.extend_from_slice(b"WAVEfmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&8_000u32.to_le_bytes());
        out.extend_from_slice(&16_000u32.to_le_bytes());
        out.extend_from_slice(&2u16.to_le_bytes());
        out.extend_from_slice(&16u16.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&data_len.to_le_bytes());
        out.resize(44 + data_len as usize, 0);
        out
    }

    #[tokio::test]
    async fn root_returns_message() {
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let (status, json) = send(app(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["message"].as_str().unwrap().contains("running"));
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"OK");
    }

    #[tokio::test]
    async fn short_cold_text_uses_rule_engine() {
        let text = Arc::new(FakeText::default());
        let (status, json) = send(app_with(text.clone()), form_request("/predict/text", "text=I+have+a+Cold")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json,
            json!({
                "top_predictions": [{ "disease": "Common Cold", "confidence": "100.00% (Simple Match)" }],
                "status": "success",
                "agent": "Rule_Based_Engine"
            })
        );
        assert_eq!(text.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn model_path_returns_at_most_three_predictions() {
        let (status, json) = send(app(), form_request("/predict", "text=fever+and+chills")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["agent"], "Text_BioBERT");
        assert_eq!(json["status"], "success");
        let predictions = json["top_predictions"].as_array().unwrap();
        assert_eq!(predictions.len(), 3);
        assert_eq!(predictions[0], json!({ "disease": "Malaria", "confidence": "25.67%" }));
    }

    #[tokio::test]
    async fn predict_and_predict_text_are_aliases() {
        let parts = [
            Part::Text("text", "persistent dry cough for two weeks"),
            Part::Text("temperature", "38.2"),
            Part::Text("location", "Lagos"),
        ];
        let (status_a, json_a) = send(app(), multipart_request("/predict", &parts)).await;
        let (status_b, json_b) = send(app(), multipart_request("/predict/text", &parts)).await;

        assert_eq!(status_a, StatusCode::OK);
        assert_eq!(status_a, status_b);
        assert_eq!(json_a, json_b);
    }

    #[tokio::test]
    async fn text_accepts_json_body_and_ignores_image_field() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/predict")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({ "text": "itchy eyes and sneezing" }).to_string()))
            .unwrap();
        let (status, json) = send(app(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["agent"], "Text_BioBERT");

        let image = png();
        let parts = [
            Part::Text("text", "I have the flu"),
            Part::File { name: "image", file_name: "rash.png", content_type: "image/png", bytes: &image },
        ];
        let (status, json) = send(app(), multipart_request("/predict/text", &parts)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["top_predictions"][0]["disease"], "Influenza");
    }

    #[tokio::test]
    async fn missing_text_is_internal_error_with_detail() {
        let (status, json) = send(app(), form_request("/predict", "location=Accra")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(json["detail"].as_str().unwrap().contains("text"));
    }

    #[tokio::test]
    async fn image_upload_returns_every_condition() {
        let image = png();
        let parts = [Part::File { name: "file", file_name: "mole.png", content_type: "image/png", bytes: &image }];
        let (status, json) = send(app(), multipart_request("/predict/image", &parts)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["agent"], "Vision_Model");
        assert_eq!(json["status"], "success");
        let analysis = json["analysis"].as_array().unwrap();
        assert_eq!(analysis.len(), 4);
        assert_eq!(analysis[0], json!({ "condition": "nevus", "confidence": "70.00%" }));
    }

    #[tokio::test]
    async fn malformed_image_is_reported_with_prefix() {
        let parts = [Part::File { name: "file", file_name: "x.png", content_type: "image/png", bytes: b"not really a png" }];
        let (status, json) = send(app(), multipart_request("/predict/image", &parts)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(json["detail"].as_str().unwrap().starts_with("Image processing failed:"));
    }

    #[tokio::test]
    async fn image_without_file_is_reported_with_prefix() {
        let parts = [Part::Text("note", "forgot the file")];
        let (status, json) = send(app(), multipart_request("/predict/image", &parts)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(json["detail"].as_str().unwrap().starts_with("Image processing failed:"));
    }

    #[tokio::test]
    async fn voice_upload_returns_transcript_and_analysis() {
        let audio = wav();
        let parts = [Part::File { name: "file", file_name: "symptoms.wav", content_type: "audio/wav", bytes: &audio }];
        let (status, json) = send(app(), multipart_request("/predict/voice", &parts)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["agent"], "Voice_Whisper");
        assert_eq!(json["transcription"], "my head hurts and I feel feverish");
        assert_eq!(json["symptom_analysis"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn malformed_audio_is_reported_with_prefix() {
        let parts = [Part::File { name: "file", file_name: "clip.wav", content_type: "audio/wav", bytes: b"\x00\x01garbage" }];
        let (status, json) = send(app(), multipart_request("/predict/voice", &parts)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(json["detail"].as_str().unwrap().starts_with("Voice processing failed:"));
    }

    #[tokio::test]
    async fn non_multipart_voice_request_is_reported_with_prefix() {
        let (status, json) = send(app(), form_request("/predict/voice", "file=abc")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(json["detail"].as_str().unwrap().starts_with("Voice processing failed:"));
    }

    #[tokio::test]
    async fn cors_preflight_allows_any_origin() {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/predict/image")
            .header(header::ORIGIN, "http://localhost:5500")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn symptom_text_stays_out_of_info_logs() {
        let (logs, _guard) = capture_logs(Level::INFO);
        let (status, _) = send(app(), form_request("/predict", "text=night+sweats+and+weight+loss")).await;

        assert_eq!(status, StatusCode::OK);
        let output = logs.contents();
        assert!(output.contains("Text request"));
        assert!(!output.contains("night sweats"));
    }

    #[tokio::test]
    async fn failed_request_is_logged_at_error_once() {
        let (logs, _guard) = capture_logs(Level::ERROR);
        let (status, _) = send(app(), form_request("/predict", "location=Accra")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(logs.contents().lines().count(), 1);
    }
}
