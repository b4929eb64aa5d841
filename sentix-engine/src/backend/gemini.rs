//! Google Gemini backend.
//!
//! Uses the `generateContent` endpoint with `responseMimeType` set to JSON
//! and the output contract attached as `responseSchema`. The API key travels
//! in the `x-goog-api-key` header and never appears in a URL.

use super::GenerativeBackend;
use crate::error::{BackendFailure, FailureKind};
use async_trait::async_trait;
use reqwest::Client;
use sentix_common::{BackendConfig, Config};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{Duration, Instant};

const NAME: &str = "gemini";
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini `generateContent` client.
pub struct GeminiBackend {
    api_key: String,
    model: String,
    base_url: String,
    temperature: f64,
    client: Client,
}

// ══════════════════════════════════════════════════════════════════════════════
// API REQUEST/RESPONSE TYPES
// ══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig<'a>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig<'a> {
    temperature: f64,
    #[serde(rename = "responseMimeType")]
    response_mime_type: &'static str,
    #[serde(rename = "responseSchema")]
    response_schema: &'a Value,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

impl GeminiBackend {
    pub fn new(api_key: impl Into<String>, config: &BackendConfig) -> Self {
        Self {
            api_key: api_key.into(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            temperature: config.temperature,
            client: Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                .connect_timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    /// Build from configuration, failing when no API key was provided.
    pub fn from_config(config: &Config) -> sentix_common::Result<Self> {
        let key = config.require_api_key()?;
        Ok(Self::new(key, &config.backend))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        let model = self.model.strip_prefix("models/").unwrap_or(&self.model);
        format!("{}/models/{}:generateContent", self.base_url, model)
    }

    fn failure(kind: FailureKind, message: impl Into<String>) -> BackendFailure {
        BackendFailure::new(NAME, kind, message)
    }
}

#[async_trait]
impl GenerativeBackend for GeminiBackend {
    fn name(&self) -> &str {
        NAME
    }

    async fn generate(&self, prompt: &str, schema: &Value) -> Result<String, BackendFailure> {
        let start = Instant::now();

        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
                response_mime_type: "application/json",
                response_schema: schema,
            },
        };

        let response = self
            .client
            .post(self.endpoint())
            .header(API_KEY_HEADER, self.api_key.as_str())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                Self::failure(
                    FailureKind::Transport,
                    format!("Request failed: {}", e.without_url()),
                )
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(BackendFailure::from_status(NAME, status.as_u16(), &error_text));
        }

        let result: GenerateContentResponse = response.json().await.map_err(|e| {
            Self::failure(
                FailureKind::MalformedOutput,
                format!("Failed to parse response envelope: {}", e.without_url()),
            )
        })?;

        if let Some(err) = result.error {
            return Err(Self::failure(FailureKind::Api, err.message));
        }

        let candidate = result
            .candidates
            .and_then(|c| c.into_iter().next())
            .ok_or_else(|| Self::failure(FailureKind::MalformedOutput, "No candidates returned"))?;

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            let reason = candidate.finish_reason.unwrap_or_else(|| "unknown".into());
            return Err(Self::failure(
                FailureKind::MalformedOutput,
                format!("Empty response (finish reason: {})", reason),
            ));
        }

        tracing::debug!(
            model = %self.model,
            latency_ms = start.elapsed().as_millis() as u64,
            bytes = text.len(),
            "Gemini response received"
        );

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend_for(server: &MockServer) -> GeminiBackend {
        let config = BackendConfig {
            base_url: server.uri(),
            ..BackendConfig::default()
        };
        GeminiBackend::new("test-key", &config)
    }

    fn candidate(text: &str) -> Value {
        json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": text}]},
                "finishReason": "STOP"
            }]
        })
    }

    #[tokio::test]
    async fn sends_schema_and_returns_text() {
        let server = MockServer::start().await;
        let schema = json!({"type": "OBJECT", "properties": {"quote": {"type": "STRING"}}});

        Mock::given(method("POST"))
            .and(path("/models/gemini-2.0-flash:generateContent"))
            .and(header(API_KEY_HEADER, "test-key"))
            .and(body_partial_json(json!({
                "generationConfig": {
                    "responseMimeType": "application/json",
                    "responseSchema": schema.clone()
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(candidate(r#"{"quote":"ok"}"#)))
            .expect(1)
            .mount(&server)
            .await;

        let text = backend_for(&server).generate("hello", &schema).await.unwrap();
        assert_eq!(text, r#"{"quote":"ok"}"#);

        let requests = server.received_requests().await.unwrap();
        assert!(requests.iter().all(|r| r.url.query().is_none()));
    }

    #[tokio::test]
    async fn auth_failure_maps_to_auth_kind() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("API key not valid"))
            .mount(&server)
            .await;

        let err = backend_for(&server).generate("x", &json!({})).await.unwrap_err();
        assert_eq!(err.kind, FailureKind::Auth);
        assert_eq!(err.status_code, Some(403));
    }

    #[tokio::test]
    async fn rate_limit_maps_to_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("quota"))
            .mount(&server)
            .await;

        let err = backend_for(&server).generate("x", &json!({})).await.unwrap_err();
        assert_eq!(err.kind, FailureKind::RateLimited);
    }

    #[tokio::test]
    async fn empty_candidates_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
            .mount(&server)
            .await;

        let err = backend_for(&server).generate("x", &json!({})).await.unwrap_err();
        assert_eq!(err.kind, FailureKind::MalformedOutput);
    }

    #[tokio::test]
    async fn error_body_maps_to_api_kind() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"error": {"message": "bad schema"}})),
            )
            .mount(&server)
            .await;

        let err = backend_for(&server).generate("x", &json!({})).await.unwrap_err();
        assert_eq!(err.kind, FailureKind::Api);
        assert_eq!(err.message, "bad schema");
    }

    #[tokio::test]
    async fn unreachable_host_is_transport_failure() {
        let config = BackendConfig {
            base_url: "http://127.0.0.1:9".into(),
            timeout_secs: 2,
            ..BackendConfig::default()
        };
        let key = "sk-never-shown-4242";
        let err = GeminiBackend::new(key, &config)
            .generate("x", &json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.kind, FailureKind::Transport);
        assert!(!err.to_string().contains(key));
        assert!(!err.message.contains("generateContent"));
    }

    #[test]
    fn from_config_requires_key() {
        let mut config = Config::default();
        assert!(GeminiBackend::from_config(&config).is_err());

        config.backend.api_key = Some("k".into());
        let backend = GeminiBackend::from_config(&config).unwrap();
        assert_eq!(backend.model(), "gemini-2.0-flash");
    }

    #[test]
    fn endpoint_accepts_prefixed_model() {
        let config = BackendConfig {
            model: "models/gemini-1.5-pro".into(),
            base_url: "https://example.test/v1beta/".into(),
            ..BackendConfig::default()
        };
        let backend = GeminiBackend::new("k", &config);
        assert_eq!(
            backend.endpoint(),
            "https://example.test/v1beta/models/gemini-1.5-pro:generateContent"
        );
    }
}
