//! Client for OpenAI-compatible `/responses` endpoints (Groq by default).
//!
//! One HTTP attempt per call. Non-success statuses are classified by
//! [`GatewayError::from_upstream`]; retrying is left to the caller.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};

use forge_core::ports::{Completion, CompletionRequest, GatewayError, TextGenerator};

/// Default upstream base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Configuration for the responses gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    api_key: Option<Secret<String>>,
    /// Base URL without the trailing `/responses`.
    pub base_url: String,
    pub timeout: Duration,
}

impl GatewayConfig {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()).map(Secret::new),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Text generator backed by an OpenAI-compatible responses API.
pub struct ResponsesGateway {
    config: GatewayConfig,
    client: Client,
}

impl ResponsesGateway {
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::Configuration(format!("HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    fn responses_url(&self) -> String {
        format!("{}/responses", self.config.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    instructions: &'a str,
    input: &'a str,
    temperature: f32,
    top_p: f32,
}

#[derive(Debug, Deserialize)]
struct ResponsesBody {
    #[serde(default)]
    output_text: Option<String>,
    #[serde(default)]
    output: Vec<OutputItem>,
    #[serde(default)]
    usage: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct OutputItem {
    #[serde(default)]
    content: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
struct ContentPart {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[async_trait]
impl TextGenerator for ResponsesGateway {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, GatewayError> {
        let Some(api_key) = self.config.api_key.as_ref() else {
            return Err(GatewayError::Configuration(
                "Generation service API key is not configured".to_string(),
            ));
        };

        let payload = ResponsesRequest {
            model: &request.model,
            instructions: &request.instructions,
            input: &request.input,
            temperature: request.sampling.temperature,
            top_p: request.sampling.top_p,
        };

        tracing::debug!(model = %request.model, "Requesting completion");

        let response = self
            .client
            .post(self.responses_url())
            .bearer_auth(api_key.expose_secret())
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::Transport(format!(
                        "Request timed out after {}s",
                        self.config.timeout.as_secs()
                    ))
                } else if e.is_connect() {
                    GatewayError::Transport(format!("Connection failed: {e}"))
                } else {
                    GatewayError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = retry_after_secs(status, response.headers());
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "Generation service returned an error");
            return Err(GatewayError::from_upstream(
                status.as_u16(),
                &body,
                retry_after,
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        parse_completion(&body)
    }
}

fn retry_after_secs(status: StatusCode, headers: &reqwest::header::HeaderMap) -> Option<u64> {
    if status != StatusCode::TOO_MANY_REQUESTS {
        return None;
    }
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

/// Extract the generated text and usage from a successful response body.
///
/// Prefers the aggregated `output_text`; otherwise concatenates every
/// `output_text` part found in `output[].content[]`.
fn parse_completion(body: &str) -> Result<Completion, GatewayError> {
    let parsed: ResponsesBody = serde_json::from_str(body)
        .map_err(|e| GatewayError::MalformedResponse(format!("Failed to parse response: {e}")))?;

    let text = match parsed.output_text {
        Some(text) if !text.is_empty() => text,
        _ => parsed
            .output
            .iter()
            .flat_map(|item| item.content.iter())
            .filter(|part| part.kind == "output_text")
            .filter_map(|part| part.text.as_deref())
            .collect::<String>(),
    };

    Ok(Completion {
        text,
        usage: parsed.usage,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderMap, HeaderValue};
    use serde_json::json;

    #[test]
    fn test_parse_output_text() {
        let body = json!({
            "output_text": "Hello there",
            "usage": {"total_tokens": 42}
        })
        .to_string();

        let completion = parse_completion(&body).unwrap();

        assert_eq!(completion.text, "Hello there");
        assert_eq!(completion.total_tokens(), Some(42));
    }

    #[test]
    fn test_parse_falls_back_to_output_items() {
        let body = json!({
            "output": [
                {"type": "reasoning", "content": [{"type": "reasoning_text", "text": "thinking"}]},
                {"type": "message", "content": [
                    {"type": "output_text", "text": "First. "},
                    {"type": "output_text", "text": "Second."}
                ]}
            ]
        })
        .to_string();

        let completion = parse_completion(&body).unwrap();

        assert_eq!(completion.text, "First. Second.");
        assert!(completion.usage.is_null());
        assert_eq!(completion.total_tokens(), None);
    }

    #[test]
    fn test_parse_empty_output_yields_empty_text() {
        let completion = parse_completion("{}").unwrap();
        assert!(completion.text.is_empty());
    }

    #[test]
    fn test_parse_rejects_non_json() {
        let result = parse_completion("<html>bad gateway</html>");
        assert!(matches!(result, Err(GatewayError::MalformedResponse(_))));
    }

    #[test]
    fn test_retry_after_only_read_for_429() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("12"));

        assert_eq!(
            retry_after_secs(StatusCode::TOO_MANY_REQUESTS, &headers),
            Some(12)
        );
        assert_eq!(retry_after_secs(StatusCode::BAD_GATEWAY, &headers), None);
        assert_eq!(
            retry_after_secs(StatusCode::TOO_MANY_REQUESTS, &HeaderMap::new()),
            None
        );
    }

    #[test]
    fn test_blank_api_key_counts_as_missing() {
        assert!(!GatewayConfig::new(Some("  ".to_string())).has_api_key());
        assert!(!GatewayConfig::new(None).has_api_key());
        assert!(GatewayConfig::new(Some("gsk_test".to_string())).has_api_key());
    }

    #[test]
    fn test_url_joins_without_double_slash() {
        let gateway = ResponsesGateway::new(
            GatewayConfig::new(None).with_base_url("http://localhost:9999/v1/"),
        )
        .unwrap();
        assert_eq!(gateway.responses_url(), "http://localhost:9999/v1/responses");
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_before_any_request() {
        let gateway = ResponsesGateway::new(GatewayConfig::new(None)).unwrap();
        let request = CompletionRequest {
            model: "openai/gpt-oss-20b".to_string(),
            instructions: "Be helpful".to_string(),
            input: "Say hi".to_string(),
            sampling: Default::default(),
        };

        let result = gateway.complete(request).await;

        assert!(matches!(result, Err(GatewayError::Configuration(_))));
    }
}
