//! Text generation port - abstraction over the upstream completion service.

use async_trait::async_trait;
use serde::Serialize;

/// Sampling parameters sent with every completion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SamplingParams {
    pub temperature: f32,
    pub top_p: f32,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.9,
        }
    }
}

/// A single completion call.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    /// Role instruction for the model.
    pub instructions: String,
    /// Raw user prompt.
    pub input: String,
    pub sampling: SamplingParams,
}

/// Generated text plus the upstream usage report.
#[derive(Debug, Clone)]
pub struct Completion {
    pub text: String,
    /// Opaque usage object as returned upstream (`null` when absent).
    pub usage: serde_json::Value,
}

impl Completion {
    pub fn total_tokens(&self) -> Option<i64> {
        self.usage.get("total_tokens").and_then(|t| t.as_i64())
    }
}

/// Text generator trait. Implementations make exactly one attempt per call.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, GatewayError>;
}

/// Upstream generation failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GatewayError {
    /// Bad API key or endpoint. A server-side problem, not the caller's.
    #[error("Generation service misconfigured: {0}")]
    Configuration(String),

    #[error("Generation service rate limited: {message}")]
    RateLimited {
        retry_after_secs: Option<u64>,
        message: String,
    },

    #[error("Generation service error ({status}): {message}")]
    Upstream {
        status: u16,
        message: String,
        error_type: Option<String>,
    },

    #[error("Generation service unreachable: {0}")]
    Transport(String),

    #[error("Invalid response from generation service: {0}")]
    MalformedResponse(String),
}

impl GatewayError {
    /// Classify a non-success upstream response.
    ///
    /// `body` is the raw response body; OpenAI-style `{"error": {"message", "type"}}`
    /// payloads have their message and type preserved.
    pub fn from_upstream(status: u16, body: &str, retry_after_secs: Option<u64>) -> Self {
        let (message, error_type) = parse_error_body(body);

        match status {
            401 | 403 => GatewayError::Configuration(
                "Invalid API key. Check the generation service credentials.".to_string(),
            ),
            404 => GatewayError::Configuration(
                "Invalid API endpoint. Check the generation service base URL.".to_string(),
            ),
            429 => GatewayError::RateLimited {
                retry_after_secs,
                message: message.unwrap_or_else(|| "Too many requests".to_string()),
            },
            _ => GatewayError::Upstream {
                status,
                message: message.unwrap_or_else(|| format!("Upstream returned status {status}")),
                error_type,
            },
        }
    }

    /// Whether the caller may retry the same request later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GatewayError::RateLimited { .. } | GatewayError::Transport(_)
        )
    }
}

fn parse_error_body(body: &str) -> (Option<String>, Option<String>) {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        let trimmed = body.trim();
        return ((!trimmed.is_empty()).then(|| trimmed.to_string()), None);
    };

    let error = value.get("error").unwrap_or(&value);
    let message = error
        .get("message")
        .and_then(|m| m.as_str())
        .or_else(|| error.as_str())
        .map(String::from);
    let error_type = error
        .get("type")
        .and_then(|t| t.as_str())
        .map(String::from);

    (message, error_type)
}
