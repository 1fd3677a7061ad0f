//! OpenAI-Compatible Backend
//!
//! `CompletionBackend` over the `/v1/chat/completions` API. Works with OpenAI
//! and any server exposing the same wire format via `base_url`.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::http_client::build_http_client;
use crate::provider::{missing_api_key_error, parse_http_error, CompletionBackend};
use crate::types::{BackendConfig, BackendError, BackendResult, CallContext};

/// Default OpenAI API endpoint
const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// OpenAI-compatible chat completion backend
pub struct OpenAiCompatibleBackend {
    config: BackendConfig,
    client: reqwest::Client,
}

impl OpenAiCompatibleBackend {
    /// Create a new backend with the given configuration
    pub fn new(config: BackendConfig) -> BackendResult<Self> {
        let client = build_http_client(Some(Duration::from_secs(config.request_timeout_secs)))?;
        Ok(Self { config, client })
    }

    /// Get the API endpoint
    fn endpoint(&self) -> &str {
        self.config.base_url.as_deref().unwrap_or(OPENAI_API_URL)
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Build the request body for the API
    fn build_request_body(&self, system: Option<&str>, prompt: &str) -> serde_json::Value {
        let mut messages = Vec::new();
        if let Some(sys) = system {
            messages.push(serde_json::json!({
                "role": "system",
                "content": sys
            }));
        }
        messages.push(serde_json::json!({
            "role": "user",
            "content": prompt
        }));

        serde_json::json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "stream": false,
            "messages": messages,
        })
    }

    async fn send(&self, system: Option<&str>, prompt: &str) -> BackendResult<String> {
        let api_key = self
            .config
            .api_key
            .as_ref()
            .ok_or_else(|| missing_api_key_error("openai"))?;

        let body = self.build_request_body(system, prompt);

        let response = self
            .client
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BackendError::Timeout {
                        after_ms: self.config.request_timeout_secs * 1000,
                    }
                } else {
                    BackendError::NetworkError {
                        message: e.to_string(),
                    }
                }
            })?;

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u32>().ok());
        let body_text = response.text().await.map_err(|e| BackendError::NetworkError {
            message: e.to_string(),
        })?;

        if status != 200 {
            let mut err = parse_http_error(status, &body_text, "openai");
            if let BackendError::RateLimited {
                retry_after: ref mut slot,
                ..
            } = err
            {
                *slot = retry_after;
            }
            return Err(err);
        }

        parse_completion(&body_text)
    }
}

/// Extract the first choice's text from a chat completion response body.
fn parse_completion(body: &str) -> BackendResult<String> {
    let response: ChatResponse = serde_json::from_str(body).map_err(|e| BackendError::ParseError {
        message: format!("Failed to parse response: {}", e),
    })?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .ok_or_else(|| BackendError::ParseError {
            message: "response contained no message content".to_string(),
        })
}

#[async_trait]
impl CompletionBackend for OpenAiCompatibleBackend {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(
        &self,
        system: Option<&str>,
        prompt: &str,
        ctx: &CallContext,
    ) -> BackendResult<String> {
        tokio::select! {
            biased;
            _ = ctx.cancellation.cancelled() => Err(BackendError::Cancelled),
            result = self.send(system, prompt) => result,
        }
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}
