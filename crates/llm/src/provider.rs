//! Backend Traits
//!
//! `TextBackend` is what the workflow engine drives: draft generation and
//! artifact revision. `CompletionBackend` is a plain prompt-in/text-out
//! service; `PromptedBackend` adapts one into the other using the prompts in
//! `crate::prompts`.

use std::sync::Arc;

use async_trait::async_trait;

use crate::prompts;
use crate::types::{BackendError, BackendResult, CallContext, DraftParams, RevisionHint};

/// Text generation backend consumed by the workflow engine.
///
/// Implementations should honour `ctx.cancellation` and return
/// `BackendError::Cancelled` promptly when it fires.
#[async_trait]
pub trait TextBackend: Send + Sync {
    /// Returns the backend name for identification.
    fn name(&self) -> &str;

    /// Produce an outline or a full story.
    async fn generate_draft(&self, params: &DraftParams, ctx: &CallContext)
        -> BackendResult<String>;

    /// Revise an existing artifact according to a hint.
    async fn revise_artifact(
        &self,
        artifact: &str,
        hint: &RevisionHint,
        ctx: &CallContext,
    ) -> BackendResult<String>;
}

/// Prompt completion service.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    fn name(&self) -> &str;

    async fn complete(
        &self,
        system: Option<&str>,
        prompt: &str,
        ctx: &CallContext,
    ) -> BackendResult<String>;
}

/// `TextBackend` built on a `CompletionBackend`.
pub struct PromptedBackend {
    completion: Arc<dyn CompletionBackend>,
}

impl PromptedBackend {
    pub fn new(completion: Arc<dyn CompletionBackend>) -> Self {
        Self { completion }
    }

    async fn complete_non_empty(
        &self,
        system: &str,
        prompt: &str,
        ctx: &CallContext,
    ) -> BackendResult<String> {
        let text = self.completion.complete(Some(system), prompt, ctx).await?;
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(BackendError::ParseError {
                message: format!("{} returned an empty completion", self.completion.name()),
            });
        }
        Ok(trimmed.to_string())
    }
}

#[async_trait]
impl TextBackend for PromptedBackend {
    fn name(&self) -> &str {
        self.completion.name()
    }

    async fn generate_draft(
        &self,
        params: &DraftParams,
        ctx: &CallContext,
    ) -> BackendResult<String> {
        let prompt = prompts::draft_prompt(params);
        self.complete_non_empty(prompts::WRITER_SYSTEM_PROMPT, &prompt, ctx)
            .await
    }

    async fn revise_artifact(
        &self,
        artifact: &str,
        hint: &RevisionHint,
        ctx: &CallContext,
    ) -> BackendResult<String> {
        let prompt = prompts::revision_prompt(artifact, hint);
        self.complete_non_empty(prompts::EDITOR_SYSTEM_PROMPT, &prompt, ctx)
            .await
    }
}

/// Helper function to create an error for missing API key
pub fn missing_api_key_error(backend: &str) -> BackendError {
    BackendError::AuthenticationFailed {
        message: format!("API key not configured for {}", backend),
    }
}

/// Helper function to parse HTTP error status codes
pub fn parse_http_error(status: u16, body: &str, backend: &str) -> BackendError {
    match status {
        401 => BackendError::AuthenticationFailed {
            message: format!("{}: Invalid API key", backend),
        },
        403 => BackendError::AuthenticationFailed {
            message: format!("{}: Access denied", backend),
        },
        404 => BackendError::ModelNotFound {
            model: body.to_string(),
        },
        408 => BackendError::ServerError {
            message: format!("{}: request timeout", backend),
            status: Some(status),
        },
        429 => BackendError::RateLimited {
            message: body.to_string(),
            retry_after: None,
        },
        400 => BackendError::InvalidRequest {
            message: body.to_string(),
        },
        500..=599 => BackendError::ServerError {
            message: body.to_string(),
            status: Some(status),
        },
        _ => BackendError::Other {
            message: format!("HTTP {}: {}", status, body),
        },
    }
}
