//! Backend Types
//!
//! Error taxonomy, call parameters and per-call context shared by every text
//! generation backend.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use story_forge_core::{Genre, GenerationRequest, QualityDimension};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

// ============================================================================
// Errors
// ============================================================================

/// Errors that can occur when calling a text generation backend.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendError {
    /// Authentication failed (invalid API key)
    AuthenticationFailed { message: String },
    /// Rate limit exceeded
    RateLimited {
        message: String,
        retry_after: Option<u32>,
    },
    /// Model not found or not available
    ModelNotFound { model: String },
    /// Invalid request (bad parameters)
    InvalidRequest { message: String },
    /// Server error from the backend
    ServerError {
        message: String,
        status: Option<u16>,
    },
    /// Network/connection error
    NetworkError { message: String },
    /// Response parsing error
    ParseError { message: String },
    /// A single call exceeded its time allowance
    Timeout { after_ms: u64 },
    /// The caller cancelled the operation
    Cancelled,
    /// Every retry attempt failed with a transient error
    RetriesExhausted {
        attempts: u32,
        last: Box<BackendError>,
    },
    /// Other error
    Other { message: String },
}

impl BackendError {
    /// Transient failures worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BackendError::RateLimited { .. }
                | BackendError::ServerError { .. }
                | BackendError::NetworkError { .. }
                | BackendError::Timeout { .. }
        )
    }

    /// For rate-limited errors, return the suggested wait time in seconds.
    pub fn retry_after_secs(&self) -> Option<u64> {
        if let BackendError::RateLimited { retry_after, .. } = self {
            retry_after.map(|s| s as u64)
        } else {
            None
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, BackendError::Cancelled)
    }
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::AuthenticationFailed { message } => {
                write!(f, "Authentication failed: {}", message)
            }
            BackendError::RateLimited { message, .. } => {
                write!(f, "Rate limited: {}", message)
            }
            BackendError::ModelNotFound { model } => {
                write!(f, "Model not found: {}", model)
            }
            BackendError::InvalidRequest { message } => {
                write!(f, "Invalid request: {}", message)
            }
            BackendError::ServerError { message, status } => {
                if let Some(s) = status {
                    write!(f, "Server error ({}): {}", s, message)
                } else {
                    write!(f, "Server error: {}", message)
                }
            }
            BackendError::NetworkError { message } => {
                write!(f, "Network error: {}", message)
            }
            BackendError::ParseError { message } => {
                write!(f, "Parse error: {}", message)
            }
            BackendError::Timeout { after_ms } => {
                write!(f, "Timed out after {}ms", after_ms)
            }
            BackendError::Cancelled => write!(f, "Cancelled"),
            BackendError::RetriesExhausted { attempts, last } => {
                write!(f, "Gave up after {} attempts: {}", attempts, last)
            }
            BackendError::Other { message } => {
                write!(f, "Error: {}", message)
            }
        }
    }
}

impl std::error::Error for BackendError {}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

// ============================================================================
// Call Context
// ============================================================================

/// Cancellation and deadline handed to every backend call.
#[derive(Debug, Clone)]
pub struct CallContext {
    pub cancellation: CancellationToken,
    pub deadline: Option<Instant>,
}

impl CallContext {
    pub fn new(cancellation: CancellationToken, timeout: Duration) -> Self {
        Self {
            cancellation,
            deadline: Some(Instant::now() + timeout),
        }
    }

    /// Context with no deadline and a fresh token.
    pub fn unbounded() -> Self {
        Self {
            cancellation: CancellationToken::new(),
            deadline: None,
        }
    }

    /// Time left before the deadline, if one is set.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}

// ============================================================================
// Call Parameters
// ============================================================================

/// What a draft call should produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DraftKind {
    /// A structural outline to expand later
    Outline,
    /// Full story text, optionally expanding an outline
    Story { outline: Option<String> },
}

/// Parameters for `generate_draft`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftParams {
    pub kind: DraftKind,
    pub request: GenerationRequest,
}

impl DraftParams {
    pub fn outline(request: &GenerationRequest) -> Self {
        Self {
            kind: DraftKind::Outline,
            request: request.clone(),
        }
    }

    pub fn story(request: &GenerationRequest, outline: Option<String>) -> Self {
        Self {
            kind: DraftKind::Story { outline },
            request: request.clone(),
        }
    }
}

/// Guidance for `revise_artifact`: what to improve and what to leave alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionHint {
    /// Enhancement strategy identifier
    pub strategy_id: String,
    /// Instruction describing the revision
    pub focus: String,
    /// Dimensions the revision should improve
    pub target_dimensions: Vec<QualityDimension>,
    /// Current scores of the targeted dimensions
    pub current_scores: BTreeMap<QualityDimension, f64>,
    pub genre: Genre,
    pub target_word_count: u32,
}

// ============================================================================
// Backend Config
// ============================================================================

fn default_max_tokens() -> u32 {
    4096
}

fn default_temperature() -> f32 {
    0.8
}

fn default_request_timeout_secs() -> u64 {
    180
}

/// Connection settings for an HTTP backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendConfig {
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl BackendConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            base_url: None,
            api_key: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}
