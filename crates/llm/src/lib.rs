//! Story Forge LLM
//!
//! Text generation backend abstraction:
//! - `TextBackend` / `CompletionBackend` traits and the prompt-driven adapter
//! - Backend error taxonomy with retry classification
//! - Retry with bounded exponential backoff and cooperative cancellation
//! - OpenAI-compatible chat completion backend
//!
//! Also includes prompt assembly and the HTTP client factory.

pub mod http_client;
pub mod openai;
pub mod prompts;
pub mod provider;
pub mod retry;
pub mod types;

// Re-export main types
pub use http_client::build_http_client;
pub use openai::OpenAiCompatibleBackend;
pub use provider::{CompletionBackend, PromptedBackend, TextBackend};
pub use retry::{call_with_retry, RetryPolicy};
pub use types::*;

// Cancellation token carried by CallContext
pub use tokio_util::sync::CancellationToken;
