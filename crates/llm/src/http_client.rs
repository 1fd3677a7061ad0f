//! HTTP Client Factory
//!
//! Provides a factory function for building reqwest clients.

use std::time::Duration;

use crate::types::{BackendError, BackendResult};

/// Build a `reqwest::Client` with an optional overall request timeout.
///
/// Proxy settings from the environment are ignored; backends talk to the
/// configured base URL directly.
pub fn build_http_client(timeout: Option<Duration>) -> BackendResult<reqwest::Client> {
    let mut builder = reqwest::Client::builder().no_proxy();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().map_err(|e| BackendError::Other {
        message: format!("failed to build HTTP client: {}", e),
    })
}
