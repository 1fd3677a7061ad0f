//! Retry With Backoff
//!
//! Wraps a backend call with a per-attempt timeout, cooperative cancellation
//! and bounded exponential backoff for transient errors.
//!
//! Delays follow `base_delay_ms * 2^attempt`, capped at `max_delay_ms`. A
//! rate-limit response carrying `retry_after` waits that long instead (still
//! capped). Non-retryable errors return immediately; once the retry budget is
//! spent the last transient error is wrapped in `RetriesExhausted`.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::types::{BackendError, BackendResult, CallContext};

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    10_000
}

/// Retry budget for transient backend failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt + 1` (0-based attempt).
    pub fn delay_for(&self, attempt: u32, err: &BackendError) -> Duration {
        let wait_ms = if let Some(secs) = err.retry_after_secs() {
            secs.saturating_mul(1000)
        } else {
            self.base_delay_ms
                .saturating_mul(1u64 << attempt.min(32))
        };
        Duration::from_millis(wait_ms.min(self.max_delay_ms))
    }

    /// Upper bound on attempts for a single operation.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// Run `call` until it succeeds, fails fatally, is cancelled or the retry
/// budget is spent.
///
/// Each attempt gets a fresh `CallContext` whose token is a child of
/// `cancel` and whose deadline is `call_timeout` from the attempt start.
pub async fn call_with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    call_timeout: Duration,
    operation: &str,
    cancel: &CancellationToken,
    mut call: F,
) -> BackendResult<T>
where
    F: FnMut(CallContext) -> Fut,
    Fut: Future<Output = BackendResult<T>>,
{
    let max_attempts = policy.max_attempts();

    for attempt in 0..max_attempts {
        if cancel.is_cancelled() {
            return Err(BackendError::Cancelled);
        }

        let ctx = CallContext::new(cancel.child_token(), call_timeout);
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(BackendError::Cancelled),
            outcome = tokio::time::timeout(call_timeout, call(ctx)) => {
                outcome.unwrap_or(Err(BackendError::Timeout {
                    after_ms: call_timeout.as_millis() as u64,
                }))
            }
        };

        let err = match result {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if !err.is_retryable() {
            return Err(err);
        }

        if attempt + 1 >= max_attempts {
            return Err(BackendError::RetriesExhausted {
                attempts: max_attempts,
                last: Box::new(err),
            });
        }

        let wait = policy.delay_for(attempt, &err);
        tracing::warn!(
            operation,
            attempt = attempt + 1,
            max_attempts,
            wait_ms = wait.as_millis() as u64,
            error = %err,
            "retryable backend error, backing off"
        );

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(BackendError::Cancelled),
            _ = tokio::time::sleep(wait) => {}
        }
    }

    // Only reachable with a zero attempt budget, which max_attempts rules out.
    Err(BackendError::Other {
        message: format!("{}: no attempts were made", operation),
    })
}
