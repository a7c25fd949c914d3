//! Dispatch parameters: failover and timeout control.
//!
//! [`DispatchParams`] bounds every suspension point of
//! [`StreamDispatcher`](crate::use_cases::dispatch::StreamDispatcher):
//! waiting for a credential, waiting for response headers, and waiting for
//! each streamed frame.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Dispatch control parameters.
///
/// | Suspension point            | Bound                                   |
/// |-----------------------------|-----------------------------------------|
/// | No credential eligible      | `max_selection_waits`, `selection_deadline` |
/// | Response headers            | `request_timeout`                       |
/// | Next frame of the body      | `idle_timeout`                          |
/// | Total requests per dispatch | `max_request_attempts`                  |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchParams {
    /// Model identifier sent with every request.
    pub model: String,
    /// Backoff sleeps allowed while every credential is cooling down.
    pub max_selection_waits: u32,
    /// First backoff sleep; doubled on every further wait.
    pub selection_backoff: Duration,
    /// Upper bound of a single backoff sleep.
    pub selection_backoff_max: Duration,
    /// Total time a dispatch may spend waiting for a credential.
    pub selection_deadline: Duration,
    /// Requests a single dispatch may open across all credentials.
    pub max_request_attempts: u32,
    /// Deadline for the response headers.
    pub request_timeout: Duration,
    /// Longest gap allowed between two body chunks.
    pub idle_timeout: Duration,
}

impl Default for DispatchParams {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            max_selection_waits: 3,
            selection_backoff: Duration::from_millis(500),
            selection_backoff_max: Duration::from_secs(4),
            selection_deadline: Duration::from_secs(10),
            max_request_attempts: 6,
            request_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(45),
        }
    }
}

impl DispatchParams {
    /// Backoff before the `wait`-th retry (zero-based): exponential, capped.
    pub fn backoff_for(&self, wait: u32) -> Duration {
        let factor = 1u32.checked_shl(wait.min(16)).unwrap_or(u32::MAX);
        self.selection_backoff
            .saturating_mul(factor)
            .min(self.selection_backoff_max)
    }

    // ==================== Builder Methods ====================

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_selection_waits(mut self, waits: u32) -> Self {
        self.max_selection_waits = waits;
        self
    }

    pub fn with_selection_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.selection_backoff = initial;
        self.selection_backoff_max = max;
        self
    }

    pub fn with_selection_deadline(mut self, deadline: Duration) -> Self {
        self.selection_deadline = deadline;
        self
    }

    pub fn with_max_request_attempts(mut self, attempts: u32) -> Self {
        self.max_request_attempts = attempts;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }
}
