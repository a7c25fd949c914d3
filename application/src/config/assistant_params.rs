//! Assistant parameters: conversation and presentation behavior.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tutor_domain::response::DEFAULT_DISPLAY_DELAY;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantParams {
    /// Name of the site, used in the system prompt.
    pub site_name: String,
    /// Most recent messages sent with each request.
    pub history_limit: usize,
    /// How long a completed reply stays in `Completed` before `Idle`.
    pub display_delay: Duration,
}

impl Default for AssistantParams {
    fn default() -> Self {
        Self {
            site_name: "the course".to_string(),
            history_limit: 10,
            display_delay: DEFAULT_DISPLAY_DELAY,
        }
    }
}

impl AssistantParams {
    pub fn with_site_name(mut self, name: impl Into<String>) -> Self {
        self.site_name = name.into();
        self
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn with_display_delay(mut self, delay: Duration) -> Self {
        self.display_delay = delay;
        self
    }
}
