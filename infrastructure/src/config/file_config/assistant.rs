//! Assistant configuration from TOML (`[assistant]` section)

use serde::{Deserialize, Serialize};

/// Raw assistant behavior configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAssistantConfig {
    /// Name used in the system prompt
    pub site_name: String,
    /// Non-system messages sent with each request
    pub history_limit: usize,
    /// How long a completed reply stays marked complete
    pub display_delay_ms: u64,
}

impl Default for FileAssistantConfig {
    fn default() -> Self {
        Self {
            site_name: "Study Hub".to_string(),
            history_limit: 10,
            display_delay_ms: 500,
        }
    }
}
