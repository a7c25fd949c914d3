//! Dispatch configuration from TOML (`[dispatch]` section)

use serde::{Deserialize, Serialize};

/// Raw failover and backoff configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileDispatchConfig {
    /// Backoff rounds while no credential is eligible
    pub max_selection_waits: u32,
    /// First backoff delay
    pub selection_backoff_ms: u64,
    /// Backoff cap
    pub selection_backoff_max_ms: u64,
    /// Total time allowed for credential selection
    pub selection_deadline_ms: u64,
    /// Requests allowed per exchange, across all credentials
    pub max_request_attempts: u32,
}

impl Default for FileDispatchConfig {
    fn default() -> Self {
        Self {
            max_selection_waits: 3,
            selection_backoff_ms: 500,
            selection_backoff_max_ms: 4_000,
            selection_deadline_ms: 10_000,
            max_request_attempts: 6,
        }
    }
}
