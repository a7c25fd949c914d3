//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They convert into application parameters once validated.

mod assistant;
mod dispatch;
mod provider;
mod sections;

pub use assistant::FileAssistantConfig;
pub use dispatch::FileDispatchConfig;
pub use provider::{DEFAULT_ENDPOINT, DEFAULT_MODEL, FileProviderConfig, parse_key_list};
pub use sections::{FileCatalogConfig, FileLoggingConfig, FileOutputConfig, FileReplConfig};

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tutor_application::{AssistantParams, DispatchParams};
use tutor_domain::{ConfigIssue, ConfigIssueCode};

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Upstream endpoint, model and credentials
    pub provider: FileProviderConfig,
    /// Failover and backoff
    pub dispatch: FileDispatchConfig,
    /// Conversation behavior
    pub assistant: FileAssistantConfig,
    /// Route and topic catalog
    pub catalog: FileCatalogConfig,
    /// Transcript logging
    pub logging: FileLoggingConfig,
    /// REPL settings
    pub repl: FileReplConfig,
    /// Output settings
    pub output: FileOutputConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        let provider = &self.provider;
        let dispatch = &self.dispatch;

        if provider.usable_keys().is_empty() {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::NoCredentials,
                "no API keys configured (set TUTOR_API_KEYS or [provider].api_keys)",
            ));
        }

        let endpoint = provider.endpoint.trim();
        if !(endpoint.starts_with("https://") || endpoint.starts_with("http://")) {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::InvalidEndpoint,
                format!("provider.endpoint: '{}' is not an http(s) URL", endpoint),
            ));
        }

        if provider.model.trim().is_empty() {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::EmptyModel,
                "provider.model: model name cannot be empty",
            ));
        }

        for (field, secs) in [
            ("provider.request_timeout_secs", provider.request_timeout_secs),
            ("provider.idle_timeout_secs", provider.idle_timeout_secs),
        ] {
            if secs == 0 {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::ZeroTimeout,
                    format!("{}: must be greater than 0", field),
                ));
            }
        }

        for (field, value) in [
            ("dispatch.max_selection_waits", dispatch.max_selection_waits),
            ("dispatch.max_request_attempts", dispatch.max_request_attempts),
        ] {
            if value == 0 {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::ZeroAttempts,
                    format!("{}: must be greater than 0", field),
                ));
            }
        }

        if dispatch.selection_backoff_ms > dispatch.selection_backoff_max_ms {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::BackoffInverted,
                format!(
                    "dispatch.selection_backoff_ms ({}) exceeds selection_backoff_max_ms ({}); the cap wins",
                    dispatch.selection_backoff_ms, dispatch.selection_backoff_max_ms
                ),
            ));
        }

        if self.assistant.history_limit == 0 {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::ZeroHistory,
                "assistant.history_limit is 0: only the latest learner message is sent",
            ));
        }

        if let Some(path) = &self.catalog.path
            && !Path::new(path).exists()
        {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::CatalogMissing,
                format!("catalog.path: '{}' does not exist", path),
            ));
        }

        issues
    }

    pub fn has_errors(issues: &[ConfigIssue]) -> bool {
        issues.iter().any(ConfigIssue::is_error)
    }

    pub fn to_dispatch_params(&self) -> DispatchParams {
        let dispatch = &self.dispatch;
        DispatchParams::default()
            .with_model(self.provider.model.trim())
            .with_max_selection_waits(dispatch.max_selection_waits)
            .with_selection_backoff(
                Duration::from_millis(dispatch.selection_backoff_ms),
                Duration::from_millis(dispatch.selection_backoff_max_ms),
            )
            .with_selection_deadline(Duration::from_millis(dispatch.selection_deadline_ms))
            .with_max_request_attempts(dispatch.max_request_attempts)
            .with_request_timeout(Duration::from_secs(self.provider.request_timeout_secs))
            .with_idle_timeout(Duration::from_secs(self.provider.idle_timeout_secs))
    }

    pub fn to_assistant_params(&self) -> AssistantParams {
        AssistantParams::default()
            .with_site_name(&self.assistant.site_name)
            .with_history_limit(self.assistant.history_limit)
            .with_display_delay(Duration::from_millis(self.assistant.display_delay_ms))
    }
}
