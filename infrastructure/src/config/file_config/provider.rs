//! Provider configuration from TOML (`[provider]` section)

use serde::{Deserialize, Serialize};

/// Default chat-completions endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
/// Default model identifier.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Raw provider configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProviderConfig {
    /// Chat-completions URL
    pub endpoint: String,
    /// Model identifier sent with every request
    pub model: String,
    /// Ordered API keys. Usually supplied through `TUTOR_API_KEYS` instead.
    pub api_keys: Vec<String>,
    /// Deadline for response headers
    pub request_timeout_secs: u64,
    /// Deadline between two body chunks
    pub idle_timeout_secs: u64,
}

impl Default for FileProviderConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_keys: Vec::new(),
            request_timeout_secs: 30,
            idle_timeout_secs: 45,
        }
    }
}

impl FileProviderConfig {
    /// Keys with surrounding whitespace removed and blanks dropped.
    pub fn usable_keys(&self) -> Vec<String> {
        self.api_keys
            .iter()
            .map(|key| key.trim())
            .filter(|key| !key.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Split a comma separated key list, dropping empty entries.
pub fn parse_key_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_list() {
        assert_eq!(parse_key_list("a, b,,c ,"), vec!["a", "b", "c"]);
        assert!(parse_key_list(" , ").is_empty());
    }

    #[test]
    fn test_usable_keys_drops_blanks() {
        let config = FileProviderConfig {
            api_keys: vec!["k1".into(), "  ".into(), " k2 ".into()],
            ..Default::default()
        };
        assert_eq!(config.usable_keys(), vec!["k1", "k2"]);
    }
}
