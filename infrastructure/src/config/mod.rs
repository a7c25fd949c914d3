//! Configuration file loading for study-tutor
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `TUTOR_*` environment variables, `TUTOR_API_KEYS` for credentials
//! 2. `--config <path>` specified file
//! 3. Project root: `./tutor.toml` or `./.tutor.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/study-tutor/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    DEFAULT_ENDPOINT, DEFAULT_MODEL, FileAssistantConfig, FileCatalogConfig, FileConfig,
    FileDispatchConfig, FileLoggingConfig, FileOutputConfig, FileProviderConfig, FileReplConfig,
    parse_key_list,
};
pub use loader::{API_KEYS_VAR, ConfigError, ConfigLoader, ENV_PREFIX};
