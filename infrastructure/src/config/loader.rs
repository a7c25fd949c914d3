//! Configuration file loader with multi-source merging

use super::file_config::{FileConfig, parse_key_list};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Prefix of every configuration environment variable.
pub const ENV_PREFIX: &str = "TUTOR_";
/// Comma separated credential list.
pub const API_KEYS_VAR: &str = "TUTOR_API_KEYS";

const PROJECT_FILES: [&str; 2] = ["tutor.toml", ".tutor.toml"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),
}

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. `TUTOR_*` environment variables (`__` separates sections)
    /// 2. Explicit config path (if provided)
    /// 3. Project root: `./tutor.toml` or `./.tutor.toml`
    /// 4. Global: `$XDG_CONFIG_HOME/study-tutor/config.toml`
    /// 5. Default values
    pub fn load(config_path: Option<&PathBuf>) -> Result<FileConfig, ConfigError> {
        let mut config: FileConfig = Self::figment(config_path)
            .merge(
                Env::prefixed(ENV_PREFIX)
                    .ignore(&["api_keys"])
                    .split("__"),
            )
            .extract()
            .map_err(Box::new)?;

        if let Ok(raw) = std::env::var(API_KEYS_VAR) {
            Self::apply_key_list(&mut config, &raw);
        }
        Ok(config)
    }

    /// File sources only, without environment overrides.
    pub fn figment(config_path: Option<&PathBuf>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(&global_path));
        }

        if let Some(path) = Self::project_config_path() {
            figment = figment.merge(Toml::file(&path));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment
    }

    /// Load a single file over the defaults.
    pub fn load_file(path: &Path) -> Result<FileConfig, ConfigError> {
        Figment::new()
            .merge(Serialized::defaults(FileConfig::default()))
            .merge(Toml::file(path))
            .extract()
            .map_err(|e| ConfigError::Load(Box::new(e)))
    }

    /// Load only default configuration (for --no-config)
    pub fn load_defaults() -> FileConfig {
        let mut config = FileConfig::default();
        if let Ok(raw) = std::env::var(API_KEYS_VAR) {
            Self::apply_key_list(&mut config, &raw);
        }
        config
    }

    /// Replace the configured keys with a comma separated list.
    /// A list with no usable key leaves the configuration unchanged.
    pub fn apply_key_list(config: &mut FileConfig, raw: &str) {
        let keys = parse_key_list(raw);
        if !keys.is_empty() {
            config.provider.api_keys = keys;
        }
    }

    /// Get the global config file path
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("study-tutor").join("config.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        PROJECT_FILES
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// Print the config file locations being used (for debugging)
    pub fn print_config_sources() {
        println!("Configuration sources (in priority order):");
        println!("  [     ] Env:     {}* ({} for keys)", ENV_PREFIX, API_KEYS_VAR);

        if let Some(path) = Self::project_config_path() {
            println!("  [FOUND] Project: {}", path.display());
        } else {
            println!("  [     ] Project: ./tutor.toml or ./.tutor.toml");
        }

        if let Some(path) = Self::global_config_path() {
            if path.exists() {
                println!("  [FOUND] Global:  {}", path.display());
            } else {
                println!("  [     ] Global:  {}", path.display());
            }
        }

        println!("  [     ] Default: built-in defaults");
    }
}
