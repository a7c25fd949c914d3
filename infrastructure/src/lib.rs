//! Infrastructure layer for study-tutor
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, plus configuration and catalog loading.

pub mod catalog;
pub mod config;
pub mod logging;
pub mod transport;

// Re-export commonly used types
pub use catalog::{CatalogError, CatalogLoader};
pub use config::{
    API_KEYS_VAR, ConfigError, ConfigLoader, FileAssistantConfig, FileCatalogConfig, FileConfig,
    FileDispatchConfig, FileLoggingConfig, FileOutputConfig, FileProviderConfig, FileReplConfig,
};
pub use logging::JsonlConversationLogger;
pub use transport::HttpChatTransport;
