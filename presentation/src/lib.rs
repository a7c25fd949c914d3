//! Presentation layer for study-tutor
//!
//! This crate contains the CLI definition, console formatting,
//! turn progress reporting, and the interactive chat interface.

pub mod chat;
pub mod cli;
pub mod output;
pub mod progress;

// Re-export commonly used types
pub use chat::{ChatRepl, ReplCommand, spawn_interrupt_watcher};
pub use cli::commands::{Cli, OutputFormat};
pub use output::console::ConsoleFormatter;
pub use progress::reporter::{StreamingPrinter, TurnReporter};
