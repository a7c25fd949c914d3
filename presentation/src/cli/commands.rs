//! CLI command definitions

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for one-shot answers
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Reply text followed by the suggested actions
    Text,
    /// The whole turn outcome as JSON
    Json,
}

/// CLI arguments for study-tutor
#[derive(Parser, Debug)]
#[command(name = "study-tutor")]
#[command(author, version, about = "Streaming study assistant for a learning site")]
#[command(long_about = r#"
study-tutor answers learner questions about the page they are on. Replies
stream from a chat-completions provider; API keys rotate automatically when
one is rate limited. Suggested pages and topics are checked against the
site catalog before they are shown.

Configuration files are loaded from (in priority order):
1. TUTOR_* environment variables (TUTOR_API_KEYS=key1,key2)
2. --config <path>     Explicit config file
3. ./tutor.toml        Project-level config
4. ~/.config/study-tutor/config.toml   Global config

Example:
  study-tutor --context /biology/cells "How do cells divide?"
  study-tutor --chat --catalog catalog.toml
"#)]
pub struct Cli {
    /// The question to ask (not required in chat mode)
    pub question: Option<String>,

    /// Start interactive chat mode
    #[arg(short, long)]
    pub chat: bool,

    /// Page the learner is on
    #[arg(long, value_name = "PATH", default_value = "/")]
    pub context: String,

    /// Override the configured model
    #[arg(short, long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Catalog file with routes and topics
    #[arg(long, value_name = "PATH")]
    pub catalog: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Write diagnostic logs to this file
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Write a JSONL conversation transcript to this file
    #[arg(long, value_name = "PATH")]
    pub transcript: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}
