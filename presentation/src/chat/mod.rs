//! Interactive chat module
//!
//! Provides a reedline-based interactive chat interface.

mod repl;

pub use repl::{ChatRepl, ReplCommand, spawn_interrupt_watcher};
