//! Conversation domain.
//!
//! - [`entities::Conversation`]: the message history bound to a page
//! - [`entities::Message`]: a single message within it
//! - [`frame`]: line framing of streamed completions

pub mod entities;
pub mod frame;
