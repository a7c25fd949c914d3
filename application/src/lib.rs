//! Application layer for study-tutor
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{AssistantParams, DispatchParams};
pub use ports::{
    chat_transport::{ByteStream, ChatRequest, ChatTransport, TransportError},
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    progress::{NoTurnProgress, TurnProgress},
};
pub use use_cases::chat_session::{ChatSession, TurnKind, TurnOutcome, UNAVAILABLE_MESSAGE};
pub use use_cases::dispatch::{DispatchError, DispatchOutcome, StreamDispatcher};
