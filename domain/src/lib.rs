//! Domain layer for study-tutor
//!
//! This crate contains the core logic of the study assistant. It performs no
//! I/O and has no dependencies on infrastructure or presentation concerns;
//! every time-dependent operation takes the current instant explicitly.
//!
//! # Core Concepts
//!
//! ## Reply pipeline
//!
//! Raw model text flows through three pure stages on every streamed frame:
//!
//! - **Sanitizer**: strips model scaffolding ([`sanitize()`])
//! - **Command protocol**: repairs, tokenizes and parses `[[TYPE:payload]]`
//!   commands ([`protocol`])
//! - **Action validator**: authorizes parsed actions against the
//!   [`Catalog`] ([`ActionValidator`])
//!
//! ## Dispatch support
//!
//! - **Credential pool**: sticky round-robin over API keys with per-failure
//!   cooldowns ([`CredentialPool`])
//! - **Response state machine**: `Idle → Thinking → Streaming → Completed`
//!   ([`ResponseStateMachine`])
//! - **Injection guard**: refuses manipulative input before dispatch
//!   ([`InjectionGuard`])

pub mod action;
pub mod catalog;
pub mod config;
pub mod credential;
pub mod guard;
pub mod prompt;
pub mod protocol;
pub mod response;
pub mod sanitize;
pub mod session;
pub mod util;

// Re-export commonly used types
pub use action::{
    ActionValidator, FollowUpAction, FollowUpRejection, FormulaAction, NavigateAction,
    ParsedAction, Rejection, RouteSuggestion, TopicAction, ValidatedActions, ValidationReport,
};
pub use catalog::{Catalog, TopicRecord, normalize_route};
pub use config::{ConfigIssue, ConfigIssueCode, Severity};
pub use credential::{Credential, CredentialOutcome, CredentialPool};
pub use guard::{CANNED_REPLY, GuardVerdict, InjectionGuard, InjectionKind};
pub use prompt::PromptTemplate;
pub use protocol::{ActionToken, Extraction, StreamPhase, TokenKind, extract};
pub use response::{ResponseEvent, ResponseState, ResponseStateMachine};
pub use sanitize::sanitize;
pub use session::{
    entities::{Conversation, ConversationEntry, Message, Role},
    frame::{Frame, FrameDecoder, parse_frame},
};
