//! Prompt domain
//!
//! The system prompt that frames every exchange: who the assistant is, which
//! page the learner is on, and how to embed commands.

mod template;

pub use template::PromptTemplate;
