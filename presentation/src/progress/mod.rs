//! Live progress for chat turns

pub mod reporter;
