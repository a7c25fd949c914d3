//! Actions proposed by the assistant and their validation.
//!
//! The model may only propose; the [`ActionValidator`] decides. Navigation
//! targets must be catalog routes and follow-up suggestions must read as
//! the learner's own question.

pub mod entities;
pub mod follow_up;
pub mod similarity;
pub mod validator;

pub use entities::{
    FollowUpAction, FormulaAction, NavigateAction, ParsedAction, TopicAction, ValidatedActions,
};
pub use follow_up::{FollowUpRejection, FollowUpRules, MAX_FOLLOW_UP_CHARS, MIN_FOLLOW_UP_CHARS};
pub use validator::{
    ActionValidator, MAX_ROUTE_SUGGESTIONS, Rejection, RouteSuggestion, SUGGESTION_THRESHOLD,
    ValidationReport, suggest_routes,
};
