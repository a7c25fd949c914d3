//! Typed actions extracted from assistant replies.

use crate::catalog::TopicRecord;
use serde::Serialize;

/// Link to a page of the site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigateAction {
    pub label: String,
    pub path: String,
    pub icon: String,
}

/// Recommendation of a catalog topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicAction {
    pub topic_id: String,
    pub resolved: Option<TopicRecord>,
}

/// Suggested next question, phrased as the learner would ask it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FollowUpAction {
    pub text: String,
}

/// A formula the UI can typeset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormulaAction {
    pub expression: String,
}

/// Result of parsing one command token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParsedAction {
    Navigate(NavigateAction),
    Topic(TopicAction),
    FollowUp(FollowUpAction),
    Formula(FormulaAction),
}

/// Actions that passed validation, ready to offer to the learner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidatedActions {
    pub navigations: Vec<NavigateAction>,
    pub topics: Vec<TopicAction>,
    pub formulas: Vec<FormulaAction>,
    /// Only the most recent valid suggestion is surfaced.
    pub follow_up: Option<FollowUpAction>,
}

impl ValidatedActions {
    pub fn is_empty(&self) -> bool {
        self.navigations.is_empty()
            && self.topics.is_empty()
            && self.formulas.is_empty()
            && self.follow_up.is_none()
    }

    pub fn len(&self) -> usize {
        self.navigations.len()
            + self.topics.len()
            + self.formulas.len()
            + usize::from(self.follow_up.is_some())
    }
}
