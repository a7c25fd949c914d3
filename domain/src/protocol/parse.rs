//! Per-kind payload parsing.
//!
//! Parsing is total: a malformed payload yields `None` and never affects the
//! other tokens of the message.

use super::token::{ActionToken, TokenKind};
use crate::action::{FollowUpAction, FormulaAction, NavigateAction, ParsedAction, TopicAction};
use crate::catalog::Catalog;

/// Path used when a `NAVIGATE` payload omits one.
pub const DEFAULT_NAVIGATE_PATH: &str = "/";

/// Icon used when a `NAVIGATE` payload omits one.
pub const DEFAULT_NAVIGATE_ICON: &str = "arrow-right";

pub fn parse_token(token: &ActionToken, catalog: &Catalog) -> Option<ParsedAction> {
    let payload = token.raw_payload.as_str();
    match token.kind {
        TokenKind::Navigate => parse_navigate(payload).map(ParsedAction::Navigate),
        TokenKind::Topic => parse_topic(payload, catalog).map(ParsedAction::Topic),
        TokenKind::FollowUp => non_empty(payload)
            .map(|text| ParsedAction::FollowUp(FollowUpAction { text })),
        TokenKind::Formula => non_empty(payload)
            .map(|expression| ParsedAction::Formula(FormulaAction { expression })),
    }
}

/// `Label|/path|icon`; path and icon are optional.
pub fn parse_navigate(payload: &str) -> Option<NavigateAction> {
    let mut parts = payload.split('|').map(str::trim);
    let label = parts.next().filter(|label| !label.is_empty())?;
    let path = parts
        .next()
        .filter(|path| !path.is_empty())
        .unwrap_or(DEFAULT_NAVIGATE_PATH);
    let icon = parts
        .next()
        .filter(|icon| !icon.is_empty())
        .unwrap_or(DEFAULT_NAVIGATE_ICON);

    Some(NavigateAction {
        label: label.to_string(),
        path: path.to_string(),
        icon: icon.to_string(),
    })
}

/// Unresolved topic ids are dropped.
pub fn parse_topic(payload: &str, catalog: &Catalog) -> Option<TopicAction> {
    catalog
        .resolve_topic(payload)
        .map(|(topic_id, record)| TopicAction {
            topic_id: topic_id.to_string(),
            resolved: Some(record.clone()),
        })
}

fn non_empty(payload: &str) -> Option<String> {
    let trimmed = payload.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
