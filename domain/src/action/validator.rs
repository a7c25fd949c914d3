//! Authorization of parsed actions against the catalog.

use super::entities::{FollowUpAction, NavigateAction, ParsedAction, ValidatedActions};
use super::follow_up::{FollowUpRejection, FollowUpRules};
use super::similarity::similarity;
use crate::catalog::{Catalog, normalize_route};
use serde::Serialize;

/// Suggestions reported for a blocked navigation.
pub const MAX_ROUTE_SUGGESTIONS: usize = 3;

/// Minimum similarity for a route to be suggested.
pub const SUGGESTION_THRESHOLD: f64 = 0.5;

/// A known route close to a rejected one. Diagnostic only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteSuggestion {
    pub route: String,
    pub similarity: f64,
}

/// Why an action was withheld from the learner.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Rejection {
    Navigate {
        path: String,
        suggestions: Vec<RouteSuggestion>,
    },
    FollowUp {
        text: String,
        reason: FollowUpRejection,
    },
}

/// Outcome of validating every action of one reply.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub actions: ValidatedActions,
    pub rejections: Vec<Rejection>,
}

#[derive(Debug, Clone, Default)]
pub struct ActionValidator {
    follow_up: FollowUpRules,
}

impl ActionValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept a navigation only if its normalized path is a catalog route.
    /// The returned action carries the normalized path.
    pub fn validate_navigate(
        &self,
        action: &NavigateAction,
        catalog: &Catalog,
    ) -> Result<NavigateAction, Rejection> {
        let path = normalize_route(&action.path);
        if catalog.is_valid_route(&path) {
            return Ok(NavigateAction {
                path,
                ..action.clone()
            });
        }
        Err(Rejection::Navigate {
            suggestions: suggest_routes(&path, catalog),
            path,
        })
    }

    pub fn validate_follow_up(&self, text: &str) -> Result<(), FollowUpRejection> {
        self.follow_up.check(text)
    }

    /// Validate a reply's actions in order. The last valid follow-up wins.
    pub fn validate(&self, actions: &[ParsedAction], catalog: &Catalog) -> ValidationReport {
        let mut report = ValidationReport::default();

        for action in actions {
            match action {
                ParsedAction::Navigate(navigate) => {
                    match self.validate_navigate(navigate, catalog) {
                        Ok(allowed) => report.actions.navigations.push(allowed),
                        Err(rejection) => report.rejections.push(rejection),
                    }
                }
                // Unresolved topics never get this far.
                ParsedAction::Topic(topic) => report.actions.topics.push(topic.clone()),
                ParsedAction::Formula(formula) => report.actions.formulas.push(formula.clone()),
                ParsedAction::FollowUp(FollowUpAction { text }) => {
                    match self.validate_follow_up(text) {
                        Ok(()) => {
                            report.actions.follow_up = Some(FollowUpAction {
                                text: text.trim().to_string(),
                            })
                        }
                        Err(reason) => report.rejections.push(Rejection::FollowUp {
                            text: text.clone(),
                            reason,
                        }),
                    }
                }
            }
        }

        report
    }
}

/// Up to [`MAX_ROUTE_SUGGESTIONS`] routes with similarity above
/// [`SUGGESTION_THRESHOLD`], best first.
pub fn suggest_routes(path: &str, catalog: &Catalog) -> Vec<RouteSuggestion> {
    let mut scored: Vec<RouteSuggestion> = catalog
        .routes()
        .map(|route| RouteSuggestion {
            route: route.to_string(),
            similarity: similarity(path, route),
        })
        .filter(|suggestion| suggestion.similarity > SUGGESTION_THRESHOLD)
        .collect();
    scored.sort_by(|a, b| {
        b.similarity
            .total_cmp(&a.similarity)
            .then_with(|| a.route.cmp(&b.route))
    });
    scored.truncate(MAX_ROUTE_SUGGESTIONS);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{FormulaAction, TopicAction};
    use crate::protocol::{StreamPhase, extract};
    use std::collections::BTreeMap;

    fn catalog() -> Catalog {
        Catalog::new(
            [
                "/lessons/cells",
                "/lessons/cell-division",
                "/lessons/atoms",
                "/quiz",
            ],
            BTreeMap::new(),
        )
    }

    fn nav(path: &str) -> NavigateAction {
        NavigateAction {
            label: "Go".to_string(),
            path: path.to_string(),
            icon: "arrow-right".to_string(),
        }
    }

    #[test]
    fn test_every_catalog_route_is_accepted() {
        let catalog = catalog();
        let validator = ActionValidator::new();
        for route in catalog.routes() {
            assert!(validator.validate_navigate(&nav(route), &catalog).is_ok(), "{route}");
        }
    }

    #[test]
    fn test_trailing_slash_is_normalized() {
        let validator = ActionValidator::new();
        let allowed = validator
            .validate_navigate(&nav("/lessons/cells/"), &catalog())
            .unwrap();
        assert_eq!(allowed.path, "/lessons/cells");
    }

    #[test]
    fn test_unknown_route_is_blocked_with_suggestions() {
        let validator = ActionValidator::new();
        let Err(Rejection::Navigate { path, suggestions }) =
            validator.validate_navigate(&nav("/lessons/cell"), &catalog())
        else {
            panic!("expected navigation to be blocked");
        };
        assert_eq!(path, "/lessons/cell");
        assert!(!suggestions.is_empty() && suggestions.len() <= MAX_ROUTE_SUGGESTIONS);
        assert_eq!(suggestions[0].route, "/lessons/cells");
        assert!(suggestions.iter().all(|s| s.similarity > SUGGESTION_THRESHOLD));
    }

    #[test]
    fn test_root_is_rejected_unless_listed() {
        let catalog = catalog();
        let extraction = extract(
            "Go [[NAVIGATE:Home]] or [[NAVIGATE:Root|/]]",
            &catalog,
            StreamPhase::Complete,
        );
        let report = ActionValidator::new().validate(&extraction.actions, &catalog);
        assert!(report.actions.navigations.is_empty());
        assert_eq!(report.rejections.len(), 2);

        let with_root = Catalog::new(["/"], BTreeMap::new());
        let report = ActionValidator::new().validate(&extraction.actions, &with_root);
        assert_eq!(report.actions.navigations.len(), 2);
    }

    #[test]
    fn test_unrelated_route_gets_no_suggestions() {
        let validator = ActionValidator::new();
        let Err(Rejection::Navigate { suggestions, .. }) =
            validator.validate_navigate(&nav("/admin/secrets/export"), &catalog())
        else {
            panic!("expected navigation to be blocked");
        };
        assert!(suggestions.is_empty());
    }

    #[test]
    fn test_last_valid_follow_up_wins() {
        let actions = vec![
            ParsedAction::FollowUp(FollowUpAction {
                text: "I want to see the first example again".to_string(),
            }),
            ParsedAction::FollowUp(FollowUpAction {
                text: "Show me how mitosis differs from meiosis".to_string(),
            }),
            ParsedAction::FollowUp(FollowUpAction {
                text: "Do you want more?".to_string(),
            }),
        ];
        let report = ActionValidator::new().validate(&actions, &catalog());
        assert_eq!(
            report.actions.follow_up.unwrap().text,
            "Show me how mitosis differs from meiosis"
        );
        assert_eq!(report.rejections.len(), 1);
    }

    #[test]
    fn test_validate_mixed_actions() {
        let actions = vec![
            ParsedAction::Navigate(nav("/quiz")),
            ParsedAction::Navigate(nav("/nowhere")),
            ParsedAction::Topic(TopicAction {
                topic_id: "cells".to_string(),
                resolved: None,
            }),
            ParsedAction::Formula(FormulaAction {
                expression: "E = mc^2".to_string(),
            }),
        ];
        let report = ActionValidator::new().validate(&actions, &catalog());
        assert_eq!(report.actions.navigations.len(), 1);
        assert_eq!(report.actions.topics.len(), 1);
        assert_eq!(report.actions.formulas.len(), 1);
        assert_eq!(report.rejections.len(), 1);
    }
}
