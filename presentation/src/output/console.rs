//! Console output formatter for chat turns

use colored::Colorize;
use std::time::Instant;
use tutor_application::{TurnKind, TurnOutcome};
use tutor_domain::{
    ConfigIssue, CredentialPool, Rejection, ResponseStateMachine, Severity, ValidatedActions,
};

/// Formats turn outcomes and session state for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Reply text followed by its actions.
    pub fn format_turn(outcome: &TurnOutcome) -> String {
        let mut output = String::new();
        match outcome.kind {
            TurnKind::Unavailable => {
                output.push_str(&outcome.display_text.yellow().to_string());
                output.push('\n');
            }
            TurnKind::Cancelled => output.push_str(&format!("{}\n", "(cancelled)".dimmed())),
            TurnKind::Busy => output.push_str(&format!(
                "{}\n",
                "Still answering the previous question.".yellow()
            )),
            TurnKind::Ignored => {}
            TurnKind::Answered | TurnKind::Blocked => {
                output.push_str(&outcome.display_text);
                output.push('\n');
            }
        }
        output.push_str(&Self::format_actions(&outcome.actions));
        output
    }

    /// Format as JSON
    pub fn format_json(outcome: &TurnOutcome) -> String {
        serde_json::to_string_pretty(outcome).unwrap_or_else(|_| "{}".to_string())
    }

    /// Validated actions as a short list. Empty when there are none.
    pub fn format_actions(actions: &ValidatedActions) -> String {
        if actions.is_empty() {
            return String::new();
        }

        let mut output = format!("\n{}\n", "Suggested next steps".cyan().bold());
        for nav in &actions.navigations {
            output.push_str(&format!(
                "  {} {} {}\n",
                "->".green(),
                nav.label.bold(),
                format!("({})", nav.path).dimmed()
            ));
        }
        for topic in &actions.topics {
            match &topic.resolved {
                Some(record) => {
                    let mut details = vec![record.path.clone()];
                    if !record.difficulty.is_empty() {
                        details.push(record.difficulty.clone());
                    }
                    if !record.duration.is_empty() {
                        details.push(record.duration.clone());
                    }
                    output.push_str(&format!(
                        "  {} {} {}\n",
                        "*".magenta(),
                        record.title.bold(),
                        format!("({})", details.join(", ")).dimmed()
                    ));
                }
                None => output.push_str(&format!("  {} {}\n", "*".magenta(), topic.topic_id)),
            }
        }
        for formula in &actions.formulas {
            output.push_str(&format!("  {} {}\n", "=".blue(), formula.expression));
        }
        if let Some(follow_up) = &actions.follow_up {
            output.push_str(&format!("  {} {}\n", "?".yellow(), follow_up.text.italic()));
        }
        output
    }

    /// Withheld actions, for `-v` runs.
    pub fn format_rejections(rejections: &[Rejection]) -> String {
        let mut output = String::new();
        for rejection in rejections {
            let line = match rejection {
                Rejection::Navigate { path, suggestions } if suggestions.is_empty() => {
                    format!("blocked link to {}", path)
                }
                Rejection::Navigate { path, suggestions } => {
                    let nearest: Vec<&str> =
                        suggestions.iter().map(|s| s.route.as_str()).collect();
                    format!("blocked link to {} (nearest: {})", path, nearest.join(", "))
                }
                Rejection::FollowUp { text, reason } => {
                    format!("dropped follow-up {:?}: {}", text, reason)
                }
            };
            output.push_str(&format!("  {}\n", line.dimmed()));
        }
        output
    }

    /// Current state and recent transitions.
    pub fn format_state(machine: &ResponseStateMachine) -> String {
        let mut output = format!("{} {}\n", "State:".cyan().bold(), machine.state());
        for record in machine.history() {
            output.push_str(&format!(
                "  {} -> {} {}\n",
                record.from,
                record.to,
                format!("({}, {} chars)", record.trigger, record.content_len).dimmed()
            ));
        }
        output
    }

    /// Credential health by pool index. Keys are never printed.
    pub fn format_pool(pool: &CredentialPool, now: Instant) -> String {
        let mut output = format!(
            "{} {}/{} eligible\n",
            "Credentials:".cyan().bold(),
            pool.eligible_count_at(now),
            pool.len()
        );
        for (index, credential) in pool.credentials().iter().enumerate() {
            let status = if credential.is_invalid() {
                "invalid".red().to_string()
            } else if let Some(until) = credential.cooldown_until().filter(|until| *until > now) {
                format!("cooling down {}s", (until - now).as_secs()).yellow().to_string()
            } else {
                "ready".green().to_string()
            };
            let marker = if index == pool.last_used_index() { "*" } else { " " };
            output.push_str(&format!("  {}#{} {}\n", marker, index, status));
        }
        output
    }

    pub fn format_issue(issue: &ConfigIssue) -> String {
        match issue.severity {
            Severity::Error => format!("{} {}", "error:".red().bold(), issue.message),
            Severity::Warning => format!("{} {}", "warning:".yellow().bold(), issue.message),
        }
    }

    pub fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tutor_domain::{
        ConfigIssueCode, FollowUpAction, FollowUpRejection, NavigateAction, ResponseState,
        RouteSuggestion, TopicAction, TopicRecord,
    };

    fn plain() {
        colored::control::set_override(false);
    }

    fn actions() -> ValidatedActions {
        ValidatedActions {
            navigations: vec![NavigateAction {
                label: "Cells".into(),
                path: "/biology/cells".into(),
                icon: "book".into(),
            }],
            topics: vec![TopicAction {
                topic_id: "mitosis".into(),
                resolved: Some(TopicRecord {
                    title: "Mitosis".into(),
                    path: "/biology/mitosis".into(),
                    icon: "dna".into(),
                    difficulty: "intermediate".into(),
                    duration: String::new(),
                }),
            }],
            formulas: Vec::new(),
            follow_up: Some(FollowUpAction {
                text: "I want to see the phases".into(),
            }),
        }
    }

    #[test]
    fn test_format_actions_lists_everything() {
        plain();
        let text = ConsoleFormatter::format_actions(&actions());
        assert!(text.contains("Cells (/biology/cells)"));
        assert!(text.contains("Mitosis (/biology/mitosis, intermediate)"));
        assert!(text.contains("? I want to see the phases"));
    }

    #[test]
    fn test_format_actions_empty() {
        assert!(ConsoleFormatter::format_actions(&ValidatedActions::default()).is_empty());
    }

    #[test]
    fn test_format_turn_unavailable_has_no_actions() {
        plain();
        let outcome = TurnOutcome {
            kind: TurnKind::Unavailable,
            display_text: "try again later".into(),
            actions: ValidatedActions::default(),
            rejections: Vec::new(),
            state: ResponseState::Idle,
        };
        assert_eq!(ConsoleFormatter::format_turn(&outcome), "try again later\n");
    }

    #[test]
    fn test_format_json_round_trips_kind() {
        let outcome = TurnOutcome {
            kind: TurnKind::Answered,
            display_text: "Hi".into(),
            actions: actions(),
            rejections: Vec::new(),
            state: ResponseState::Completed,
        };
        let value: serde_json::Value =
            serde_json::from_str(&ConsoleFormatter::format_json(&outcome)).unwrap();
        assert_eq!(value["kind"], "answered");
        assert_eq!(value["actions"]["navigations"][0]["path"], "/biology/cells");
    }

    #[test]
    fn test_format_rejections() {
        plain();
        let text = ConsoleFormatter::format_rejections(&[
            Rejection::Navigate {
                path: "/biolgy".into(),
                suggestions: vec![RouteSuggestion {
                    route: "/biology".into(),
                    similarity: 0.86,
                }],
            },
            Rejection::FollowUp {
                text: "More?".into(),
                reason: FollowUpRejection::TooShort { chars: 5 },
            },
        ]);
        assert!(text.contains("blocked link to /biolgy (nearest: /biology)"));
        assert!(text.contains("dropped follow-up \"More?\""));
    }

    #[test]
    fn test_format_pool_never_prints_keys() {
        plain();
        let pool = CredentialPool::new(["sk-secret-1", "sk-secret-2"]);
        let text = ConsoleFormatter::format_pool(&pool, Instant::now());
        assert!(text.contains("2/2 eligible"));
        assert!(!text.contains("sk-secret"));
    }

    #[test]
    fn test_format_issue() {
        plain();
        let issue = ConfigIssue::error(ConfigIssueCode::NoCredentials, "no API keys");
        assert_eq!(ConsoleFormatter::format_issue(&issue), "error: no API keys");
    }

    #[test]
    fn test_indent() {
        assert_eq!(ConsoleFormatter::indent("a\nb", "  "), "  a\n  b");
    }
}
