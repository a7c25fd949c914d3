//! Output sanitizer for raw model text.
//!
//! Models leak scaffolding into their replies: chat-template control markers,
//! instruction delimiters, hidden reasoning blocks, and `@` prefixes in front
//! of links. [`sanitize`] removes them. It is applied to the whole
//! accumulated buffer on every frame, so it must be total and idempotent.
//!
//! The sanitizer never touches the embedded command protocol; `[[...]]`
//! tokens survive so the protocol layer can parse them afterwards.

use regex::Regex;
use std::sync::LazyLock;

/// Scaffolding rules, applied in order: pattern and replacement.
const RULES: &[(&str, &str)] = &[
    // Chat-template control markers such as `<|im_end|>`.
    (r"<\|[A-Za-z0-9_-]{1,32}\|>", ""),
    // Instruction delimiters.
    (
        r"\[/?INST\]|<</?SYS>>|</?s>|<start_of_turn>|<end_of_turn>",
        "",
    ),
    // Reasoning spans. Non-greedy, so each opener ends at the nearest closer.
    (r"(?is)<think>.*?</think>", ""),
    (r"(?is)<thinking>.*?</thinking>", ""),
    (r"(?is)<reasoning>.*?</reasoning>", ""),
    // `@` in front of a link or absolute path at the start of a word.
    (r"(?P<lead>^|[\s(])@(?P<link>https?://|www\.|/)", "${lead}${link}"),
];

static COMPILED: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    let compiled: Vec<_> = RULES
        .iter()
        .filter_map(|(pattern, replacement)| {
            Regex::new(pattern).ok().map(|regex| (regex, *replacement))
        })
        .collect();
    debug_assert_eq!(compiled.len(), RULES.len(), "invalid sanitizer pattern");
    compiled
});

/// Remove model scaffolding from `text`.
///
/// Output is never longer than the input and `sanitize(sanitize(x)) ==
/// sanitize(x)` for every `x`. Unterminated reasoning blocks are left as-is:
/// removal needs both delimiters.
///
/// # Examples
///
/// ```
/// use tutor_domain::sanitize::sanitize;
///
/// let raw = "<|assistant|><think>user wants a recap</think>  Sure! See @https://example.org";
/// assert_eq!(sanitize(raw), "Sure! See https://example.org");
/// ```
pub fn sanitize(text: &str) -> String {
    let mut current = sanitize_once(text);
    // Each pass only removes; removal can join fragments into a new match.
    loop {
        let next = sanitize_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn sanitize_once(text: &str) -> String {
    let cleaned = COMPILED
        .iter()
        .fold(text.to_string(), |acc, (regex, replacement)| {
            regex.replace_all(&acc, *replacement).into_owned()
        });
    cleaned.trim_start().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Removal ====================

    #[test]
    fn test_control_markers_removed() {
        assert_eq!(
            sanitize("<|im_start|>assistant\nHello<|im_end|>"),
            "assistant\nHello"
        );
        assert_eq!(sanitize("<|eot_id|>Done"), "Done");
    }

    #[test]
    fn test_pipe_text_that_is_not_a_marker_is_kept() {
        assert_eq!(sanitize("a <| b |> c"), "a <| b |> c");
        assert_eq!(sanitize("x <|"), "x <|");
    }

    #[test]
    fn test_instruction_delimiters_removed() {
        assert_eq!(
            sanitize("[INST] <<SYS>>rules<</SYS>> [/INST]Answer</s>"),
            "rules Answer"
        );
    }

    #[test]
    fn test_reasoning_span_removed_case_insensitive() {
        assert_eq!(
            sanitize("<THINK>plan the answer</Think>The cell is the unit of life."),
            "The cell is the unit of life."
        );
        assert_eq!(
            sanitize("A<reasoning>x</reasoning>B<thinking>y</thinking>C"),
            "ABC"
        );
    }

    #[test]
    fn test_reasoning_removal_is_non_greedy() {
        assert_eq!(
            sanitize("<think>a</think>keep<think>b</think>end"),
            "keepend"
        );
    }

    #[test]
    fn test_unterminated_reasoning_is_left_alone() {
        assert_eq!(sanitize("<think>still going"), "<think>still going");
    }

    #[test]
    fn test_link_markers_removed() {
        assert_eq!(
            sanitize("Open @/lessons/cells or (@https://x.org)"),
            "Open /lessons/cells or (https://x.org)"
        );
        assert_eq!(sanitize("@www.example.org"), "www.example.org");
    }

    #[test]
    fn test_emails_and_mentions_survive() {
        assert_eq!(sanitize("mail me@example.org"), "mail me@example.org");
        assert_eq!(sanitize("ask @mentor"), "ask @mentor");
    }

    #[test]
    fn test_leading_whitespace_trimmed() {
        assert_eq!(sanitize("\n\n   Hello"), "Hello");
    }

    #[test]
    fn test_command_tokens_survive() {
        let text = "Go here [[NAVIGATE:Cells|/lessons/cells|book]]";
        assert_eq!(sanitize(text), text);
    }

    // ==================== Invariants ====================

    #[test]
    fn test_idempotent_and_never_longer() {
        let inputs = [
            "",
            "plain text",
            "<|<|im_end|>im_start|>x",
            "<thi<think>x</think>nk>y</think>z",
            "[IN[INST]ST] hello",
            " @ @/path",
            "<|a|><think>r</think>  @/x [[TOPIC:cells]]",
            "ünïcödé <|end|> 日本語",
        ];
        for input in inputs {
            let once = sanitize(input);
            assert!(once.len() <= input.len(), "grew: {input:?}");
            assert_eq!(sanitize(&once), once, "not idempotent: {input:?}");
        }
    }

    #[test]
    fn test_every_rule_compiles() {
        assert_eq!(COMPILED.len(), RULES.len());
    }

    #[test]
    fn test_removal_that_forms_a_new_match_is_handled() {
        assert_eq!(sanitize("[IN[INST]ST]ok"), "ok");
    }
}
