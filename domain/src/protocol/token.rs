//! Token kinds, the strict tokenizer and display stripping.

use serde::Serialize;
use std::fmt;
use std::ops::Range;

/// Command identifiers understood by the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenKind {
    Navigate,
    Topic,
    FollowUp,
    Formula,
}

impl TokenKind {
    pub const ALL: [TokenKind; 4] = [
        TokenKind::Navigate,
        TokenKind::Topic,
        TokenKind::FollowUp,
        TokenKind::Formula,
    ];

    /// Canonical identifier as written inside `[[...]]`.
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Navigate => "NAVIGATE",
            TokenKind::Topic => "TOPIC",
            TokenKind::FollowUp => "FOLLOW_UP",
            TokenKind::Formula => "FORMULA",
        }
    }

    /// Lenient lookup: case-insensitive, accepts `FOLLOWUP` and `FOLLOW-UP`.
    pub fn from_ident(ident: &str) -> Option<Self> {
        let normalized = ident.trim().to_ascii_uppercase().replace('-', "_");
        match normalized.as_str() {
            "NAVIGATE" => Some(TokenKind::Navigate),
            "TOPIC" => Some(TokenKind::Topic),
            "FOLLOW_UP" | "FOLLOWUP" => Some(TokenKind::FollowUp),
            "FORMULA" => Some(TokenKind::Formula),
            _ => None,
        }
    }

    /// Strict lookup: only the canonical spelling.
    pub fn from_canonical(ident: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == ident)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a buffer snapshot can still grow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamPhase {
    /// More text may follow; a trailing half-written token is hidden.
    Streaming,
    /// The reply is final; trailing text is kept as written.
    Complete,
}

/// A well-formed token found in a buffer snapshot.
///
/// Tokens are derived fresh from the current buffer every time; they are
/// never stored or patched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionToken {
    pub kind: TokenKind,
    pub raw_payload: String,
    /// Byte range of the whole `[[...]]` span in the tokenized text.
    pub span: Range<usize>,
}

/// Find every canonical `[[IDENT:payload]]` token, in order.
pub fn tokenize(text: &str) -> Vec<ActionToken> {
    let mut tokens = Vec::new();
    let mut cursor = 0;

    while let Some(relative) = text[cursor..].find("[[") {
        let start = cursor + relative;
        match token_at(text, start) {
            Some(token) => {
                cursor = token.span.end;
                tokens.push(token);
            }
            None => cursor = start + 1,
        }
    }

    tokens
}

fn token_at(text: &str, start: usize) -> Option<ActionToken> {
    let body = &text[start + 2..];
    let colon = body.find(':')?;
    let kind = TokenKind::from_canonical(&body[..colon])?;
    let payload_start = colon + 1;
    let close = payload_start + body[payload_start..].find(']')?;
    if !body[close..].starts_with("]]") {
        return None;
    }
    Some(ActionToken {
        kind,
        raw_payload: body[payload_start..close].to_string(),
        span: start..start + 2 + close + 2,
    })
}

/// Produce display text: remove token spans and clean up leftovers. While
/// streaming, a token still forming at the end of the buffer is hidden too.
pub fn strip(text: &str, tokens: &[ActionToken], phase: StreamPhase) -> String {
    let mut remaining = remove_spans(text, tokens);
    // Removing spans can join the halves of an outer token.
    loop {
        let nested = tokenize(&remaining);
        if nested.is_empty() {
            break;
        }
        remaining = remove_spans(&remaining, &nested);
    }
    match phase {
        StreamPhase::Streaming => clean_orphans(hide_forming_tail(&remaining)),
        StreamPhase::Complete => clean_orphans(&remaining),
    }
}

fn remove_spans(text: &str, tokens: &[ActionToken]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;

    for token in tokens {
        let Some(before) = text.get(cursor..token.span.start) else {
            continue;
        };
        out.push_str(before);
        cursor = token.span.end;
        // Avoid a double space where an inline token was.
        if out.ends_with(' ') && text[cursor..].starts_with(' ') {
            cursor += 1;
        }
    }

    out.push_str(text.get(cursor..).unwrap_or_default());
    out
}

/// Hide a trailing `[[IDENT:...` (or a prefix of one) that has not been
/// closed yet.
fn hide_forming_tail(text: &str) -> &str {
    let Some(last) = text.rfind('[') else {
        return text;
    };
    let run_start = text[..last]
        .trim_end_matches(|c: char| c == '[' || c == ' ')
        .len();
    let brackets = text[run_start..=last].matches('[').count();

    if is_forming(&text[last + 1..], brackets >= 2) {
        &text[..run_start]
    } else {
        text
    }
}

fn is_forming(tail: &str, double: bool) -> bool {
    if tail.contains([']', '\n']) {
        return false;
    }
    let tail = tail.trim_start();
    match tail.split_once(':') {
        Some((ident, _)) if double => TokenKind::from_ident(ident).is_some(),
        Some((ident, _)) => TokenKind::from_canonical(ident.trim_end()).is_some(),
        None => {
            let prefix = if double {
                tail.to_ascii_uppercase().replace('-', "_")
            } else {
                tail.to_string()
            };
            TokenKind::ALL
                .iter()
                .any(|kind| kind.as_str().starts_with(prefix.as_str()))
        }
    }
}

fn clean_orphans(text: &str) -> String {
    let mut cleaned = text.to_string();
    for empty in ["[[]]", "[[ ]]"] {
        while cleaned.contains(empty) {
            cleaned = cleaned.replace(empty, "");
        }
    }

    let mut lines: Vec<&str> = Vec::new();
    let mut blank_run = 0;
    for line in cleaned.lines().map(str::trim_end) {
        if is_bracket_only(line) {
            continue;
        }
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 || lines.is_empty() {
                continue;
            }
        } else {
            blank_run = 0;
        }
        lines.push(line);
    }

    lines.join("\n").trim_end().to_string()
}

fn is_bracket_only(line: &str) -> bool {
    let line = line.trim();
    !line.is_empty() && line.chars().all(|c| c == '[' || c == ']')
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Tokenize ====================

    #[test]
    fn test_tokenize_in_order() {
        let text = "A [[NAVIGATE:Cells|/cells]] B [[TOPIC:atoms]] C [[FOLLOW_UP:I want more]]";
        let tokens = tokenize(text);
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![TokenKind::Navigate, TokenKind::Topic, TokenKind::FollowUp]
        );
        assert_eq!(tokens[1].raw_payload, "atoms");
        assert_eq!(&text[tokens[0].span.clone()], "[[NAVIGATE:Cells|/cells]]");
    }

    #[test]
    fn test_tokenize_ignores_unknown_and_unclosed() {
        assert!(tokenize("[[NOTE:x]] [[TOPIC:y] [[topic:z]]").is_empty());
        assert!(tokenize("[[FORMULA:E = mc^2").is_empty());
    }

    #[test]
    fn test_tokenize_extra_opening_bracket() {
        let tokens = tokenize("[[[TOPIC:cells]]");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].span, 1..16);
    }

    #[test]
    fn test_from_ident_aliases() {
        assert_eq!(TokenKind::from_ident("follow-up"), Some(TokenKind::FollowUp));
        assert_eq!(TokenKind::from_ident("FollowUp"), Some(TokenKind::FollowUp));
        assert_eq!(TokenKind::from_ident("note"), None);
        assert_eq!(TokenKind::from_canonical("topic"), None);
    }

    // ==================== Strip ====================

    #[test]
    fn test_strip_leaves_no_grammar_matches() {
        let inputs = [
            "Hello [[TOPIC:a]]",
            "[[NAVIGATE:Home|/]]\n\n\n\nText [[FOLLOW_UP:I want x]]",
            "[[NAV[[TOPIC:x]]IGATE:y]] tail",
            "[[FORMULA:a+b]][[FORMULA:c]]",
        ];
        for input in inputs {
            let stripped = strip(input, &tokenize(input), StreamPhase::Streaming);
            assert!(tokenize(&stripped).is_empty(), "left tokens: {stripped:?}");
        }
    }

    #[test]
    fn test_strip_tidies_whitespace() {
        let text = "Read this [[TOPIC:cells]] now.\n\n\n\n[[FOLLOW_UP:I want to practice more]]\n";
        assert_eq!(strip(text, &tokenize(text), StreamPhase::Streaming), "Read this now.");
    }

    #[test]
    fn test_strip_removes_bracket_only_lines() {
        let text = "Answer\n[\n[[TOPIC:x]]]\nMore";
        assert_eq!(strip(text, &tokenize(text), StreamPhase::Streaming), "Answer\nMore");
    }

    #[test]
    fn test_strip_hides_forming_token() {
        for (partial, expected) in [
            ("Sure thing [[NAVI", "Sure thing"),
            ("Sure thing [[NAVIGATE:Cells|/ce", "Sure thing"),
            ("Sure thing [[", "Sure thing"),
            ("Sure thing [[ topic", "Sure thing"),
            ("Sure thing [FOLLOW_UP:I want", "Sure thing"),
        ] {
            assert_eq!(strip(partial, &tokenize(partial), StreamPhase::Streaming), expected, "{partial}");
        }
    }

    #[test]
    fn test_complete_text_keeps_trailing_brackets() {
        for text in [
            "Indexing uses arr[",
            "Answer choices: [T",
            "See note [F",
            "Pick one of [[N",
        ] {
            assert_eq!(strip(text, &tokenize(text), StreamPhase::Complete), text);
        }
        let text = "Read [[TOPIC:cells]] then [NAV";
        assert_eq!(
            strip(text, &tokenize(text), StreamPhase::Complete),
            "Read then [NAV"
        );
    }

    #[test]
    fn test_strip_keeps_ordinary_brackets() {
        for text in [
            "Arrays start at [0]",
            "see [citation needed",
            "let v = [];",
            "[Docs](https://example.org)",
        ] {
            assert_eq!(strip(text, &tokenize(text), StreamPhase::Streaming), text);
        }
    }
}
