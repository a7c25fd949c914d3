//! Normalization of malformed command brackets.
//!
//! Models often produce near-misses of the `[[IDENT:payload]]` grammar. The
//! repair pass rewrites only these shapes:
//!
//! | Shape                      | Condition                         |
//! |----------------------------|-----------------------------------|
//! | `[ [IDENT : payload] ]`    | always (spaced double brackets)   |
//! | `[[ident:payload]]`        | always (lowercase identifier)     |
//! | `[IDENT:payload]`          | identifier in canonical spelling  |
//! | `[[IDENT:payload]`         | closes at the end of a line       |
//! | `[IDENT:payload]]`         | opens at the start of a line      |
//!
//! Anything else in brackets (`[0]`, `[citation needed]`, markdown links)
//! is left untouched. Spans that are already canonical are copied
//! byte-for-byte, which makes the pass idempotent.

use super::token::TokenKind;
use std::ops::Range;

/// Rewrite recognizable malformed tokens into canonical form.
///
/// ```
/// use tutor_domain::protocol::repair;
///
/// assert_eq!(repair("[NAVIGATE:Home|/]"), "[[NAVIGATE:Home|/]]");
/// assert_eq!(repair("[ [topic : cells ] ]"), "[[TOPIC:cells]]");
/// assert_eq!(repair("Arrays start at [0]"), "Arrays start at [0]");
/// ```
pub fn repair(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    let mut copied = 0;
    let mut cursor = 0;

    while let Some(relative) = text[cursor..].find('[') {
        let start = cursor + relative;
        match scan(text, start).filter(|candidate| candidate.is_repairable(text, start)) {
            Some(candidate) => {
                if !candidate.canonical {
                    out.push_str(&text[copied..start]);
                    candidate.write_canonical(text, &mut out);
                    copied = candidate.end;
                }
                cursor = candidate.end;
            }
            None => cursor = start + 1,
        }
    }

    out.push_str(&text[copied..]);
    out
}

#[derive(Debug)]
struct Candidate {
    kind: TokenKind,
    payload: Range<usize>,
    opening: u8,
    closing: u8,
    /// Identifier spelled exactly as the canonical form.
    exact_ident: bool,
    canonical: bool,
    end: usize,
}

impl Candidate {
    fn is_repairable(&self, text: &str, start: usize) -> bool {
        match (self.opening, self.closing) {
            (2, 2) => true,
            (1, 1) => self.exact_ident,
            (2, 1) => at_line_end(text, self.end),
            (1, 2) => at_line_start(text, start),
            _ => false,
        }
    }

    fn write_canonical(&self, text: &str, out: &mut String) {
        out.push_str("[[");
        out.push_str(self.kind.as_str());
        out.push(':');
        out.push_str(text[self.payload.clone()].trim());
        out.push_str("]]");
    }
}

/// Try to read a bracketed command starting at the `[` at `start`.
fn scan(text: &str, start: usize) -> Option<Candidate> {
    let bytes = text.as_bytes();
    let len = bytes.len();

    // The inner half of a double bracket is never a token start on its own.
    if text[..start].trim_end_matches([' ', '\t']).ends_with('[') {
        return None;
    }

    let mut opening = 1;
    let mut tight_open = true;
    let mut cursor = start + 1;
    let after_first = skip_blanks(bytes, cursor);
    if after_first < len && bytes[after_first] == b'[' {
        opening = 2;
        tight_open = after_first == cursor;
        cursor = after_first + 1;
    }

    let ident_start = skip_blanks(bytes, cursor);
    let mut ident_end = ident_start;
    while ident_end < len
        && (bytes[ident_end].is_ascii_alphabetic() || matches!(bytes[ident_end], b'_' | b'-'))
    {
        ident_end += 1;
    }
    if ident_end == ident_start {
        return None;
    }
    let ident = &text[ident_start..ident_end];
    let kind = TokenKind::from_ident(ident)?;
    let exact_ident = ident == kind.as_str();

    let colon = skip_blanks(bytes, ident_end);
    if colon >= len || bytes[colon] != b':' {
        return None;
    }

    let payload_start = colon + 1;
    let mut payload_end = payload_start;
    while payload_end < len && !matches!(bytes[payload_end], b']' | b'[' | b'\n') {
        payload_end += 1;
    }
    if payload_end >= len || bytes[payload_end] != b']' {
        return None;
    }

    let mut closing = 1;
    let mut tight_close = true;
    let mut end = payload_end + 1;
    let second = skip_blanks(bytes, end);
    if second < len && bytes[second] == b']' {
        closing = 2;
        tight_close = second == end;
        end = second + 1;
    }

    let canonical = opening == 2
        && closing == 2
        && tight_open
        && tight_close
        && exact_ident
        && ident_start == cursor
        && colon == ident_end;

    Some(Candidate {
        kind,
        payload: payload_start..payload_end,
        opening,
        closing,
        exact_ident,
        canonical,
        end,
    })
}

fn skip_blanks(bytes: &[u8], mut index: usize) -> usize {
    while index < bytes.len() && matches!(bytes[index], b' ' | b'\t') {
        index += 1;
    }
    index
}

fn at_line_end(text: &str, end: usize) -> bool {
    let rest = text[end..].trim_start_matches([' ', '\t']);
    rest.is_empty() || rest.starts_with(['\n', '\r'])
}

fn at_line_start(text: &str, start: usize) -> bool {
    let before = text[..start].trim_end_matches([' ', '\t']);
    before.is_empty() || before.ends_with('\n')
}
