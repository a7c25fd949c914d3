//! Acceptance rules for suggested follow-up questions.
//!
//! A follow-up is shown to the learner as a clickable question they could
//! ask next, so it must read as the learner speaking: first person, never
//! addressed to the learner. English and Spanish markers are recognized.

use regex::Regex;
use serde::Serialize;
use std::fmt;

pub const MIN_FOLLOW_UP_CHARS: usize = 15;
pub const MAX_FOLLOW_UP_CHARS: usize = 100;

const PLACEHOLDERS: &[&str] = &[
    "follow-up question",
    "follow up question",
    "your question here",
    "question here",
    "example question",
    "suggested question",
    "insert question here",
    "placeholder",
    "lorem ipsum",
    "pregunta de seguimiento",
    "tu pregunta aquí",
    "pregunta sugerida",
];

const SECOND_PERSON: &[&str] = &[
    r"\byou\b",
    r"\byour(s|self)?\b",
    r"\byou'(re|ll|d|ve)\b",
    r"\b(quieres|deseas|puedes|sabes|necesitas|prefieres)\b",
    r"\bte\s+gustar[ií]a\b",
    r"\bt[uú]\b",
    r"\btus\b",
    r"\busted(es)?\b",
];

const FIRST_PERSON: &[&str] = &[
    r"\bi\s+(want|need|would\s+like|wonder)\b",
    r"\bi'd\s+like\b",
    r"\b(show|teach|help|give)\s+me\b",
    r"\bexplain\s+(to\s+)?me\b",
    r"\bhow\s+(can|do|should|would)\s+i\b",
    r"\b(can|could|should)\s+i\b",
    r"\blet\s+me\b",
    r"\b(quiero|necesito|mu[eé]strame|expl[ií]came|ay[uú]dame|ens[eé][ñn]ame|dame)\b",
    r"\bc[oó]mo\s+(puedo|hago|podr[ií]a)\b",
    r"\bme\s+gustar[ií]a\b",
    r"\bpuedo\b",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FollowUpRejection {
    TooShort { chars: usize },
    TooLong { chars: usize },
    Placeholder,
    SecondPerson,
    MissingFirstPerson,
}

impl fmt::Display for FollowUpRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FollowUpRejection::TooShort { chars } => {
                write!(f, "too short ({chars} < {MIN_FOLLOW_UP_CHARS} chars)")
            }
            FollowUpRejection::TooLong { chars } => {
                write!(f, "too long ({chars} > {MAX_FOLLOW_UP_CHARS} chars)")
            }
            FollowUpRejection::Placeholder => f.write_str("placeholder text"),
            FollowUpRejection::SecondPerson => f.write_str("addressed to the learner"),
            FollowUpRejection::MissingFirstPerson => f.write_str("not phrased in first person"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FollowUpRules {
    second_person: Vec<Regex>,
    first_person: Vec<Regex>,
}

impl FollowUpRules {
    pub fn new() -> Self {
        Self {
            second_person: compile(SECOND_PERSON),
            first_person: compile(FIRST_PERSON),
        }
    }

    /// Check `text` against length, placeholder and person rules, in that
    /// order.
    pub fn check(&self, text: &str) -> Result<(), FollowUpRejection> {
        let trimmed = text.trim();
        let chars = trimmed.chars().count();
        if chars < MIN_FOLLOW_UP_CHARS {
            return Err(FollowUpRejection::TooShort { chars });
        }
        if chars > MAX_FOLLOW_UP_CHARS {
            return Err(FollowUpRejection::TooLong { chars });
        }
        if is_placeholder(trimmed) {
            return Err(FollowUpRejection::Placeholder);
        }
        if self.second_person.iter().any(|re| re.is_match(trimmed)) {
            return Err(FollowUpRejection::SecondPerson);
        }
        if !self.first_person.iter().any(|re| re.is_match(trimmed)) {
            return Err(FollowUpRejection::MissingFirstPerson);
        }
        Ok(())
    }

    #[cfg(test)]
    fn pattern_count(&self) -> usize {
        self.second_person.len() + self.first_person.len()
    }
}

impl Default for FollowUpRules {
    fn default() -> Self {
        Self::new()
    }
}

fn compile(patterns: &[&str]) -> Vec<Regex> {
    let compiled: Vec<Regex> = patterns
        .iter()
        .filter_map(|pattern| Regex::new(&format!("(?i){pattern}")).ok())
        .collect();
    debug_assert_eq!(compiled.len(), patterns.len(), "invalid follow-up pattern");
    compiled
}

fn is_placeholder(text: &str) -> bool {
    let normalized = text
        .trim_matches(|c: char| c.is_ascii_punctuation() || c.is_whitespace())
        .to_lowercase();
    PLACEHOLDERS
        .iter()
        .any(|placeholder| normalized == *placeholder || normalized.starts_with("lorem ipsum"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_pattern_compiles() {
        assert_eq!(
            FollowUpRules::new().pattern_count(),
            SECOND_PERSON.len() + FIRST_PERSON.len()
        );
    }

    #[test]
    fn test_accepts_first_person_questions() {
        let rules = FollowUpRules::new();
        for text in [
            "I want to understand this concept better now",
            "Show me an example of cellular respiration",
            "How can I calculate the area of a circle?",
            "Quiero ver un ejemplo de fotosíntesis",
            "¿Cómo puedo resolver ecuaciones cuadráticas?",
        ] {
            assert_eq!(rules.check(text), Ok(()), "{text}");
        }
    }

    #[test]
    fn test_rejections() {
        let rules = FollowUpRules::new();
        let cases = [
            ("Want to see more?", FollowUpRejection::MissingFirstPerson),
            ("Do you want to see another example?", FollowUpRejection::SecondPerson),
            ("Would you like me to explain more?", FollowUpRejection::SecondPerson),
            ("¿Quieres ver otro ejemplo de esto?", FollowUpRejection::SecondPerson),
            ("Photosynthesis in desert plants", FollowUpRejection::MissingFirstPerson),
            ("Your question here.", FollowUpRejection::Placeholder),
        ];
        for (text, expected) in cases {
            assert_eq!(rules.check(text), Err(expected), "{text}");
        }
    }

    #[test]
    fn test_length_limits() {
        let rules = FollowUpRules::new();
        assert_eq!(
            rules.check("Show me more"),
            Err(FollowUpRejection::TooShort { chars: 12 })
        );
        let long = format!("I want {}", "a".repeat(100));
        assert_eq!(
            rules.check(&long),
            Err(FollowUpRejection::TooLong { chars: 107 })
        );
    }
}
