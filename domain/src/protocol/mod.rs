//! Embedded command protocol.
//!
//! Assistant replies may carry commands inline as `[[IDENT:payload]]`, with
//! `IDENT` one of `NAVIGATE`, `TOPIC`, `FOLLOW_UP` or `FORMULA` and a payload
//! that never contains `]`. Processing runs in distinct stages:
//!
//! 1. [`repair`] normalizes the malformed bracket shapes models produce.
//! 2. [`tokenize`] finds the well-formed tokens.
//! 3. [`strip`] removes them from the display text. While the reply is
//!    still [`StreamPhase::Streaming`], a half-written token at the end is
//!    hidden as well.
//! 4. [`parse_token`] turns each token into a typed [`ParsedAction`].
//!
//! [`extract`] runs all of them on a buffer snapshot. It is cheap enough to
//! rerun on the whole buffer on every streamed frame, which keeps tokens
//! that straddle chunk boundaries correct without incremental state.
//!
//! [`ParsedAction`]: crate::action::ParsedAction

pub mod parse;
pub mod repair;
pub mod token;

pub use parse::{DEFAULT_NAVIGATE_ICON, DEFAULT_NAVIGATE_PATH, parse_token};
pub use repair::repair;
pub use token::{ActionToken, StreamPhase, TokenKind, strip, tokenize};

use crate::action::ParsedAction;
use crate::catalog::Catalog;

/// Display text and actions derived from one buffer snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub display: String,
    pub actions: Vec<ParsedAction>,
}

/// Repair, tokenize, strip and parse `text`.
///
/// # Examples
///
/// ```
/// use tutor_domain::catalog::Catalog;
/// use tutor_domain::protocol::{StreamPhase, extract};
///
/// let catalog = Catalog::default();
/// let extraction = extract(
///     "Start here. [NAVIGATE:Home|/|house]",
///     &catalog,
///     StreamPhase::Complete,
/// );
///
/// assert_eq!(extraction.display, "Start here.");
/// assert_eq!(extraction.actions.len(), 1);
/// ```
pub fn extract(text: &str, catalog: &Catalog, phase: StreamPhase) -> Extraction {
    let repaired = repair(text);
    let tokens = tokenize(&repaired);
    let actions = tokens
        .iter()
        .filter_map(|token| parse_token(token, catalog))
        .collect();
    Extraction {
        display: strip(&repaired, &tokens, phase),
        actions,
    }
}
