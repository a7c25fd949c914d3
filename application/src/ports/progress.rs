//! Progress notification port
//!
//! Defines the interface for reporting the progress of one chat turn.

use tutor_domain::{ResponseState, ValidatedActions};

/// Callback for progress updates during a chat turn
///
/// Implementations live in the presentation layer and can display progress
/// in various ways (spinner, streamed text, etc.). Every method has a no-op
/// default.
pub trait TurnProgress: Send + Sync {
    /// Called whenever the response state machine changes state.
    fn on_state_change(&self, _state: ResponseState) {}

    /// Called after every streamed frame with the full display text so far
    /// and the actions currently valid in it.
    fn on_display_update(&self, _display: &str, _actions: &ValidatedActions) {}

    /// Called when a request is opened with a credential.
    fn on_attempt(&self, _attempt: u32, _credential_index: usize) {}

    /// Called when no credential is eligible and the dispatcher backs off.
    fn on_backoff(&self, _wait: std::time::Duration) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoTurnProgress;

impl TurnProgress for NoTurnProgress {}
