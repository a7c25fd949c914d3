//! Response state machine: `Idle → Thinking → Streaming → Completed → Idle`.
//!
//! The machine drives what the UI shows while a reply is produced: a
//! "thinking" indicator until enough sanitized text has arrived, the live
//! text while it streams, and a short settle period once it completes.
//!
//! [`transition`] is pure. [`ResponseStateMachine`] wraps it with the clock
//! bookkeeping (display delay, transition history).

use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

/// Sanitized characters needed before `Thinking` gives way to `Streaming`.
pub const STREAMING_THRESHOLD: usize = 5;

/// How long `Completed` lingers before returning to `Idle`.
pub const DEFAULT_DISPLAY_DELAY: Duration = Duration::from_millis(500);

/// Transition records kept for diagnostics.
pub const HISTORY_CAPACITY: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResponseState {
    #[default]
    Idle,
    Thinking,
    Streaming,
    Completed,
}

impl ResponseState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseState::Idle => "IDLE",
            ResponseState::Thinking => "THINKING",
            ResponseState::Streaming => "STREAMING",
            ResponseState::Completed => "COMPLETED",
        }
    }

    /// True while an exchange is open.
    pub fn is_active(&self) -> bool {
        matches!(self, ResponseState::Thinking | ResponseState::Streaming)
    }
}

impl fmt::Display for ResponseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseEvent {
    /// A new exchange started (loading became true).
    TurnOpened,
    /// The sanitized content grew to `content_len` characters.
    ContentUpdated { content_len: usize },
    /// The exchange ended (loading became false).
    StreamEnded { content_len: usize },
    /// The completion display delay expired.
    DisplayDelayElapsed,
}

impl ResponseEvent {
    fn name(&self) -> &'static str {
        match self {
            ResponseEvent::TurnOpened => "turn_opened",
            ResponseEvent::ContentUpdated { .. } => "content_updated",
            ResponseEvent::StreamEnded { .. } => "stream_ended",
            ResponseEvent::DisplayDelayElapsed => "display_delay_elapsed",
        }
    }
}

/// Pure transition function.
///
/// | From                  | Event                        | To          |
/// |-----------------------|------------------------------|-------------|
/// | `Idle`, `Completed`   | `TurnOpened`                 | `Thinking`  |
/// | `Thinking`            | `ContentUpdated` (len >= 5)  | `Streaming` |
/// | `Thinking`,`Streaming`| `StreamEnded` (len > 0)      | `Completed` |
/// | `Thinking`,`Streaming`| `StreamEnded` (len == 0)     | `Idle`      |
/// | `Completed`           | `DisplayDelayElapsed`        | `Idle`      |
///
/// Every other pair leaves the state unchanged.
pub fn transition(state: ResponseState, event: ResponseEvent) -> ResponseState {
    use ResponseEvent as E;
    use ResponseState as S;

    match (state, event) {
        (S::Idle | S::Completed, E::TurnOpened) => S::Thinking,
        (S::Thinking, E::ContentUpdated { content_len }) if content_len >= STREAMING_THRESHOLD => {
            S::Streaming
        }
        (S::Thinking | S::Streaming, E::StreamEnded { content_len }) => {
            if content_len > 0 {
                S::Completed
            } else {
                S::Idle
            }
        }
        (S::Completed, E::DisplayDelayElapsed) => S::Idle,
        (state, _) => state,
    }
}

/// One recorded state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionRecord {
    pub from: ResponseState,
    pub to: ResponseState,
    pub trigger: &'static str,
    pub content_len: usize,
    pub at: Instant,
}

/// Stateful wrapper around [`transition`].
#[derive(Debug, Clone)]
pub struct ResponseStateMachine {
    state: ResponseState,
    display_delay: Duration,
    completed_at: Option<Instant>,
    content_len: usize,
    history: VecDeque<TransitionRecord>,
}

impl ResponseStateMachine {
    pub fn new(display_delay: Duration) -> Self {
        Self {
            state: ResponseState::Idle,
            display_delay,
            completed_at: None,
            content_len: 0,
            history: VecDeque::with_capacity(HISTORY_CAPACITY),
        }
    }

    pub fn state(&self) -> ResponseState {
        self.state
    }

    pub fn display_delay(&self) -> Duration {
        self.display_delay
    }

    /// The thinking indicator is visible only before content streams.
    pub fn should_show_thinking(&self) -> bool {
        self.state == ResponseState::Thinking
    }

    /// Most recent transitions, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &TransitionRecord> {
        self.history.iter()
    }

    /// When `Completed` will fall back to `Idle`, if the machine is completed.
    pub fn settle_deadline(&self) -> Option<Instant> {
        match self.state {
            ResponseState::Completed => self.completed_at.map(|at| at + self.display_delay),
            _ => None,
        }
    }

    /// Apply `event` at `now` and return the resulting state.
    pub fn apply(&mut self, event: ResponseEvent, now: Instant) -> ResponseState {
        if let ResponseEvent::ContentUpdated { content_len }
        | ResponseEvent::StreamEnded { content_len } = event
        {
            self.content_len = content_len;
        }
        if event == ResponseEvent::TurnOpened {
            self.content_len = 0;
        }

        let next = transition(self.state, event);
        if next != self.state {
            self.record(next, event.name(), now);
            self.completed_at = (next == ResponseState::Completed).then_some(now);
            self.state = next;
        }
        self.state
    }

    /// Feed the two observable inputs of an exchange: whether a request is
    /// in flight and how much sanitized content has arrived.
    pub fn observe(&mut self, loading: bool, content_len: usize, now: Instant) -> ResponseState {
        if loading {
            if !self.state.is_active() {
                self.apply(ResponseEvent::TurnOpened, now);
            }
            self.apply(ResponseEvent::ContentUpdated { content_len }, now)
        } else if self.state.is_active() {
            self.apply(ResponseEvent::StreamEnded { content_len }, now)
        } else {
            self.tick(now)
        }
    }

    /// Advance timers. Moves `Completed → Idle` once the delay has elapsed.
    pub fn tick(&mut self, now: Instant) -> ResponseState {
        match self.settle_deadline() {
            Some(deadline) if now >= deadline => {
                self.apply(ResponseEvent::DisplayDelayElapsed, now)
            }
            _ => self.state,
        }
    }

    fn record(&mut self, to: ResponseState, trigger: &'static str, at: Instant) {
        if self.history.len() == HISTORY_CAPACITY {
            self.history.pop_front();
        }
        self.history.push_back(TransitionRecord {
            from: self.state,
            to,
            trigger,
            content_len: self.content_len,
            at,
        });
    }
}

impl Default for ResponseStateMachine {
    fn default() -> Self {
        Self::new(DEFAULT_DISPLAY_DELAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ResponseState::*;

    // ==================== Pure transitions ====================

    #[test]
    fn test_transition_table() {
        let cases = [
            (Idle, ResponseEvent::TurnOpened, Thinking),
            (Completed, ResponseEvent::TurnOpened, Thinking),
            (Thinking, ResponseEvent::ContentUpdated { content_len: 4 }, Thinking),
            (Thinking, ResponseEvent::ContentUpdated { content_len: 5 }, Streaming),
            (Streaming, ResponseEvent::ContentUpdated { content_len: 1 }, Streaming),
            (Streaming, ResponseEvent::StreamEnded { content_len: 9 }, Completed),
            (Thinking, ResponseEvent::StreamEnded { content_len: 3 }, Completed),
            (Thinking, ResponseEvent::StreamEnded { content_len: 0 }, Idle),
            (Completed, ResponseEvent::DisplayDelayElapsed, Idle),
            (Idle, ResponseEvent::DisplayDelayElapsed, Idle),
            (Idle, ResponseEvent::StreamEnded { content_len: 4 }, Idle),
            (Streaming, ResponseEvent::TurnOpened, Streaming),
        ];
        for (from, event, expected) in cases {
            assert_eq!(transition(from, event), expected, "{from} + {event:?}");
        }
    }

    // ==================== Machine ====================

    #[test]
    fn test_full_exchange_scenario() {
        let mut machine = ResponseStateMachine::new(Duration::from_millis(500));
        let t0 = Instant::now();

        assert_eq!(machine.observe(true, 0, t0), Thinking);
        assert!(machine.should_show_thinking());
        assert_eq!(machine.observe(true, 3, t0), Thinking);
        assert_eq!(machine.observe(true, 7, t0), Streaming);
        assert!(!machine.should_show_thinking());
        assert_eq!(machine.observe(false, 7, t0), Completed);

        assert_eq!(machine.tick(t0 + Duration::from_millis(499)), Completed);
        assert_eq!(machine.tick(t0 + Duration::from_millis(500)), Idle);
    }

    #[test]
    fn test_empty_exchange_falls_back_to_idle() {
        let mut machine = ResponseStateMachine::default();
        let now = Instant::now();
        machine.observe(true, 0, now);
        assert_eq!(machine.observe(false, 0, now), Idle);
        assert_eq!(machine.settle_deadline(), None);
    }

    #[test]
    fn test_new_turn_during_settle_reopens() {
        let mut machine = ResponseStateMachine::default();
        let now = Instant::now();
        machine.observe(true, 10, now);
        machine.observe(false, 10, now);
        assert_eq!(machine.observe(true, 0, now), Thinking);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut machine = ResponseStateMachine::new(Duration::ZERO);
        let now = Instant::now();
        for _ in 0..10 {
            machine.observe(true, 10, now);
            machine.observe(false, 10, now);
            machine.tick(now);
        }
        let history: Vec<_> = machine.history().collect();
        assert_eq!(history.len(), HISTORY_CAPACITY);
        assert_eq!(history.last().unwrap().to, Idle);
        assert_eq!(history.last().unwrap().trigger, "display_delay_elapsed");
    }

    #[test]
    fn test_history_records_content_len() {
        let mut machine = ResponseStateMachine::default();
        let now = Instant::now();
        machine.observe(true, 6, now);
        let record = machine.history().last().unwrap();
        assert_eq!((record.from, record.to, record.content_len), (Thinking, Streaming, 6));
    }
}
