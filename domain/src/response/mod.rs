//! Presentation state of the assistant's reply.

pub mod state;

pub use state::{
    DEFAULT_DISPLAY_DELAY, HISTORY_CAPACITY, ResponseEvent, ResponseState, ResponseStateMachine,
    STREAMING_THRESHOLD, TransitionRecord, transition,
};
