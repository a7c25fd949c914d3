//! Chat session use case.
//!
//! A [`ChatSession`] runs one learner-facing conversation: it screens input,
//! assembles the request, drives the response state machine while the reply
//! streams, and recomputes the validated actions from the whole buffer on
//! every update.
//!
//! Every turn ends in a [`TurnOutcome`]. Failures never surface as errors:
//! an exhausted pool or an interrupted stream becomes one friendly
//! assistant message and the partial reply is discarded.

use crate::config::AssistantParams;
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::progress::TurnProgress;
use crate::use_cases::dispatch::{DispatchError, StreamDispatcher};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tutor_domain::util::preview;
use tutor_domain::{
    ActionValidator, CANNED_REPLY, Catalog, Conversation, CredentialPool, GuardVerdict,
    InjectionGuard, Message, PromptTemplate, Rejection, ResponseState, ResponseStateMachine,
    StreamPhase, ValidatedActions, ValidationReport, extract,
};

/// Shown when no reply could be produced.
pub const UNAVAILABLE_MESSAGE: &str =
    "The study assistant is temporarily unavailable. Please try again in a few minutes.";

/// How a turn ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnKind {
    /// The provider produced a reply.
    Answered,
    /// The injection guard refused the input; a canned reply was shown.
    Blocked,
    /// Dispatch failed; the unavailability message was shown.
    Unavailable,
    /// The turn was cancelled before it completed.
    Cancelled,
    /// Another exchange was in flight; nothing was sent.
    Busy,
    /// Empty input; nothing happened.
    Ignored,
}

/// Result of one call to [`ChatSession::send`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnOutcome {
    pub kind: TurnKind,
    /// Reply text with command tokens stripped.
    pub display_text: String,
    pub actions: ValidatedActions,
    /// Actions withheld from the learner, for diagnostics.
    pub rejections: Vec<Rejection>,
    pub state: ResponseState,
}

pub struct ChatSession {
    dispatcher: Arc<StreamDispatcher>,
    catalog: Arc<Catalog>,
    params: AssistantParams,
    guard: InjectionGuard,
    validator: ActionValidator,
    conversation: Conversation,
    system_prompt: String,
    machine: ResponseStateMachine,
    last_actions: ValidatedActions,
    shutdown: CancellationToken,
    conversation_logger: Arc<dyn ConversationLogger>,
}

impl ChatSession {
    pub fn new(
        dispatcher: Arc<StreamDispatcher>,
        catalog: Arc<Catalog>,
        params: AssistantParams,
        context_id: impl Into<String>,
    ) -> Self {
        let context_id = context_id.into();
        let system_prompt = PromptTemplate::system(&params.site_name, &context_id, &catalog);
        Self {
            dispatcher,
            catalog,
            machine: ResponseStateMachine::new(params.display_delay),
            params,
            guard: InjectionGuard::new(),
            validator: ActionValidator::new(),
            conversation: Conversation::new(context_id),
            system_prompt,
            last_actions: ValidatedActions::default(),
            shutdown: CancellationToken::new(),
            conversation_logger: Arc::new(NoConversationLogger),
        }
    }

    /// Create with a conversation logger.
    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    pub fn context_id(&self) -> &str {
        self.conversation.context_id()
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn state(&self) -> ResponseState {
        self.machine.state()
    }

    pub fn state_machine(&self) -> &ResponseStateMachine {
        &self.machine
    }

    /// Actions of the latest assistant turn.
    pub fn last_actions(&self) -> &ValidatedActions {
        &self.last_actions
    }

    pub fn pool_snapshot(&self) -> CredentialPool {
        self.dispatcher.pool_snapshot()
    }

    /// Parent of every turn's cancellation token. Cancelling it tears the
    /// session down: the running turn stops and later turns are cancelled
    /// immediately.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Tear the session down. See [`shutdown_token`](Self::shutdown_token).
    pub fn cancel(&self) {
        self.shutdown.cancel();
    }

    /// Move to another page. The conversation is replaced, not merged.
    /// Returns `false` if `context_id` is already current.
    pub fn switch_context(&mut self, context_id: impl Into<String>) -> bool {
        let context_id = context_id.into();
        if context_id == self.conversation.context_id() {
            return false;
        }
        info!(
            "Switching context: {} -> {}",
            self.conversation.context_id(),
            context_id
        );
        self.system_prompt =
            PromptTemplate::system(&self.params.site_name, &context_id, &self.catalog);
        self.conversation = Conversation::new(context_id);
        self.last_actions = ValidatedActions::default();
        true
    }

    /// Rebuild the credential pool from new keys.
    pub fn reconfigure<I, S>(&self, keys: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dispatcher.replace_pool(CredentialPool::new(keys));
    }

    /// Send one learner message and stream the reply.
    pub async fn send(&mut self, input: &str, progress: &dyn TurnProgress) -> TurnOutcome {
        let cancel = self.shutdown.child_token();
        self.send_with_cancel(input, progress, cancel).await
    }

    /// Like [`send`](Self::send), with a caller-owned cancellation token.
    pub async fn send_with_cancel(
        &mut self,
        input: &str,
        progress: &dyn TurnProgress,
        cancel: CancellationToken,
    ) -> TurnOutcome {
        let input = input.trim();
        if input.is_empty() {
            return self.outcome(TurnKind::Ignored, String::new(), ValidationReport::default());
        }

        info!("User message on {}: {}", self.context_id(), preview(input, 100));
        self.log_event(
            "user_message",
            json!({ "context": self.context_id(), "content": input }),
        );

        if let GuardVerdict::Blocked(kind) = self.guard.check(input) {
            warn!("Input blocked by injection guard: {}", kind.as_str());
            self.log_event("injection_blocked", json!({ "kind": kind.as_str() }));
            self.conversation.push_local(Message::user(input));
            self.conversation.push_local(Message::assistant(CANNED_REPLY));
            return self.finish_reply(TurnKind::Blocked, CANNED_REPLY, progress);
        }

        if self.dispatcher.is_busy() {
            warn!("Another exchange is in flight; message not sent");
            return self.outcome(TurnKind::Busy, String::new(), ValidationReport::default());
        }

        self.conversation.push(Message::user(input));
        let messages = self
            .conversation
            .assemble(&self.system_prompt, self.params.history_limit);
        debug!("Assembled {} message(s) for dispatch", messages.len());

        track(&mut self.machine, progress, true, 0);

        let dispatcher = Arc::clone(&self.dispatcher);
        let catalog = Arc::clone(&self.catalog);
        let machine = &mut self.machine;
        let validator = &self.validator;
        let result = dispatcher
            .dispatch(messages, &cancel, progress, |content| {
                track(machine, progress, true, content.chars().count());
                let extraction = extract(content, &catalog, StreamPhase::Streaming);
                let report = validator.validate(&extraction.actions, &catalog);
                progress.on_display_update(&extraction.display, &report.actions);
            })
            .await;

        match result {
            Ok(outcome) => {
                track(
                    &mut self.machine,
                    progress,
                    false,
                    outcome.content.chars().count(),
                );
                self.conversation.push(Message::assistant(&outcome.content));
                self.log_event(
                    "assistant_message",
                    json!({
                        "content": outcome.content,
                        "credential": outcome.credential_index,
                        "requests": outcome.requests,
                        "malformed_frames": outcome.malformed_frames,
                    }),
                );
                self.finish_reply(TurnKind::Answered, &outcome.content, progress)
            }
            Err(DispatchError::Cancelled) => {
                track(&mut self.machine, progress, false, 0);
                info!("Turn cancelled");
                self.outcome(TurnKind::Cancelled, String::new(), ValidationReport::default())
            }
            Err(DispatchError::Busy) => {
                // Lost the race for the in-flight slot after the turn opened.
                track(&mut self.machine, progress, false, 0);
                self.conversation.pop();
                self.outcome(TurnKind::Busy, String::new(), ValidationReport::default())
            }
            Err(err) => {
                // Partial text is discarded: the machine ends as if nothing arrived.
                track(&mut self.machine, progress, false, 0);
                warn!("Turn failed: {}", err);
                self.conversation
                    .push_local(Message::assistant(UNAVAILABLE_MESSAGE));
                self.last_actions = ValidatedActions::default();
                progress.on_display_update(UNAVAILABLE_MESSAGE, &self.last_actions);
                self.outcome(
                    TurnKind::Unavailable,
                    UNAVAILABLE_MESSAGE.to_string(),
                    ValidationReport::default(),
                )
            }
        }
    }

    /// Wait out the completion display delay, then settle to `Idle`.
    pub async fn settle(&mut self, progress: &dyn TurnProgress) -> ResponseState {
        if let Some(deadline) = self.machine.settle_deadline() {
            tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await;
        }
        let before = self.machine.state();
        let after = self.machine.tick(Instant::now());
        if after != before {
            progress.on_state_change(after);
        }
        after
    }

    /// Extract, validate and record the actions of a final reply.
    fn finish_reply(
        &mut self,
        kind: TurnKind,
        content: &str,
        progress: &dyn TurnProgress,
    ) -> TurnOutcome {
        let extraction = extract(content, &self.catalog, StreamPhase::Complete);
        let report = self.validator.validate(&extraction.actions, &self.catalog);

        for rejection in &report.rejections {
            match rejection {
                Rejection::Navigate { path, suggestions } => {
                    let nearest: Vec<&str> = suggestions.iter().map(|s| s.route.as_str()).collect();
                    warn!(
                        "Blocked navigation to unknown route {} (nearest: {:?})",
                        path, nearest
                    );
                }
                Rejection::FollowUp { text, reason } => {
                    debug!("Dropped follow-up {:?}: {}", preview(text, 60), reason);
                }
            }
            self.log_event(
                "action_blocked",
                serde_json::to_value(rejection).unwrap_or_default(),
            );
        }

        self.last_actions = report.actions.clone();
        progress.on_display_update(&extraction.display, &report.actions);
        self.outcome(kind, extraction.display, report)
    }

    fn outcome(&self, kind: TurnKind, display_text: String, report: ValidationReport) -> TurnOutcome {
        TurnOutcome {
            kind,
            display_text,
            actions: report.actions,
            rejections: report.rejections,
            state: self.machine.state(),
        }
    }

    fn log_event(&self, event_type: &'static str, payload: serde_json::Value) {
        self.conversation_logger
            .log(ConversationEvent::new(event_type, payload));
    }
}

/// Feed the state machine and notify on change.
fn track(
    machine: &mut ResponseStateMachine,
    progress: &dyn TurnProgress,
    loading: bool,
    content_len: usize,
) {
    let before = machine.state();
    let after = machine.observe(loading, content_len, Instant::now());
    if after != before {
        debug!("Response state {} -> {}", before, after);
        progress.on_state_change(after);
    }
}
