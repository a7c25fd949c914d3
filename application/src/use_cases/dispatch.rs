//! Stream dispatch with credential failover.
//!
//! [`StreamDispatcher`] turns one assembled conversation into one streamed
//! reply. It owns the [`CredentialPool`] and is the only code that reports
//! outcomes to it.
//!
//! # Failover rules
//!
//! - A request that fails before the first body byte (rejected status,
//!   connection error, header timeout, idle timeout on the first chunk)
//!   reports the failure for its credential and retries with the next
//!   eligible one.
//! - Once any body byte has arrived the reply is committed to that
//!   credential. A drop after that point fails the dispatch with
//!   [`DispatchError::StreamInterrupted`]; partial text is discarded by the
//!   caller and no other credential is tried.
//! - While no credential is eligible the dispatcher backs off
//!   exponentially, bounded by a wait count and a deadline.
//!
//! Only one dispatch may run at a time per dispatcher; a concurrent call
//! fails fast with [`DispatchError::Busy`].

use crate::config::DispatchParams;
use crate::ports::chat_transport::{ByteStream, ChatRequest, ChatTransport, TransportError};
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::progress::TurnProgress;
use futures::StreamExt;
use serde_json::json;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tutor_domain::session::frame::{Frame, FrameDecoder, parse_frame};
use tutor_domain::util::preview;
use tutor_domain::{CredentialOutcome, CredentialPool, Message, sanitize};

/// Errors that end a dispatch
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("No usable credential after {requests} request(s)")]
    CredentialExhausted { requests: u32 },

    #[error("Stream interrupted after the reply started: {0}")]
    StreamInterrupted(TransportError),

    #[error("Dispatch cancelled")]
    Cancelled,

    #[error("Another exchange is already in flight")]
    Busy,
}

/// A completed reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Sanitized reply text. Command tokens are still embedded.
    pub content: String,
    /// Pool index of the credential that served the reply.
    pub credential_index: usize,
    /// Requests opened, including failed ones.
    pub requests: u32,
    /// Frames that could not be parsed and were skipped.
    pub malformed_frames: usize,
}

enum Attempt {
    Completed { content: String, malformed: usize },
    /// Failed before any body byte: fail over.
    Failed(TransportError),
    /// Failed after the body started: give up.
    Interrupted(TransportError),
    Cancelled,
}

pub struct StreamDispatcher {
    transport: Arc<dyn ChatTransport>,
    pool: Mutex<CredentialPool>,
    params: DispatchParams,
    in_flight: tokio::sync::Mutex<()>,
    conversation_logger: Arc<dyn ConversationLogger>,
}

impl StreamDispatcher {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        pool: CredentialPool,
        params: DispatchParams,
    ) -> Self {
        Self {
            transport,
            pool: Mutex::new(pool),
            params,
            in_flight: tokio::sync::Mutex::new(()),
            conversation_logger: Arc::new(NoConversationLogger),
        }
    }

    /// Create with a conversation logger.
    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    pub fn params(&self) -> &DispatchParams {
        &self.params
    }

    /// Copy of the pool state, for diagnostics.
    pub fn pool_snapshot(&self) -> CredentialPool {
        self.lock_pool().clone()
    }

    /// Discard the pool and start over with `pool` (after a config change).
    pub fn replace_pool(&self, pool: CredentialPool) {
        info!("Credential pool rebuilt with {} credential(s)", pool.len());
        *self.lock_pool() = pool;
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.try_lock().is_err()
    }

    /// Stream a reply to `messages`.
    ///
    /// `on_content` receives the sanitized accumulated text after every body
    /// chunk that added content.
    pub async fn dispatch<F>(
        &self,
        messages: Vec<Message>,
        cancel: &CancellationToken,
        progress: &dyn TurnProgress,
        mut on_content: F,
    ) -> Result<DispatchOutcome, DispatchError>
    where
        F: FnMut(&str),
    {
        let Ok(_in_flight) = self.in_flight.try_lock() else {
            warn!("Dispatch rejected: another exchange is in flight");
            return Err(DispatchError::Busy);
        };

        let request = ChatRequest::streaming(&self.params.model, messages);
        let mut requests = 0;

        loop {
            if requests >= self.params.max_request_attempts {
                return Err(self.exhausted(requests));
            }

            let (index, key) = self.acquire_credential(cancel, progress, requests).await?;
            requests += 1;

            info!(
                "Dispatch attempt {}/{} with credential #{}",
                requests, self.params.max_request_attempts, index
            );
            progress.on_attempt(requests, index);
            self.log_event(
                "dispatch_attempt",
                json!({ "attempt": requests, "credential": index, "model": self.params.model }),
            );

            match self.attempt(&key, &request, cancel, &mut on_content).await {
                Attempt::Completed { content, malformed } => {
                    self.report(index, CredentialOutcome::Success);
                    debug!(
                        "Dispatch completed: {} chars, {} malformed frame(s) skipped",
                        content.chars().count(),
                        malformed
                    );
                    return Ok(DispatchOutcome {
                        content,
                        credential_index: index,
                        requests,
                        malformed_frames: malformed,
                    });
                }
                Attempt::Failed(err) => {
                    warn!("Credential #{} failed before streaming: {}", index, err);
                    self.report(index, err.outcome());
                }
                Attempt::Interrupted(err) => {
                    warn!("Stream from credential #{} interrupted: {}", index, err);
                    self.report(index, CredentialOutcome::NetworkError);
                    self.log_event(
                        "dispatch_failed",
                        json!({ "reason": "stream_interrupted", "requests": requests }),
                    );
                    return Err(DispatchError::StreamInterrupted(err));
                }
                Attempt::Cancelled => {
                    info!("Dispatch cancelled during attempt {}", requests);
                    return Err(DispatchError::Cancelled);
                }
            }
        }
    }

    /// Select an eligible credential, backing off while none is.
    async fn acquire_credential(
        &self,
        cancel: &CancellationToken,
        progress: &dyn TurnProgress,
        requests: u32,
    ) -> Result<(usize, String), DispatchError> {
        let deadline = Instant::now() + self.params.selection_deadline;
        let mut waits = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(DispatchError::Cancelled);
            }

            let (selected, hopeless) = {
                let pool = self.lock_pool();
                let selected = pool.select_next().and_then(|index| {
                    pool.credential(index)
                        .map(|credential| (index, credential.key().to_string()))
                });
                (selected, pool.all_invalid())
            };
            if let Some(selection) = selected {
                return Ok(selection);
            }
            if hopeless {
                warn!("No valid credential configured");
                return Err(self.exhausted(requests));
            }

            let now = Instant::now();
            if waits >= self.params.max_selection_waits || now >= deadline {
                return Err(self.exhausted(requests));
            }
            let delay = self.params.backoff_for(waits).min(deadline - now);
            waits += 1;
            debug!(
                "All credentials cooling down, backing off {:?} (wait {}/{})",
                delay, waits, self.params.max_selection_waits
            );
            progress.on_backoff(delay);

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(DispatchError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    async fn attempt<F>(
        &self,
        key: &str,
        request: &ChatRequest,
        cancel: &CancellationToken,
        on_content: &mut F,
    ) -> Attempt
    where
        F: FnMut(&str),
    {
        let opened = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Attempt::Cancelled,
            opened = tokio::time::timeout(
                self.params.request_timeout,
                self.transport.open_stream(key, request),
            ) => opened,
        };
        let stream = match opened {
            Ok(Ok(stream)) => stream,
            Ok(Err(err)) => return Attempt::Failed(err),
            Err(_) => return Attempt::Failed(TransportError::Timeout),
        };

        self.consume(stream, cancel, on_content).await
    }

    async fn consume<F>(
        &self,
        mut stream: ByteStream,
        cancel: &CancellationToken,
        on_content: &mut F,
    ) -> Attempt
    where
        F: FnMut(&str),
    {
        let mut decoder = FrameDecoder::new();
        let mut raw = String::new();
        let mut malformed = 0;
        let mut started = false;

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Attempt::Cancelled,
                next = tokio::time::timeout(self.params.idle_timeout, stream.next()) => next,
            };
            let chunk = match next {
                Ok(Some(Ok(chunk))) => chunk,
                Ok(None) => break,
                Ok(Some(Err(err))) => return body_failure(started, err),
                Err(_) => return body_failure(started, TransportError::Timeout),
            };
            if chunk.is_empty() {
                continue;
            }
            started = true;

            let mut appended = false;
            let mut done = false;
            for line in decoder.push(&chunk) {
                match parse_frame(&line) {
                    Frame::Delta(text) => {
                        raw.push_str(&text);
                        appended = true;
                    }
                    Frame::Done => {
                        done = true;
                        break;
                    }
                    Frame::Ignored => {}
                    Frame::Malformed(reason) => {
                        malformed += 1;
                        warn!("Skipping malformed frame ({}): {}", reason, preview(&line, 80));
                    }
                }
            }
            if appended {
                on_content(&sanitize(&raw));
            }
            if done {
                return Attempt::Completed {
                    content: sanitize(&raw),
                    malformed,
                };
            }
        }

        if !started {
            return Attempt::Failed(TransportError::Network("empty response body".to_string()));
        }
        if let Some(line) = decoder.finish() {
            match parse_frame(&line) {
                Frame::Delta(text) => {
                    raw.push_str(&text);
                    on_content(&sanitize(&raw));
                }
                Frame::Malformed(reason) => {
                    malformed += 1;
                    warn!("Skipping malformed trailing frame ({})", reason);
                }
                Frame::Done | Frame::Ignored => {}
            }
        }

        Attempt::Completed {
            content: sanitize(&raw),
            malformed,
        }
    }

    fn report(&self, index: usize, outcome: CredentialOutcome) {
        self.lock_pool().report_outcome(index, outcome);
        debug!("Credential #{} outcome: {}", index, outcome);
        self.log_event(
            "credential_outcome",
            json!({ "credential": index, "outcome": outcome.as_str() }),
        );
    }

    fn exhausted(&self, requests: u32) -> DispatchError {
        warn!("Credential pool exhausted after {} request(s)", requests);
        self.log_event(
            "dispatch_failed",
            json!({ "reason": "credential_exhausted", "requests": requests }),
        );
        DispatchError::CredentialExhausted { requests }
    }

    fn log_event(&self, event_type: &'static str, payload: serde_json::Value) {
        self.conversation_logger
            .log(ConversationEvent::new(event_type, payload));
    }

    // The pool holds no invariant a panic mid-update could break.
    fn lock_pool(&self) -> MutexGuard<'_, CredentialPool> {
        self.pool.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn body_failure(started: bool, err: TransportError) -> Attempt {
    if started {
        Attempt::Interrupted(err)
    } else {
        Attempt::Failed(err)
    }
}
