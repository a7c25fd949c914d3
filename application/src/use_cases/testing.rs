//! Scripted transport shared by use case tests.

use crate::ports::chat_transport::{ByteStream, ChatRequest, ChatTransport, TransportError};
use async_trait::async_trait;
use futures::StreamExt;
use futures::stream;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Mutex;

/// Behavior of every request made with one credential.
#[derive(Clone)]
pub(crate) enum Script {
    /// Non-2xx status before any body.
    Reject(u16),
    /// 2xx with these body chunks.
    Body(Vec<Vec<u8>>),
    /// 2xx with these chunks, then a transport error.
    BodyThenError(Vec<Vec<u8>>, TransportError),
    /// Headers never arrive.
    NoHeaders,
    /// 2xx, but the body never produces a chunk.
    SilentBody,
}

#[derive(Default)]
pub(crate) struct ScriptedTransport {
    scripts: HashMap<String, Script>,
    calls: Mutex<Vec<String>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with(mut self, credential: &str, script: Script) -> Self {
        self.scripts.insert(credential.to_string(), script);
        self
    }

    /// Credentials used, in request order.
    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatTransport for ScriptedTransport {
    async fn open_stream(
        &self,
        credential: &str,
        request: &ChatRequest,
    ) -> Result<ByteStream, TransportError> {
        self.calls.lock().unwrap().push(credential.to_string());
        self.requests.lock().unwrap().push(request.clone());

        match self.scripts.get(credential).cloned() {
            Some(Script::Reject(status)) => Err(TransportError::Rejected {
                status,
                message: "scripted rejection".to_string(),
            }),
            Some(Script::Body(chunks)) => Ok(stream::iter(chunks.into_iter().map(Ok)).boxed()),
            Some(Script::BodyThenError(chunks, err)) => Ok(stream::iter(chunks.into_iter().map(Ok))
                .chain(stream::once(async move { Err(err) }))
                .boxed()),
            Some(Script::NoHeaders) => futures::future::pending().await,
            Some(Script::SilentBody) => Ok(stream::pending().boxed()),
            None => Err(TransportError::Network("unscripted credential".to_string())),
        }
    }
}

/// SSE body: one `data:` line per delta, then `[DONE]`. One chunk per line.
pub(crate) fn sse(deltas: &[&str]) -> Vec<Vec<u8>> {
    deltas
        .iter()
        .map(|delta| {
            let frame = json!({ "choices": [{ "delta": { "content": delta } }] });
            format!("data: {frame}\n\n").into_bytes()
        })
        .chain(std::iter::once(b"data: [DONE]\n\n".to_vec()))
        .collect()
}
