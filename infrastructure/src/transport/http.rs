//! Streaming chat-completions transport over reqwest.
//!
//! Only the request and the raw body stream live here. Deadlines, failover
//! and frame decoding belong to the dispatcher, so the client has no
//! overall request timeout (it would cut long replies short).

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;
use tutor_application::{ByteStream, ChatRequest, ChatTransport, TransportError};
use tutor_domain::util::preview;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_ERROR_MESSAGE_CHARS: usize = 200;

/// POSTs to a chat-completions endpoint with a bearer credential.
pub struct HttpChatTransport {
    client: Client,
    endpoint: String,
}

impl HttpChatTransport {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, TransportError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Ok(Self::with_client(client, endpoint))
    }

    pub fn with_client(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ChatTransport for HttpChatTransport {
    async fn open_stream(
        &self,
        credential: &str,
        request: &ChatRequest,
    ) -> Result<ByteStream, TransportError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(credential)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .json(request)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = error_message(&body);
            debug!("Upstream rejected request: {} {}", status.as_u16(), message);
            return Err(TransportError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response
            .bytes_stream()
            .map(|chunk| {
                chunk
                    .map(|bytes| bytes.to_vec())
                    .map_err(map_reqwest_error)
            })
            .boxed())
    }
}

fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Network(err.to_string())
    }
}

/// Short description of an error body. Prefers the provider's
/// `{"error": {"message": ...}}` shape.
fn error_message(body: &str) -> String {
    let from_json = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            let error = value.get("error")?;
            error
                .get("message")
                .and_then(|m| m.as_str())
                .or_else(|| error.as_str())
                .map(str::to_string)
        });
    let message = from_json.unwrap_or_else(|| body.trim().to_string());
    if message.is_empty() {
        "no error body".to_string()
    } else {
        preview(&message, MAX_ERROR_MESSAGE_CHARS)
    }
}
