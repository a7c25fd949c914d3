//! Chat transport port
//!
//! Defines how the dispatcher opens a streaming chat completion. The
//! transport only moves bytes: it does not parse frames, retry, or pick
//! credentials. Those decisions stay in
//! [`StreamDispatcher`](crate::use_cases::dispatch::StreamDispatcher).

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::Serialize;
use thiserror::Error;
use tutor_domain::{CredentialOutcome, Message};

/// Errors reported by a transport
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Provider rejected the request with HTTP {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout")]
    Timeout,
}

impl TransportError {
    /// How this failure affects the credential that produced it.
    ///
    /// | Error                   | Outcome        |
    /// |-------------------------|----------------|
    /// | HTTP 401, 403           | `AuthFailure`  |
    /// | HTTP 429                | `RateLimited`  |
    /// | any other HTTP status   | `ServerError`  |
    /// | network error, timeout  | `NetworkError` |
    pub fn outcome(&self) -> CredentialOutcome {
        match self {
            TransportError::Rejected { status: 401 | 403, .. } => CredentialOutcome::AuthFailure,
            TransportError::Rejected { status: 429, .. } => CredentialOutcome::RateLimited,
            TransportError::Rejected { .. } => CredentialOutcome::ServerError,
            TransportError::Network(_) | TransportError::Timeout => {
                CredentialOutcome::NetworkError
            }
        }
    }
}

/// Body of a streaming chat completion request (OpenAI-compatible)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub stream: bool,
}

impl ChatRequest {
    pub fn streaming(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            stream: true,
        }
    }
}

/// Raw body chunks of a successful (2xx) response.
pub type ByteStream = BoxStream<'static, Result<Vec<u8>, TransportError>>;

/// Opens streaming chat completions against the provider.
///
/// Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send `request` authenticated with `credential`.
    ///
    /// Resolves once the response headers arrive. A non-2xx status must be
    /// reported as [`TransportError::Rejected`]; the returned stream only
    /// ever carries a successful body.
    async fn open_stream(
        &self,
        credential: &str,
        request: &ChatRequest,
    ) -> Result<ByteStream, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejected(status: u16) -> TransportError {
        TransportError::Rejected {
            status,
            message: String::new(),
        }
    }

    #[test]
    fn test_outcome_classification() {
        assert_eq!(rejected(401).outcome(), CredentialOutcome::AuthFailure);
        assert_eq!(rejected(403).outcome(), CredentialOutcome::AuthFailure);
        assert_eq!(rejected(429).outcome(), CredentialOutcome::RateLimited);
        assert_eq!(rejected(500).outcome(), CredentialOutcome::ServerError);
        assert_eq!(rejected(400).outcome(), CredentialOutcome::ServerError);
        assert_eq!(
            TransportError::Network("reset".into()).outcome(),
            CredentialOutcome::NetworkError
        );
        assert_eq!(TransportError::Timeout.outcome(), CredentialOutcome::NetworkError);
    }

    #[test]
    fn test_request_serializes_openai_shape() {
        let request = ChatRequest::streaming("m", vec![Message::user("hi")]);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["stream"], true);
        assert_eq!(json["messages"][0]["role"], "user");
    }
}
