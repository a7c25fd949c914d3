//! HTTP adapter for the [`ChatTransport`](tutor_application::ChatTransport) port.

mod http;

pub use http::HttpChatTransport;
