//! Backend call surface.

pub mod http;

pub use http::HttpTransport;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::request::BackendRequest;

/// Raw body chunks of a streaming response.
pub type ByteStream = BoxStream<'static, Result<Bytes>>;

/// Framing of a streaming response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamFormat {
    /// `text/event-stream` with `data:` lines and a `[DONE]` marker.
    EventStream,
    /// Raw incremental text; the stream closing completes it.
    PlainText,
}

impl StreamFormat {
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        match content_type {
            Some(ct) if ct.to_ascii_lowercase().starts_with("text/event-stream") => {
                Self::EventStream
            }
            _ => Self::PlainText,
        }
    }
}

/// A successful backend response.
pub enum TransportResponse {
    Stream(ByteStream, StreamFormat),
    Complete(serde_json::Value),
}

impl std::fmt::Debug for TransportResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stream(_, format) => f.debug_tuple("Stream").field(format).finish(),
            Self::Complete(value) => f.debug_tuple("Complete").field(value).finish(),
        }
    }
}

/// Issues one backend call. Implementations never retry.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `request` to `endpoint`.
    ///
    /// Streaming requests return the live body; buffered requests are read
    /// fully and parsed as JSON. Non-2xx statuses are
    /// [`ChatError::Transport`](crate::error::ChatError::Transport).
    async fn send(
        &self,
        request: &BackendRequest,
        endpoint: &str,
        cancel: &CancellationToken,
    ) -> Result<TransportResponse>;
}
