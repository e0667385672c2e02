//! reqwest-backed transport.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{StreamFormat, Transport, TransportResponse};
use crate::config::ChatConfig;
use crate::error::{ChatError, Result};
use crate::request::BackendRequest;

/// Header carrying the per-call request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Sends backend requests over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpTransport {
    /// Build a transport with its own client configured from `config`.
    pub fn new(config: &ChatConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| ChatError::Configuration(format!("HTTP client: {e}")))?;
        Ok(Self::with_client(client, config))
    }

    /// Use an existing client.
    pub fn with_client(client: reqwest::Client, config: &ChatConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    fn headers(&self, stream: bool, request_id: &str) -> HeaderMap {
        let mut headers = bearer_headers(self.api_key.as_deref());
        let accept = if stream {
            "text/event-stream, text/plain"
        } else {
            "application/json"
        };
        headers.insert(ACCEPT, HeaderValue::from_static(accept));
        if let Ok(val) = HeaderValue::from_str(request_id) {
            headers.insert(REQUEST_ID_HEADER, val);
        }
        headers
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        request: &BackendRequest,
        endpoint: &str,
        cancel: &CancellationToken,
    ) -> Result<TransportResponse> {
        let url = format!("{}{}", self.base_url, endpoint);
        let request_id = Uuid::new_v4().to_string();
        debug!(%url, request_id, model = %request.model, stream = request.stream, "Sending backend request");

        let call = self
            .client
            .post(&url)
            .headers(self.headers(request.stream, &request_id))
            .json(request)
            .send();

        let resp = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ChatError::Cancelled),
            resp = call => resp?,
        };

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(%url, request_id, status = status.as_u16(), "Backend request failed");
            return Err(status_to_error(status, &body));
        }

        if request.stream {
            let format = StreamFormat::from_content_type(
                resp.headers()
                    .get(CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok()),
            );
            let body = resp.bytes_stream().map(|chunk| chunk.map_err(ChatError::from));
            return Ok(TransportResponse::Stream(Box::pin(body), format));
        }

        let body = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ChatError::Cancelled),
            body = resp.bytes() => body?,
        };
        let value = serde_json::from_slice(&body).map_err(|e| {
            warn!(%url, request_id, error = %e, "Backend returned invalid JSON");
            ChatError::MalformedResponse(format!("invalid JSON body: {e}"))
        })?;
        Ok(TransportResponse::Complete(value))
    }
}

/// JSON content type plus a bearer token when one is configured.
pub fn bearer_headers(api_key: Option<&str>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Some(key) = api_key.filter(|k| !k.is_empty()) {
        if let Ok(val) = HeaderValue::from_str(&format!("Bearer {key}")) {
            headers.insert(AUTHORIZATION, val);
        }
    }
    headers
}

/// Map a non-2xx status and its raw body to a transport error.
pub fn status_to_error(status: StatusCode, body: &str) -> ChatError {
    ChatError::transport(
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown status"),
        body,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_header_only_with_key() {
        assert!(bearer_headers(None).get(AUTHORIZATION).is_none());
        assert!(bearer_headers(Some("")).get(AUTHORIZATION).is_none());
        assert_eq!(
            bearer_headers(Some("k")).get(AUTHORIZATION).unwrap(),
            "Bearer k"
        );
    }

    #[test]
    fn status_to_error_keeps_status_text_when_body_is_not_json() {
        match status_to_error(StatusCode::BAD_GATEWAY, "<html>") {
            ChatError::Transport {
                status,
                status_text,
                body,
            } => {
                assert_eq!(status, 502);
                assert_eq!(status_text, "Bad Gateway");
                assert_eq!(body, None);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
