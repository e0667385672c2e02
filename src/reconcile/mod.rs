//! Normalizes backend output into text deltas.
//!
//! Streaming and buffered responses both become a [`TextStream`], so callers
//! accumulate text the same way whichever backend answered.

use futures::stream::BoxStream;
use futures::StreamExt;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{ChatError, Result};
use crate::transport::{ByteStream, StreamFormat, TransportResponse};
use crate::types::TextDelta;

/// Finite, non-restartable sequence of text deltas.
pub type TextStream = BoxStream<'static, Result<TextDelta>>;

/// Completion marker of an event stream.
pub const DONE_MARKER: &str = "[DONE]";

/// Turn a transport response into text deltas.
///
/// A cancelled stream ends with [`ChatError::Cancelled`].
pub fn reconcile(response: TransportResponse, cancel: CancellationToken) -> TextStream {
    match response {
        TransportResponse::Complete(value) => {
            let item = buffered_text(&value).map(TextDelta::new);
            Box::pin(futures::stream::once(async move { item }))
        }
        TransportResponse::Stream(bytes, StreamFormat::PlainText) => plain_text(bytes, cancel),
        TransportResponse::Stream(bytes, StreamFormat::EventStream) => event_stream(bytes, cancel),
    }
}

/// Text of a buffered `{"text": ...}` body.
pub fn buffered_text(value: &Value) -> Result<String> {
    value
        .get("text")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            warn!("Buffered response has no text field");
            ChatError::MalformedResponse("response body has no \"text\" string".to_string())
        })
}

fn plain_text(bytes: ByteStream, cancel: CancellationToken) -> TextStream {
    let stream = async_stream::stream! {
        let mut decoder = Utf8Decoder::default();
        futures::pin_mut!(bytes);

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                item = bytes.next() => Some(item),
            };
            let Some(item) = next else {
                debug!("Plain-text stream cancelled");
                yield Err(ChatError::Cancelled);
                break;
            };
            let chunk = match item {
                Some(Ok(chunk)) => chunk,
                Some(Err(e)) => {
                    yield Err(e);
                    break;
                }
                None => {
                    if let Err(e) = decoder.finish() {
                        yield Err(e);
                    }
                    break;
                }
            };
            match decoder.push(&chunk) {
                Ok(text) if text.is_empty() => {}
                Ok(text) => yield Ok(TextDelta::new(text)),
                Err(e) => {
                    yield Err(e);
                    break;
                }
            }
        }
    };
    Box::pin(stream)
}

fn event_stream(bytes: ByteStream, cancel: CancellationToken) -> TextStream {
    let stream = async_stream::stream! {
        let mut decoder = Utf8Decoder::default();
        let mut buffer = String::new();
        let mut done = false;
        futures::pin_mut!(bytes);

        while !done {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                item = bytes.next() => Some(item),
            };
            let Some(item) = next else {
                debug!("Event stream cancelled");
                yield Err(ChatError::Cancelled);
                break;
            };
            let chunk = match item {
                Some(Ok(chunk)) => chunk,
                Some(Err(e)) => {
                    yield Err(e);
                    break;
                }
                None => {
                    // A trailing line without a newline still counts.
                    let rest = std::mem::take(&mut buffer);
                    match parse_event_line(strip_line_ending(&rest)) {
                        Some(SseEvent::Done) => done = true,
                        Some(SseEvent::Text(text)) if !text.is_empty() => {
                            yield Ok(TextDelta::new(text));
                        }
                        _ => {}
                    }
                    if !done {
                        warn!("Event stream closed without completion marker");
                        yield Err(ChatError::MalformedResponse(
                            "event stream ended without [DONE]".to_string(),
                        ));
                    }
                    break;
                }
            };

            match decoder.push(&chunk) {
                Ok(text) => buffer.push_str(&text),
                Err(e) => {
                    yield Err(e);
                    break;
                }
            }

            while let Some(line_end) = buffer.find('\n') {
                let line = strip_line_ending(&buffer[..line_end]).to_string();
                buffer = buffer[line_end + 1..].to_string();

                match parse_event_line(&line) {
                    Some(SseEvent::Done) => {
                        done = true;
                        break;
                    }
                    Some(SseEvent::Text(text)) if !text.is_empty() => {
                        yield Ok(TextDelta::new(text));
                    }
                    _ => {}
                }
            }
        }
    };
    Box::pin(stream)
}

#[derive(Debug, PartialEq)]
enum SseEvent {
    Text(String),
    Done,
}

/// Raw data payloads keep their whitespace, so only the line ending goes.
fn strip_line_ending(line: &str) -> &str {
    line.strip_suffix('\r').unwrap_or(line)
}

/// One event-stream line without its line ending. Comments, blank lines and
/// non-data fields yield `None`.
fn parse_event_line(line: &str) -> Option<SseEvent> {
    if line.is_empty() || line.starts_with(':') {
        return None;
    }
    let data = line.strip_prefix("data:")?;
    let data = data.strip_prefix(' ').unwrap_or(data);
    if data.trim() == DONE_MARKER {
        return Some(SseEvent::Done);
    }
    match serde_json::from_str::<Value>(data) {
        Ok(Value::String(text)) => Some(SseEvent::Text(text)),
        Ok(Value::Object(obj)) => match obj.get("text").and_then(Value::as_str) {
            Some(text) => Some(SseEvent::Text(text.to_string())),
            None => {
                debug!(data, "Skipping event without text");
                None
            }
        },
        _ => Some(SseEvent::Text(data.to_string())),
    }
}

/// Reassembles UTF-8 characters split across chunk boundaries.
#[derive(Debug, Default)]
struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    /// Decode as much of the pending bytes as forms complete characters.
    fn push(&mut self, chunk: &[u8]) -> Result<String> {
        self.pending.extend_from_slice(chunk);
        match std::str::from_utf8(&self.pending) {
            Ok(text) => {
                let text = text.to_string();
                self.pending.clear();
                Ok(text)
            }
            Err(e) if e.error_len().is_some() => Err(ChatError::MalformedResponse(
                "response stream is not valid UTF-8".to_string(),
            )),
            Err(e) => {
                let valid = e.valid_up_to();
                let text = String::from_utf8_lossy(&self.pending[..valid]).into_owned();
                self.pending.drain(..valid);
                Ok(text)
            }
        }
    }

    fn finish(&self) -> Result<()> {
        if self.pending.is_empty() {
            Ok(())
        } else {
            Err(ChatError::MalformedResponse(
                "response stream ended inside a UTF-8 character".to_string(),
            ))
        }
    }
}

/// Accumulates deltas into the final text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextAccumulator {
    text: String,
    deltas: usize,
}

impl TextAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, delta: &TextDelta) {
        self.text.push_str(&delta.text);
        self.deltas += 1;
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn delta_count(&self) -> usize {
        self.deltas
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

/// Drain a stream into its full text, stopping at the first error.
pub async fn collect_text(mut stream: TextStream) -> Result<String> {
    let mut acc = TextAccumulator::new();
    while let Some(delta) = stream.next().await {
        acc.push(&delta?);
    }
    Ok(acc.into_text())
}
