//! Streaming types.

use serde::{Deserialize, Serialize};

use crate::models::ModelDescriptor;
use crate::routing::RoutingDecision;

/// An incremental piece of assistant text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextDelta {
    pub text: String,
}

impl TextDelta {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Final result of a completed turn.
#[derive(Debug, Clone)]
pub struct ChatCompletion {
    /// Full accumulated text.
    pub text: String,
    /// Path the turn was routed through.
    pub decision: RoutingDecision,
    /// Descriptor the request was built from, after catalogue refresh.
    pub model: ModelDescriptor,
    /// Whether the response was streamed.
    pub streamed: bool,
}
