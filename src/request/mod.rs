//! Backend request shaping.
//!
//! Each [`RoutingDecision`] has one builder in [`builders`]; all of them go
//! through the capability rules in [`rules`].

pub mod builders;
pub mod rules;

pub use builders::build_request;

use serde::Serialize;

use crate::routing::RoutingDecision;
use crate::types::{ChatMessage, ReasoningEffort, SearchMode, TextVerbosity};

/// Resolved per-client options applied to every request.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestOptions {
    pub default_temperature: f64,
    pub user_context: String,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            default_temperature: crate::config::DEFAULT_TEMPERATURE,
            user_context: String::new(),
        }
    }
}

impl From<&crate::config::ChatConfig> for RequestOptions {
    fn from(config: &crate::config::ChatConfig) -> Self {
        Self {
            default_temperature: config.default_temperature,
            user_context: config.user_context.clone(),
        }
    }
}

/// The wire payload for one backend call. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendRequest {
    /// Wire model id (deployment name when set).
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<ChatMessage>>,
    /// Reasoning-model message list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<Vec<ChatMessage>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning_effort: Option<ReasoningEffort>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbosity: Option<TextVerbosity>,
    pub stream: bool,
    pub user: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bot_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forced_agent_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_mode: Option<SearchMode>,
    /// Search query; the only conversation content on the search path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

impl BackendRequest {
    /// Request with only the fields every backend takes.
    pub(crate) fn base(model: impl Into<String>, stream: bool, user: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: None,
            input: None,
            temperature: None,
            reasoning_effort: None,
            verbosity: None,
            stream,
            user: user.into(),
            bot_id: None,
            agent_id: None,
            thread_id: None,
            forced_agent_type: None,
            search_mode: None,
            query: None,
        }
    }

    /// Messages in whichever field this request carries them.
    pub fn conversation(&self) -> Option<&[ChatMessage]> {
        self.messages.as_deref().or(self.input.as_deref())
    }

    pub fn to_json(&self) -> serde_json::Value {
        // Serialization of plain data with string keys cannot fail.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// A built request paired with its routing decision and API path.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestPlan {
    pub decision: RoutingDecision,
    pub endpoint: String,
    pub request: BackendRequest,
}
