//! The unit of work submitted to the router.

use bon::Builder;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::generation::{ReasoningEffort, TextVerbosity};
use super::message::{ChatMessage, FileRef};
use crate::models::ModelDescriptor;

/// Web search mode selected for a turn.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum SearchMode {
    #[default]
    Off,
    /// The backend decides per turn whether to search.
    Intelligent,
    /// Every turn is grounded by a search.
    Always,
    /// Hand the turn to a tool-equipped agent.
    DirectAgent,
}

/// One user turn: the conversation so far plus the options that shape the
/// request.
///
/// ```
/// use chatroute::models::ModelRegistry;
/// use chatroute::types::{ChatMessage, ConversationTurn, SearchMode};
///
/// let registry = ModelRegistry::builtin();
/// let turn = ConversationTurn::builder()
///     .messages(vec![ChatMessage::user("Latest Rust release?")])
///     .model(registry.lookup("gpt-4.1"))
///     .search_mode(SearchMode::Intelligent)
///     .build();
/// assert!(turn.stream);
/// ```
#[derive(Debug, Clone, Builder)]
pub struct ConversationTurn {
    pub messages: Vec<ChatMessage>,
    pub model: ModelDescriptor,
    #[builder(into)]
    pub system_prompt: Option<String>,
    /// Requested temperature; the configured default applies when absent.
    pub temperature: Option<f64>,
    #[builder(default = true)]
    pub stream: bool,
    /// Knowledge-base ("bot") identifier.
    #[builder(into)]
    pub bot_id: Option<String>,
    /// Conversation thread for stateful agent backends.
    #[builder(into)]
    pub thread_id: Option<String>,
    #[builder(default)]
    pub search_mode: SearchMode,
    /// Agent type the direct-agent backend must use instead of choosing one.
    #[builder(into)]
    pub forced_agent_type: Option<String>,
    pub reasoning_effort: Option<ReasoningEffort>,
    pub verbosity: Option<TextVerbosity>,
}

impl ConversationTurn {
    /// Every file attachment across all messages, in conversation order.
    pub fn files(&self) -> impl Iterator<Item = &FileRef> {
        self.messages.iter().flat_map(ChatMessage::files)
    }

    /// Knowledge-base id, ignoring blank values.
    pub fn knowledge_base(&self) -> Option<&str> {
        self.bot_id.as_deref().filter(|id| !id.trim().is_empty())
    }

    /// System prompt, ignoring blank values.
    pub fn effective_system_prompt(&self) -> Option<&str> {
        self.system_prompt
            .as_deref()
            .filter(|prompt| !prompt.trim().is_empty())
    }
}
