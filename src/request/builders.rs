//! One request builder per routing decision.

use tracing::debug;

use super::rules::{
    effective_reasoning_effort, effective_stream, effective_temperature, effective_verbosity,
    merge_system_prompt, with_system_message,
};
use super::{BackendRequest, RequestOptions};
use crate::error::{ChatError, Result};
use crate::routing::RoutingDecision;
use crate::types::{ConversationTurn, Role};

/// Where a backend expects the system prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SystemSlot {
    /// Separate leading system-role message.
    Message,
    /// No system role on the wire; merge into the first user message.
    MergeIntoUser,
}

/// Build the wire payload for `decision`.
///
/// Only the search path can fail, with [`ChatError::Validation`] when there is
/// no query to send. The turn's messages are never modified.
pub fn build_request(
    decision: RoutingDecision,
    turn: &ConversationTurn,
    options: &RequestOptions,
) -> Result<BackendRequest> {
    let request = match decision {
        RoutingDecision::FileAnalysis => file_analysis(turn, options),
        RoutingDecision::AudioTranscription => audio_transcription(turn, options),
        RoutingDecision::KnowledgeBase => knowledge_base(turn, options),
        RoutingDecision::DirectAgent => direct_agent(turn, options),
        RoutingDecision::ToolAwareSearch => tool_aware_search(turn, options)?,
        RoutingDecision::Standard => standard(turn, options),
    };
    debug!(
        route = %decision,
        model = %request.model,
        stream = request.stream,
        temperature = ?request.temperature,
        uses_input = request.input.is_some(),
        "Built backend request"
    );
    Ok(request)
}

pub fn standard(turn: &ConversationTurn, options: &RequestOptions) -> BackendRequest {
    conversation_request(turn, options, SystemSlot::Message)
}

pub fn file_analysis(turn: &ConversationTurn, options: &RequestOptions) -> BackendRequest {
    conversation_request(turn, options, SystemSlot::MergeIntoUser)
}

pub fn audio_transcription(turn: &ConversationTurn, options: &RequestOptions) -> BackendRequest {
    conversation_request(turn, options, SystemSlot::Message)
}

pub fn knowledge_base(turn: &ConversationTurn, options: &RequestOptions) -> BackendRequest {
    let mut request = conversation_request(turn, options, SystemSlot::Message);
    request.bot_id = turn.knowledge_base().map(str::to_string);
    request
}

pub fn direct_agent(turn: &ConversationTurn, options: &RequestOptions) -> BackendRequest {
    let mut request = conversation_request(turn, options, SystemSlot::MergeIntoUser);
    request.agent_id = turn.model.agent().map(str::to_string);
    request.thread_id = turn.thread_id.clone().filter(|id| !id.trim().is_empty());
    request.forced_agent_type = turn
        .forced_agent_type
        .clone()
        .filter(|agent| !agent.trim().is_empty());
    request
}

/// Sends only the latest user query, never the conversation.
pub fn tool_aware_search(
    turn: &ConversationTurn,
    options: &RequestOptions,
) -> Result<BackendRequest> {
    let query = turn
        .messages
        .iter()
        .rev()
        .find(|m| m.role == Role::User)
        .map(|m| m.text().trim().to_string())
        .unwrap_or_default();
    if query.is_empty() {
        return Err(ChatError::Validation(
            "Search query cannot be empty".to_string(),
        ));
    }

    let mut request = sampled_request(turn, options);
    request.query = Some(query);
    request.search_mode = Some(turn.search_mode);
    Ok(request)
}

fn conversation_request(
    turn: &ConversationTurn,
    options: &RequestOptions,
    slot: SystemSlot,
) -> BackendRequest {
    let mut request = sampled_request(turn, options);
    let prompt = turn.effective_system_prompt();
    if turn.model.capabilities.is_reasoning_model {
        request.input = Some(merge_system_prompt(&turn.messages, prompt));
    } else {
        request.messages = Some(match slot {
            SystemSlot::Message => with_system_message(&turn.messages, prompt),
            SystemSlot::MergeIntoUser => merge_system_prompt(&turn.messages, prompt),
        });
    }
    request
}

/// Model, stream flag and sampling knobs after capability rules.
fn sampled_request(turn: &ConversationTurn, options: &RequestOptions) -> BackendRequest {
    let caps = &turn.model.capabilities;
    let mut request = BackendRequest::base(
        turn.model.wire_id(),
        effective_stream(caps, turn.stream),
        options.user_context.clone(),
    );
    request.temperature =
        effective_temperature(caps, turn.temperature, options.default_temperature);
    request.reasoning_effort = effective_reasoning_effort(caps, turn.reasoning_effort);
    request.verbosity = effective_verbosity(caps, turn.verbosity);
    request
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{KnownModel, ModelDescriptor};
    use crate::types::{ChatMessage, ContentPart, SearchMode};
    use pretty_assertions::assert_eq;

    fn turn(model: ModelDescriptor) -> ConversationTurn {
        ConversationTurn::builder()
            .messages(vec![ChatMessage::user("What is 2+2?")])
            .model(model)
            .system_prompt("You are a helpful math tutor")
            .temperature(0.5)
            .build()
    }

    #[test]
    fn standard_uses_leading_system_message() {
        let req = standard(&turn(KnownModel::Gpt41.descriptor()), &RequestOptions::default());
        let messages = req.messages.unwrap();
        assert_eq!(messages[0], ChatMessage::system("You are a helpful math tutor"));
        assert_eq!(messages[1], ChatMessage::user("What is 2+2?"));
        assert_eq!(req.temperature, Some(0.5));
        assert!(req.stream);
        assert!(req.input.is_none());
    }

    #[test]
    fn reasoning_model_uses_input_with_merged_prompt() {
        let req = standard(&turn(KnownModel::O3.descriptor()), &RequestOptions::default());
        assert!(req.messages.is_none());
        assert_eq!(
            req.input.unwrap(),
            vec![ChatMessage::user("You are a helpful math tutor\n\nWhat is 2+2?")]
        );
        assert_eq!(req.temperature, Some(1.0));
        assert!(!req.stream);
    }

    #[test]
    fn file_analysis_merges_prompt() {
        let mut t = turn(KnownModel::Gpt4o.descriptor());
        t.messages = vec![ChatMessage::user_parts(vec![
            ContentPart::file("q3.xlsx", "blob://q3"),
            ContentPart::text("Summarize"),
        ])];
        let req = file_analysis(&t, &RequestOptions::default());
        let messages = req.messages.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].text(), "You are a helpful math tutor\n\nSummarize");
    }

    #[test]
    fn knowledge_base_carries_bot_id() {
        let mut t = turn(KnownModel::Gpt4o.descriptor());
        t.bot_id = Some("hr-handbook".into());
        let req = knowledge_base(&t, &RequestOptions::default());
        assert_eq!(req.bot_id.as_deref(), Some("hr-handbook"));
        assert_eq!(req.messages.unwrap()[0].role, Role::System);
    }

    #[test]
    fn direct_agent_carries_agent_fields() {
        let mut t = turn(KnownModel::ResearchAgent.descriptor());
        t.thread_id = Some("thread_42".into());
        t.forced_agent_type = Some("web".into());
        let req = direct_agent(&t, &RequestOptions::default());
        assert_eq!(req.model, "gpt-4.1");
        assert_eq!(req.agent_id.as_deref(), Some("asst_research"));
        assert_eq!(req.thread_id.as_deref(), Some("thread_42"));
        assert_eq!(req.forced_agent_type.as_deref(), Some("web"));
        assert_eq!(req.messages.unwrap().len(), 1);
    }

    #[test]
    fn search_sends_only_latest_query() {
        let mut t = turn(KnownModel::Gpt41.descriptor());
        t.messages = vec![
            ChatMessage::user("private context"),
            ChatMessage::assistant("ok"),
            ChatMessage::user("  rust 1.80 release date "),
        ];
        t.search_mode = SearchMode::Intelligent;
        let req = tool_aware_search(&t, &RequestOptions::default()).unwrap();
        assert_eq!(req.query.as_deref(), Some("rust 1.80 release date"));
        assert_eq!(req.search_mode, Some(SearchMode::Intelligent));
        assert!(req.conversation().is_none());
        assert!(!req.to_json().to_string().contains("private context"));
    }

    #[test]
    fn search_with_empty_query_is_rejected() {
        let mut t = turn(KnownModel::Gpt41.descriptor());
        t.messages = vec![ChatMessage::user("   ")];
        t.search_mode = SearchMode::Always;
        let err = tool_aware_search(&t, &RequestOptions::default()).unwrap_err();
        assert!(matches!(err, ChatError::Validation(_)));
    }

    #[test]
    fn user_context_is_forwarded() {
        let options = RequestOptions {
            user_context: "tenant=acme".into(),
            ..RequestOptions::default()
        };
        let req = standard(&turn(KnownModel::Gpt41.descriptor()), &options);
        assert_eq!(req.user, "tenant=acme");
    }
}
