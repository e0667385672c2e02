//! Capability rules shared by every request builder.

use crate::models::ModelCapabilities;
use crate::types::{ChatMessage, ContentPart, MessageContent, ReasoningEffort, Role, TextVerbosity};

/// Temperature sent to reasoning models regardless of the request.
pub const REASONING_TEMPERATURE: f64 = 1.0;

/// Temperature to put on the wire, if any.
///
/// Models without temperature support never get one; reasoning models get
/// [`REASONING_TEMPERATURE`]; everything else gets the requested value or the
/// configured default.
pub fn effective_temperature(
    caps: &ModelCapabilities,
    requested: Option<f64>,
    default: f64,
) -> Option<f64> {
    if !caps.supports_temperature {
        return None;
    }
    if caps.is_reasoning_model {
        return Some(REASONING_TEMPERATURE);
    }
    Some(requested.unwrap_or(default))
}

/// Requested AND supported AND not a reasoning model.
pub fn effective_stream(caps: &ModelCapabilities, requested: bool) -> bool {
    requested && caps.supports_streaming && !caps.is_reasoning_model
}

pub fn effective_reasoning_effort(
    caps: &ModelCapabilities,
    requested: Option<ReasoningEffort>,
) -> Option<ReasoningEffort> {
    requested.filter(|_| caps.supports_reasoning_effort)
}

pub fn effective_verbosity(
    caps: &ModelCapabilities,
    requested: Option<TextVerbosity>,
) -> Option<TextVerbosity> {
    requested.filter(|_| caps.supports_verbosity)
}

/// Copy of `messages` with the system prompt as a separate leading message.
pub fn with_system_message(messages: &[ChatMessage], system_prompt: Option<&str>) -> Vec<ChatMessage> {
    let mut out = Vec::with_capacity(messages.len() + 1);
    if let Some(prompt) = system_prompt {
        out.push(ChatMessage::system(prompt));
    }
    out.extend_from_slice(messages);
    out
}

/// Copy of `messages` with the system prompt merged into the first user
/// message, separated by a blank line.
///
/// For part lists the prompt goes into the first text part, or becomes a new
/// leading text part when there is none. Without any user message the copy
/// is returned unchanged.
pub fn merge_system_prompt(messages: &[ChatMessage], system_prompt: Option<&str>) -> Vec<ChatMessage> {
    let mut out = messages.to_vec();
    let Some(prompt) = system_prompt else {
        return out;
    };
    let Some(first_user) = out.iter_mut().find(|m| m.role == Role::User) else {
        return out;
    };

    match &mut first_user.content {
        MessageContent::Text(text) => {
            *text = format!("{prompt}\n\n{text}");
        }
        MessageContent::Parts(parts) => {
            let first_text = parts.iter_mut().find_map(|part| match part {
                ContentPart::Text { text } => Some(text),
                _ => None,
            });
            match first_text {
                Some(text) => *text = format!("{prompt}\n\n{text}"),
                None => parts.insert(0, ContentPart::text(prompt)),
            }
        }
    }
    out
}
