//! Turn classification.
//!
//! A turn is routed by the first rule in [`ROUTING_RULES`] whose predicate
//! matches. The last rule always matches, so classification is total.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use tracing::debug;

use crate::types::{ConversationTurn, FileRef, SearchMode};

/// File extensions handled by the transcription backend.
pub const AUDIO_VIDEO_EXTENSIONS: [&str; 7] = ["mp3", "mp4", "mpeg", "mpga", "m4a", "wav", "webm"];

/// Handling path chosen for a turn.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum RoutingDecision {
    FileAnalysis,
    AudioTranscription,
    KnowledgeBase,
    DirectAgent,
    ToolAwareSearch,
    Standard,
}

/// One entry of the priority chain.
#[derive(Clone, Copy)]
pub struct RoutingRule {
    pub decision: RoutingDecision,
    pub matches: fn(&ConversationTurn) -> bool,
}

impl std::fmt::Debug for RoutingRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoutingRule")
            .field("decision", &self.decision)
            .finish_non_exhaustive()
    }
}

/// Priority chain, highest first. Attachments dominate every flag.
pub const ROUTING_RULES: [RoutingRule; 6] = [
    RoutingRule {
        decision: RoutingDecision::FileAnalysis,
        matches: has_document_attachment,
    },
    RoutingRule {
        decision: RoutingDecision::AudioTranscription,
        matches: has_audio_attachment,
    },
    RoutingRule {
        decision: RoutingDecision::KnowledgeBase,
        matches: targets_knowledge_base,
    },
    RoutingRule {
        decision: RoutingDecision::DirectAgent,
        matches: wants_direct_agent,
    },
    RoutingRule {
        decision: RoutingDecision::ToolAwareSearch,
        matches: wants_search,
    },
    RoutingRule {
        decision: RoutingDecision::Standard,
        matches: always,
    },
];

/// Route a turn to exactly one handling path.
pub fn classify(turn: &ConversationTurn) -> RoutingDecision {
    let decision = ROUTING_RULES
        .iter()
        .find(|rule| (rule.matches)(turn))
        .map(|rule| rule.decision)
        .unwrap_or(RoutingDecision::Standard);
    debug!(route = %decision, model = %turn.model.id, "Classified turn");
    decision
}

/// Whether a file goes to the transcription backend.
pub fn is_audio_video(file: &FileRef) -> bool {
    file.extension()
        .is_some_and(|ext| AUDIO_VIDEO_EXTENSIONS.contains(&ext.as_str()))
}

fn has_document_attachment(turn: &ConversationTurn) -> bool {
    turn.files().any(|file| !is_audio_video(file))
}

fn has_audio_attachment(turn: &ConversationTurn) -> bool {
    turn.files().any(is_audio_video)
}

fn targets_knowledge_base(turn: &ConversationTurn) -> bool {
    turn.knowledge_base().is_some()
}

fn wants_direct_agent(turn: &ConversationTurn) -> bool {
    turn.search_mode == SearchMode::DirectAgent || turn.model.agent().is_some()
}

fn wants_search(turn: &ConversationTurn) -> bool {
    matches!(turn.search_mode, SearchMode::Intelligent | SearchMode::Always)
}

fn always(_: &ConversationTurn) -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{KnownModel, ModelDescriptor};
    use crate::types::{ChatMessage, ContentPart};
    use strum::IntoEnumIterator;

    fn turn_with(parts: Vec<ContentPart>) -> ConversationTurn {
        ConversationTurn::builder()
            .messages(vec![ChatMessage::user_parts(parts)])
            .model(ModelDescriptor::fallback("plain"))
            .build()
    }

    #[test]
    fn rule_table_covers_every_decision_once_in_priority_order() {
        let table: Vec<_> = ROUTING_RULES.iter().map(|r| r.decision).collect();
        let all: Vec<_> = RoutingDecision::iter().collect();
        assert_eq!(table, all);
    }

    #[test]
    fn each_rule_matches_its_trigger() {
        let doc = turn_with(vec![ContentPart::file("notes.pdf", "blob://1")]);
        assert!(has_document_attachment(&doc));
        assert!(!has_audio_attachment(&doc));

        let audio = turn_with(vec![ContentPart::file("call.M4A", "blob://2")]);
        assert!(has_audio_attachment(&audio));
        assert!(!has_document_attachment(&audio));

        let mut kb = turn_with(vec![ContentPart::text("hi")]);
        kb.bot_id = Some("kb-1".into());
        assert!(targets_knowledge_base(&kb));
        kb.bot_id = Some("  ".into());
        assert!(!targets_knowledge_base(&kb));

        let mut agent = turn_with(vec![ContentPart::text("hi")]);
        agent.model = KnownModel::ResearchAgent.descriptor();
        assert!(wants_direct_agent(&agent));

        let mut search = turn_with(vec![ContentPart::text("hi")]);
        search.search_mode = SearchMode::Always;
        assert!(wants_search(&search));
        search.search_mode = SearchMode::Off;
        assert!(!wants_search(&search));
    }

    #[test]
    fn file_without_extension_is_a_document() {
        let turn = turn_with(vec![ContentPart::file("Makefile", "blob://3")]);
        assert_eq!(classify(&turn), RoutingDecision::FileAnalysis);
    }

    #[test]
    fn decision_names_are_kebab_case() {
        assert_eq!(RoutingDecision::ToolAwareSearch.to_string(), "tool-aware-search");
        assert_eq!(
            "direct-agent".parse::<RoutingDecision>().unwrap(),
            RoutingDecision::DirectAgent
        );
    }
}
