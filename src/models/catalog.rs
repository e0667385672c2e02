//! Built-in model catalogue.
//!
//! Variant order is the canonical default ordering of the model picker.

use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use super::capabilities::ModelCapabilities;
use super::{BackendTarget, ModelDescriptor};

/// Models known to this build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
pub enum KnownModel {
    #[strum(serialize = "gpt-4.1")]
    Gpt41,
    #[strum(serialize = "gpt-4o")]
    Gpt4o,
    #[strum(serialize = "gpt-4o-mini")]
    Gpt4oMini,
    #[strum(serialize = "gpt-5")]
    Gpt5,
    #[strum(serialize = "gpt-5-mini")]
    Gpt5Mini,
    #[strum(serialize = "gpt-5-chat")]
    Gpt5Chat,
    #[strum(serialize = "o3")]
    O3,
    #[strum(serialize = "o3-mini")]
    O3Mini,
    #[strum(serialize = "o4-mini")]
    O4Mini,
    #[strum(serialize = "o1")]
    O1,
    #[strum(serialize = "DeepSeek-R1")]
    DeepSeekR1,
    #[strum(serialize = "DeepSeek-V3-0324")]
    DeepSeekV3,
    #[strum(serialize = "Llama-4-Maverick")]
    Llama4Maverick,
    #[strum(serialize = "grok-3")]
    Grok3,
    #[strum(serialize = "research-agent")]
    ResearchAgent,
}

impl KnownModel {
    /// Catalogue identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gpt41 => "gpt-4.1",
            Self::Gpt4o => "gpt-4o",
            Self::Gpt4oMini => "gpt-4o-mini",
            Self::Gpt5 => "gpt-5",
            Self::Gpt5Mini => "gpt-5-mini",
            Self::Gpt5Chat => "gpt-5-chat",
            Self::O3 => "o3",
            Self::O3Mini => "o3-mini",
            Self::O4Mini => "o4-mini",
            Self::O1 => "o1",
            Self::DeepSeekR1 => "DeepSeek-R1",
            Self::DeepSeekV3 => "DeepSeek-V3-0324",
            Self::Llama4Maverick => "Llama-4-Maverick",
            Self::Grok3 => "grok-3",
            Self::ResearchAgent => "research-agent",
        }
    }

    fn display_name(&self) -> &'static str {
        match self {
            Self::Gpt41 => "GPT-4.1",
            Self::Gpt4o => "GPT-4o",
            Self::Gpt4oMini => "GPT-4o mini",
            Self::Gpt5 => "GPT-5",
            Self::Gpt5Mini => "GPT-5 mini",
            Self::Gpt5Chat => "GPT-5 Chat",
            Self::O3 => "o3",
            Self::O3Mini => "o3-mini",
            Self::O4Mini => "o4-mini",
            Self::O1 => "o1",
            Self::DeepSeekR1 => "DeepSeek-R1",
            Self::DeepSeekV3 => "DeepSeek-V3",
            Self::Llama4Maverick => "Llama 4 Maverick",
            Self::Grok3 => "Grok 3",
            Self::ResearchAgent => "Research Agent",
        }
    }

    pub fn capabilities(&self) -> ModelCapabilities {
        match self {
            Self::O1 | Self::O3 | Self::O3Mini | Self::O4Mini => ModelCapabilities::reasoning(),
            Self::Gpt5 | Self::Gpt5Mini => ModelCapabilities {
                supports_temperature: false,
                supports_reasoning_effort: true,
                supports_verbosity: true,
                ..ModelCapabilities::default()
            },
            Self::DeepSeekR1 => ModelCapabilities {
                supports_temperature: false,
                ..ModelCapabilities::default()
            },
            _ => ModelCapabilities::default(),
        }
    }

    /// Catalogue entry for this model.
    pub fn descriptor(&self) -> ModelDescriptor {
        let (max_length, token_limit) = match self {
            Self::Gpt41 => (1_047_576, 32_768),
            Self::Gpt4o | Self::Gpt4oMini => (128_000, 16_384),
            Self::Gpt5 | Self::Gpt5Mini => (400_000, 128_000),
            Self::Gpt5Chat => (128_000, 16_384),
            Self::O3 | Self::O3Mini | Self::O4Mini | Self::O1 => (200_000, 100_000),
            Self::DeepSeekR1 | Self::DeepSeekV3 => (128_000, 32_768),
            Self::Llama4Maverick => (1_000_000, 16_384),
            Self::Grok3 => (131_072, 16_384),
            Self::ResearchAgent => (128_000, 16_384),
        };
        let (sdk, provider, deployment_name) = match self {
            Self::DeepSeekR1 | Self::DeepSeekV3 => {
                (BackendTarget::Secondary, Some("deepseek"), None)
            }
            Self::Llama4Maverick => (
                BackendTarget::Secondary,
                Some("meta"),
                Some("Llama-4-Maverick-17B-128E-Instruct-FP8"),
            ),
            Self::Grok3 => (BackendTarget::Secondary, Some("xai"), None),
            Self::ResearchAgent => (BackendTarget::Primary, Some("agents"), Some("gpt-4.1")),
            _ => (BackendTarget::Primary, Some("openai"), None),
        };
        let knowledge_cutoff = match self {
            Self::Gpt41 | Self::Gpt5 | Self::Gpt5Mini | Self::Gpt5Chat => Some("2024-06"),
            Self::O3 | Self::O4Mini => Some("2024-06"),
            Self::Gpt4o | Self::Gpt4oMini | Self::O3Mini | Self::O1 => Some("2023-10"),
            _ => None,
        };
        ModelDescriptor {
            id: self.as_str().to_string(),
            name: self.display_name().to_string(),
            max_length,
            token_limit,
            deployment_name: deployment_name.map(str::to_string),
            provider: provider.map(str::to_string),
            sdk,
            capabilities: self.capabilities(),
            knowledge_cutoff: knowledge_cutoff.map(str::to_string),
            agent_id: match self {
                Self::ResearchAgent => Some("asst_research".to_string()),
                _ => None,
            },
        }
    }
}

/// Position of `model_id` in the canonical default ordering.
pub fn priority_index(model_id: &str) -> Option<usize> {
    KnownModel::iter().position(|m| m.as_str() == model_id)
}

/// Every catalogue descriptor in canonical order.
pub fn builtin_descriptors() -> Vec<ModelDescriptor> {
    KnownModel::iter().map(|m| m.descriptor()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn as_str_matches_strum_serialization() {
        for model in KnownModel::iter() {
            assert_eq!(model.to_string(), model.as_str());
            assert_eq!(KnownModel::from_str(model.as_str()).unwrap(), model);
        }
    }

    #[test]
    fn reasoning_models_never_stream() {
        for model in KnownModel::iter() {
            let caps = model.capabilities();
            if caps.is_reasoning_model {
                assert!(!caps.supports_streaming, "{model} streams");
            }
        }
    }

    #[test]
    fn priority_follows_declaration_order() {
        assert_eq!(priority_index("gpt-4.1"), Some(0));
        assert_eq!(priority_index("gpt-4o"), Some(1));
        assert_eq!(priority_index("not-a-model"), None);
    }
}
