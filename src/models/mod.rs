//! Model descriptors, the built-in catalogue and registry lookup.

pub mod capabilities;
pub mod catalog;
pub mod registry;

pub use capabilities::ModelCapabilities;
pub use catalog::KnownModel;
pub use registry::ModelRegistry;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::warn;

/// SDK family a model is served through.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BackendTarget {
    #[default]
    Primary,
    Secondary,
}

/// Immutable catalogue entry for one model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelDescriptor {
    pub id: String,
    pub name: String,
    /// Context length limit.
    pub max_length: u32,
    /// Output token limit.
    pub token_limit: u32,
    /// Overrides the wire `model` field when set.
    pub deployment_name: Option<String>,
    pub provider: Option<String>,
    pub sdk: BackendTarget,
    pub capabilities: ModelCapabilities,
    pub knowledge_cutoff: Option<String>,
    /// Marks an agent-backed model.
    pub agent_id: Option<String>,
}

impl ModelDescriptor {
    /// Descriptor synthesized for an id the catalogue does not know.
    ///
    /// Streaming and temperature are assumed supported and the wire id is the
    /// given id.
    pub fn fallback(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            deployment_name: Some(id.clone()),
            id,
            max_length: 128_000,
            token_limit: 4_096,
            provider: None,
            sdk: BackendTarget::Primary,
            capabilities: ModelCapabilities::default(),
            knowledge_cutoff: None,
            agent_id: None,
        }
    }

    /// Identifier sent as the wire `model` field.
    pub fn wire_id(&self) -> &str {
        self.deployment_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.id)
    }

    /// Agent id of an agent-backed model, ignoring blank values.
    pub fn agent(&self) -> Option<&str> {
        self.agent_id.as_deref().filter(|id| !id.trim().is_empty())
    }

    /// Normalize an interchange record, resolving every absent capability to
    /// its default.
    pub fn from_record(record: &ModelDescriptorRecord) -> Self {
        let is_reasoning = record
            .model_type
            .as_deref()
            .is_some_and(|t| t.eq_ignore_ascii_case("reasoning"));
        let capabilities = ModelCapabilities {
            supports_streaming: record.supports_streaming.unwrap_or(!is_reasoning),
            supports_temperature: record.supports_temperature.unwrap_or(true),
            is_reasoning_model: is_reasoning,
            supports_reasoning_effort: record.supports_reasoning_effort.unwrap_or(false),
            supports_verbosity: record.supports_verbosity.unwrap_or(false),
        };
        let sdk = match record.sdk.as_deref() {
            None => BackendTarget::Primary,
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                warn!(model = %record.id, sdk = raw, "Unknown sdk tag, using primary");
                BackendTarget::Primary
            }),
        };
        let agent_id = match record.agent_enabled {
            Some(false) => None,
            _ => record.agent_id.clone().filter(|id| !id.trim().is_empty()),
        };
        Self {
            id: record.id.clone(),
            name: record.name.clone().unwrap_or_else(|| record.id.clone()),
            max_length: record.max_length.unwrap_or(128_000),
            token_limit: record.token_limit.unwrap_or(4_096),
            deployment_name: record.deployment_name.clone(),
            provider: record.provider.clone(),
            sdk,
            capabilities,
            knowledge_cutoff: record.knowledge_cutoff.clone(),
            agent_id,
        }
    }

    /// Interchange form of this descriptor.
    pub fn to_record(&self) -> ModelDescriptorRecord {
        let caps = self.capabilities;
        ModelDescriptorRecord {
            id: self.id.clone(),
            name: Some(self.name.clone()),
            max_length: Some(self.max_length),
            token_limit: Some(self.token_limit),
            deployment_name: self.deployment_name.clone(),
            provider: self.provider.clone(),
            sdk: Some(self.sdk.to_string()),
            supports_temperature: Some(caps.supports_temperature),
            supports_streaming: Some(caps.supports_streaming),
            supports_reasoning_effort: Some(caps.supports_reasoning_effort),
            supports_verbosity: Some(caps.supports_verbosity),
            model_type: caps.is_reasoning_model.then(|| "reasoning".to_string()),
            knowledge_cutoff: self.knowledge_cutoff.clone(),
            agent_enabled: self.agent_id.as_ref().map(|_| true),
            agent_id: self.agent_id.clone(),
        }
    }
}

/// Persisted / transmitted descriptor shape. Only `id` is required.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDescriptorRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdk: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supports_temperature: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supports_streaming: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supports_reasoning_effort: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supports_verbosity: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knowledge_cutoff: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_with_only_id_gets_safe_defaults() {
        let record: ModelDescriptorRecord = serde_json::from_str(r#"{"id":"my-model"}"#).unwrap();
        let desc = ModelDescriptor::from_record(&record);
        assert_eq!(desc.wire_id(), "my-model");
        assert!(desc.capabilities.supports_streaming);
        assert!(desc.capabilities.supports_temperature);
        assert!(!desc.capabilities.is_reasoning_model);
        assert_eq!(desc.sdk, BackendTarget::Primary);
    }

    #[test]
    fn reasoning_model_type_disables_streaming_by_default() {
        let record = ModelDescriptorRecord {
            id: "o-next".into(),
            model_type: Some("reasoning".into()),
            ..Default::default()
        };
        let caps = ModelDescriptor::from_record(&record).capabilities;
        assert!(caps.is_reasoning_model);
        assert!(!caps.supports_streaming);
        assert!(caps.supports_temperature);
    }

    #[test]
    fn disabled_agent_drops_agent_id() {
        let record = ModelDescriptorRecord {
            id: "helper".into(),
            agent_enabled: Some(false),
            agent_id: Some("asst_1".into()),
            ..Default::default()
        };
        assert_eq!(ModelDescriptor::from_record(&record).agent(), None);
    }

    #[test]
    fn deployment_name_overrides_wire_id() {
        let mut desc = ModelDescriptor::fallback("x");
        desc.deployment_name = Some("x-deploy".into());
        assert_eq!(desc.wire_id(), "x-deploy");
        desc.deployment_name = None;
        assert_eq!(desc.wire_id(), "x");
    }

    #[test]
    fn record_serializes_camel_case_without_nulls() {
        let value = serde_json::to_value(KnownModel::O3.descriptor().to_record()).unwrap();
        assert_eq!(value["modelType"], "reasoning");
        assert_eq!(value["supportsTemperature"], true);
        assert!(value.get("agentId").is_none());
    }
}
