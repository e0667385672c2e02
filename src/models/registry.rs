//! Model catalogue lookup.

use tracing::warn;

use super::catalog::builtin_descriptors;
use super::{ModelDescriptor, ModelDescriptorRecord};
use crate::error::Result;

/// Static catalogue of model descriptors, loaded once at startup.
///
/// Lookup never fails: unknown ids resolve to a synthesized descriptor so a
/// client holding a stale id can still send a request.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    models: Vec<ModelDescriptor>,
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ModelRegistry {
    /// Registry over the given descriptors, in canonical order.
    pub fn new(models: Vec<ModelDescriptor>) -> Self {
        Self { models }
    }

    /// Registry over the built-in catalogue.
    pub fn builtin() -> Self {
        Self::new(builtin_descriptors())
    }

    /// Load a catalogue from a JSON array of interchange records.
    pub fn from_json(raw: &str) -> Result<Self> {
        let records: Vec<ModelDescriptorRecord> = serde_json::from_str(raw)?;
        Ok(Self::new(
            records.iter().map(ModelDescriptor::from_record).collect(),
        ))
    }

    pub fn get(&self, model_id: &str) -> Option<&ModelDescriptor> {
        self.models.iter().find(|m| m.id == model_id)
    }

    pub fn contains(&self, model_id: &str) -> bool {
        self.get(model_id).is_some()
    }

    /// Catalogue entry for `model_id`, or a synthesized default.
    pub fn lookup(&self, model_id: &str) -> ModelDescriptor {
        match self.get(model_id) {
            Some(desc) => desc.clone(),
            None => {
                warn!(model = model_id, "Unknown model id, synthesizing defaults");
                ModelDescriptor::fallback(model_id)
            }
        }
    }

    /// All descriptors in canonical order.
    pub fn list(&self) -> &[ModelDescriptor] {
        &self.models
    }

    pub fn ids(&self) -> Vec<&str> {
        self.models.iter().map(|m| m.id.as_str()).collect()
    }

    /// Re-merge a persisted record against the live catalogue.
    ///
    /// Capabilities, sdk, limits and display metadata come from the catalogue;
    /// the id and the user-chosen display name are kept. Records for ids the
    /// catalogue does not know are normalized as-is.
    pub fn refresh(&self, persisted: &ModelDescriptorRecord) -> ModelDescriptor {
        match self.get(&persisted.id) {
            Some(live) => {
                let mut merged = live.clone();
                if let Some(name) = persisted.name.as_ref().filter(|n| !n.trim().is_empty()) {
                    merged.name = name.clone();
                }
                merged
            }
            None => ModelDescriptor::from_record(persisted),
        }
    }

    /// [`ModelRegistry::refresh`] for a descriptor already in memory.
    pub fn refresh_descriptor(&self, desc: &ModelDescriptor) -> ModelDescriptor {
        match self.get(&desc.id) {
            Some(live) => ModelDescriptor {
                name: desc.name.clone(),
                ..live.clone()
            },
            None => desc.clone(),
        }
    }
}
