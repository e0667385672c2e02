//! Model capabilities descriptor.

use serde::{Deserialize, Serialize};

/// Describes what a model accepts on the wire.
///
/// Every flag is resolved once when a descriptor is loaded or merged; request
/// builders read these values and never re-derive defaults.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelCapabilities {
    pub supports_streaming: bool,
    pub supports_temperature: bool,
    /// Deliberates before answering; never streams, fixed temperature.
    pub is_reasoning_model: bool,
    pub supports_reasoning_effort: bool,
    pub supports_verbosity: bool,
}

impl Default for ModelCapabilities {
    fn default() -> Self {
        Self {
            supports_streaming: true,
            supports_temperature: true,
            is_reasoning_model: false,
            supports_reasoning_effort: false,
            supports_verbosity: false,
        }
    }
}

impl ModelCapabilities {
    /// Capabilities of a reasoning-only model.
    pub fn reasoning() -> Self {
        Self {
            supports_streaming: false,
            is_reasoning_model: true,
            supports_reasoning_effort: true,
            ..Self::default()
        }
    }
}
