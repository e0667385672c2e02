//! Usage-based model ordering with consecutive-use hysteresis.
//!
//! [`ModelUsageState`] is plain data with pure transition methods; the
//! [`UsageTracker`] owns one instance and persists it after every mutation.

pub mod store;
pub mod tracker;

pub use store::{FileUsageStore, MemoryUsageStore, UsageStore};
pub use tracker::UsageTracker;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::debug;

use crate::models::catalog::priority_index;
use crate::models::ModelDescriptor;

/// Consecutive successful uses of one model required for one usage credit.
pub const CONSECUTIVE_USAGE_THRESHOLD: u32 = 3;

/// Strategy used to order the model picker.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OrderMode {
    #[default]
    Default,
    Usage,
    Custom,
}

/// Direction for a manual reorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
}

/// The current streak of successful uses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsecutiveUsage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
    #[serde(default)]
    pub count: u32,
}

/// Anything that can be ordered in the model picker.
pub trait ModelId {
    fn model_id(&self) -> &str;
}

impl ModelId for String {
    fn model_id(&self) -> &str {
        self
    }
}

impl ModelId for &str {
    fn model_id(&self) -> &str {
        self
    }
}

impl ModelId for ModelDescriptor {
    fn model_id(&self) -> &str {
        &self.id
    }
}

/// Persisted usage and ordering state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelUsageState {
    pub usage_stats: HashMap<String, u64>,
    #[serde(rename = "consecutiveModelUsage")]
    pub consecutive_usage: ConsecutiveUsage,
    pub order_mode: OrderMode,
    #[serde(rename = "customModelOrder")]
    pub custom_order: Vec<String>,
}

impl ModelUsageState {
    /// Record one successfully completed assistant turn.
    ///
    /// Returns `true` when the streak crossed the threshold and the model was
    /// credited. Switching models mid-streak discards the partial streak.
    pub fn record_successful_use(&mut self, model_id: &str) -> bool {
        let streak = &mut self.consecutive_usage;
        if streak.model_id.as_deref() == Some(model_id) {
            streak.count += 1;
        } else {
            streak.model_id = Some(model_id.to_string());
            streak.count = 1;
        }

        if streak.count >= CONSECUTIVE_USAGE_THRESHOLD {
            streak.count = 0;
            let total = self.usage_stats.entry(model_id.to_string()).or_insert(0);
            *total += 1;
            debug!(model = model_id, total = *total, "Usage threshold reached");
            return true;
        }
        false
    }

    /// Usage credit for a model (0 when never credited).
    pub fn usage_count(&self, model_id: &str) -> u64 {
        self.usage_stats.get(model_id).copied().unwrap_or(0)
    }

    /// Order `models` with the given strategy.
    ///
    /// The default priority is the built-in catalogue order whatever registry
    /// supplied `models`. Ids outside that catalogue follow it in the order
    /// `models` lists them.
    pub fn order<T: ModelId + Clone>(&self, models: &[T], mode: OrderMode) -> Vec<T> {
        let mut ordered = default_order(models);
        match mode {
            OrderMode::Default => {}
            OrderMode::Usage => {
                // Stable: ties keep the default order established above.
                ordered.sort_by(|a, b| {
                    self.usage_count(b.model_id())
                        .cmp(&self.usage_count(a.model_id()))
                });
            }
            OrderMode::Custom => {
                if !self.custom_order.is_empty() {
                    ordered.sort_by_key(|m| {
                        self.custom_order
                            .iter()
                            .position(|id| id == m.model_id())
                            .unwrap_or(usize::MAX)
                    });
                }
            }
        }
        ordered
    }

    /// Order `models` with the current mode.
    pub fn ordered<T: ModelId + Clone>(&self, models: &[T]) -> Vec<T> {
        self.order(models, self.order_mode)
    }

    pub fn can_move_up<T: ModelId + Clone>(&self, models: &[T], model_id: &str) -> bool {
        self.position(models, model_id).is_some_and(|idx| idx > 0)
    }

    pub fn can_move_down<T: ModelId + Clone>(&self, models: &[T], model_id: &str) -> bool {
        self.position(models, model_id)
            .is_some_and(|idx| idx + 1 < models.len())
    }

    /// Swap `model_id` with its neighbor in the current effective order.
    ///
    /// The result becomes the custom order and the mode switches to
    /// [`OrderMode::Custom`]. Returns `false` (no change) at the boundary or
    /// for unknown ids.
    pub fn move_model<T: ModelId + Clone>(
        &mut self,
        models: &[T],
        model_id: &str,
        direction: MoveDirection,
    ) -> bool {
        let ordered = self.ordered(models);
        let Some(idx) = ordered.iter().position(|m| m.model_id() == model_id) else {
            return false;
        };
        let target = match direction {
            MoveDirection::Up if idx > 0 => idx - 1,
            MoveDirection::Down if idx + 1 < ordered.len() => idx + 1,
            _ => return false,
        };

        let mut ids: Vec<String> = ordered.iter().map(|m| m.model_id().to_string()).collect();
        ids.swap(idx, target);
        // Keep custom entries for models outside this list.
        for id in &self.custom_order {
            if !ids.contains(id) {
                ids.push(id.clone());
            }
        }
        self.custom_order = ids;
        self.order_mode = OrderMode::Custom;
        true
    }

    pub fn set_order_mode(&mut self, mode: OrderMode) {
        self.order_mode = mode;
    }

    pub fn set_custom_order(&mut self, order: Vec<String>) {
        self.custom_order = order;
    }

    /// Clear usage credit and custom order and return to default ordering.
    ///
    /// The in-progress streak is left alone.
    pub fn reset(&mut self) {
        self.usage_stats.clear();
        self.custom_order.clear();
        self.order_mode = OrderMode::Default;
    }

    fn position<T: ModelId + Clone>(&self, models: &[T], model_id: &str) -> Option<usize> {
        self.ordered(models)
            .iter()
            .position(|m| m.model_id() == model_id)
    }
}

/// Stable sort by canonical catalogue position; unlisted models go last in
/// their input order.
fn default_order<T: ModelId + Clone>(models: &[T]) -> Vec<T> {
    let mut ordered = models.to_vec();
    ordered.sort_by_key(|m| priority_index(m.model_id()).unwrap_or(usize::MAX));
    ordered
}
