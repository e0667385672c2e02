//! The single owner of [`ModelUsageState`].

use std::sync::{Arc, PoisonError, RwLock};

use tracing::warn;

use super::store::UsageStore;
use super::{ModelId, ModelUsageState, MoveDirection, OrderMode};

/// Applies usage transitions and writes the result back to its store after
/// every mutation.
///
/// Reads always see the latest in-memory state. A failed write is logged and
/// never rolls back the in-memory change.
///
/// Each save runs synchronously under the write lock, so the stored record
/// always matches the newest state even when clones mutate concurrently.
/// The record is a few hundred bytes; callers on an async runtime pay one
/// small blocking write per completed turn.
#[derive(Clone)]
pub struct UsageTracker {
    state: Arc<RwLock<ModelUsageState>>,
    store: Arc<dyn UsageStore>,
}

impl std::fmt::Debug for UsageTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsageTracker")
            .field("state", &self.snapshot())
            .field("store", &"..")
            .finish()
    }
}

impl UsageTracker {
    /// Load state from `store`, starting empty when nothing is stored or the
    /// record cannot be read.
    pub fn load(store: Arc<dyn UsageStore>) -> Self {
        let state = match store.load() {
            Ok(Some(state)) => state,
            Ok(None) => ModelUsageState::default(),
            Err(err) => {
                warn!(error = %err, "Could not load usage state, starting fresh");
                ModelUsageState::default()
            }
        };
        Self {
            state: Arc::new(RwLock::new(state)),
            store,
        }
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> ModelUsageState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn order_mode(&self) -> OrderMode {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .order_mode
    }

    /// Record a completed turn. Returns `true` when usage credit was granted.
    pub fn record_successful_use(&self, model_id: &str) -> bool {
        self.mutate(|state| state.record_successful_use(model_id))
    }

    /// Order `models` with the current mode.
    pub fn ordered<T: ModelId + Clone>(&self, models: &[T]) -> Vec<T> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .ordered(models)
    }

    /// Order `models` with an explicit mode.
    pub fn order<T: ModelId + Clone>(&self, models: &[T], mode: OrderMode) -> Vec<T> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .order(models, mode)
    }

    pub fn can_move_up<T: ModelId + Clone>(&self, models: &[T], model_id: &str) -> bool {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .can_move_up(models, model_id)
    }

    pub fn can_move_down<T: ModelId + Clone>(&self, models: &[T], model_id: &str) -> bool {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .can_move_down(models, model_id)
    }

    pub fn move_model<T: ModelId + Clone>(
        &self,
        models: &[T],
        model_id: &str,
        direction: MoveDirection,
    ) -> bool {
        self.mutate(|state| state.move_model(models, model_id, direction))
    }

    pub fn set_order_mode(&self, mode: OrderMode) {
        self.mutate(|state| state.set_order_mode(mode));
    }

    pub fn set_custom_order(&self, order: Vec<String>) {
        self.mutate(|state| state.set_custom_order(order));
    }

    pub fn reset(&self) {
        self.mutate(ModelUsageState::reset);
    }

    fn mutate<R>(&self, f: impl FnOnce(&mut ModelUsageState) -> R) -> R {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let result = f(&mut *state);
        // Saved before the guard drops so writes land in mutation order.
        if let Err(err) = self.store.save(&state) {
            warn!(error = %err, "Failed to persist usage state");
        }
        result
    }
}
