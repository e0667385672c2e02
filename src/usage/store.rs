use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{ConsecutiveUsage, ModelUsageState, OrderMode, CONSECUTIVE_USAGE_THRESHOLD};
use crate::error::{ChatError, Result};

/// File name of the persisted usage record inside the data directory.
pub const USAGE_FILE_NAME: &str = "model-usage.toml";

/// Current schema version of the persisted record.
pub const USAGE_SCHEMA_VERSION: u32 = 1;

/// Storage abstraction for persisted usage/order state.
pub trait UsageStore: Send + Sync {
    fn load(&self) -> Result<Option<ModelUsageState>>;
    fn save(&self, state: &ModelUsageState) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// File-backed usage store using a versioned TOML record.
///
/// # Example
/// ```no_run
/// use chatroute::usage::{FileUsageStore, ModelUsageState, UsageStore};
///
/// let store = FileUsageStore::new_default();
/// let mut state = ModelUsageState::default();
/// state.record_successful_use("gpt-4.1");
/// store.save(&state)?;
/// # Ok::<(), chatroute::error::ChatError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FileUsageStore {
    path: PathBuf,
}

impl FileUsageStore {
    /// Store `model-usage.toml` inside `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            path: dir.into().join(USAGE_FILE_NAME),
        }
    }

    /// Store inside `~/.chatroute`.
    pub fn new_default() -> Self {
        Self::new(default_data_dir())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_parent(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl UsageStore for FileUsageStore {
    fn load(&self) -> Result<Option<ModelUsageState>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let file: UsageFile =
            toml::from_str(&raw).map_err(|e| ChatError::Storage(e.to_string()))?;
        let file = migrate(file);
        Ok(Some(file.into_state()))
    }

    fn save(&self, state: &ModelUsageState) -> Result<()> {
        Self::ensure_parent(&self.path)?;
        let file = UsageFile::from_state(state);
        let serialized = toml::to_string(&file).map_err(|e| ChatError::Storage(e.to_string()))?;
        fs::write(&self.path, serialized)?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// In-process store, mainly for tests.
#[derive(Debug, Default)]
pub struct MemoryUsageStore {
    state: Mutex<Option<ModelUsageState>>,
}

impl MemoryUsageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: ModelUsageState) -> Self {
        Self {
            state: Mutex::new(Some(state)),
        }
    }

    /// Last saved state.
    pub fn saved(&self) -> Option<ModelUsageState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

impl UsageStore for MemoryUsageStore {
    fn load(&self) -> Result<Option<ModelUsageState>> {
        Ok(self.saved())
    }

    fn save(&self, state: &ModelUsageState) -> Result<()> {
        *self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(state.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = None;
        Ok(())
    }
}

// Plain values precede tables so the record serializes as valid TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageFile {
    #[serde(default)]
    version: u32,
    #[serde(default)]
    order_mode: OrderMode,
    #[serde(default)]
    custom_model_order: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    saved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    usage_stats: HashMap<String, u64>,
    #[serde(default)]
    consecutive_model_usage: ConsecutiveUsage,
}

impl UsageFile {
    fn from_state(state: &ModelUsageState) -> Self {
        Self {
            version: USAGE_SCHEMA_VERSION,
            order_mode: state.order_mode,
            custom_model_order: state.custom_order.clone(),
            saved_at: Some(Utc::now()),
            usage_stats: state.usage_stats.clone(),
            consecutive_model_usage: state.consecutive_usage.clone(),
        }
    }

    fn into_state(self) -> ModelUsageState {
        ModelUsageState {
            usage_stats: self.usage_stats,
            consecutive_usage: self.consecutive_model_usage,
            order_mode: self.order_mode,
            custom_order: self.custom_model_order,
        }
    }
}

/// Bring an older record up to the current schema.
fn migrate(mut file: UsageFile) -> UsageFile {
    if file.version > USAGE_SCHEMA_VERSION {
        warn!(
            version = file.version,
            supported = USAGE_SCHEMA_VERSION,
            "Usage record is newer than this build, loading best-effort"
        );
        return file;
    }
    if file.version == 0 {
        // Unversioned records could hold duplicate custom entries, zero
        // counters and a streak left at or above the threshold.
        let mut seen = std::collections::HashSet::new();
        file.custom_model_order.retain(|id| seen.insert(id.clone()));
        file.usage_stats.retain(|_, count| *count > 0);
        if file.consecutive_model_usage.count >= CONSECUTIVE_USAGE_THRESHOLD {
            file.consecutive_model_usage.count = 0;
        }
        if file.consecutive_model_usage.model_id.is_none() {
            file.consecutive_model_usage.count = 0;
        }
        info!(from = 0, to = USAGE_SCHEMA_VERSION, "Migrated usage record");
        file.version = USAGE_SCHEMA_VERSION;
    }
    file
}

pub(crate) fn default_data_dir() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".chatroute"))
        .unwrap_or_else(|| PathBuf::from(".chatroute"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn temp_store() -> (TempDir, FileUsageStore) {
        let dir = TempDir::new().unwrap();
        let store = FileUsageStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn missing_file_loads_none() {
        let (_dir, store) = temp_store();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn save_then_load_preserves_state() {
        let (_dir, store) = temp_store();
        let mut state = ModelUsageState::default();
        for _ in 0..4 {
            state.record_successful_use("gpt-4.1");
        }
        state.custom_order = vec!["o3".into(), "gpt-4.1".into()];
        state.order_mode = OrderMode::Usage;
        store.save(&state).unwrap();

        assert_eq!(store.load().unwrap(), Some(state));
    }

    #[test]
    fn saved_record_is_versioned() {
        let (_dir, store) = temp_store();
        store.save(&ModelUsageState::default()).unwrap();
        let raw = fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("version = 1"), "unexpected record: {raw}");
    }

    #[test]
    fn unversioned_record_is_migrated() {
        let (_dir, store) = temp_store();
        fs::write(
            store.path(),
            r#"
orderMode = "custom"
customModelOrder = ["o3", "gpt-4o", "o3"]

[usageStats]
"gpt-4o" = 2
"o1" = 0

[consecutiveModelUsage]
modelId = "gpt-4o"
count = 5
"#,
        )
        .unwrap();

        let state = store.load().unwrap().unwrap();
        assert_eq!(state.custom_order, vec!["o3".to_string(), "gpt-4o".to_string()]);
        assert_eq!(state.usage_count("gpt-4o"), 2);
        assert!(!state.usage_stats.contains_key("o1"));
        assert_eq!(state.consecutive_usage.count, 0);
        assert_eq!(state.order_mode, OrderMode::Custom);
    }

    #[test]
    fn corrupt_record_is_a_storage_error() {
        let (_dir, store) = temp_store();
        fs::write(store.path(), "orderMode = [").unwrap();
        assert!(matches!(store.load(), Err(ChatError::Storage(_))));
    }

    #[test]
    fn clear_removes_record() {
        let (_dir, store) = temp_store();
        store.save(&ModelUsageState::default()).unwrap();
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
        store.clear().unwrap();
    }
}
