use std::sync::Arc;

use chatroute::models::ModelRegistry;
use chatroute::usage::store::USAGE_FILE_NAME;
use chatroute::usage::{
    FileUsageStore, MemoryUsageStore, ModelUsageState, MoveDirection, OrderMode, UsageStore,
    UsageTracker,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn ids(models: &[chatroute::models::ModelDescriptor]) -> Vec<&str> {
    models.iter().map(|m| m.id.as_str()).collect()
}

#[test]
fn sustained_use_survives_restart() {
    let dir = TempDir::new().unwrap();
    let tracker = UsageTracker::load(Arc::new(FileUsageStore::new(dir.path())));

    for _ in 0..3 {
        tracker.record_successful_use("grok-3");
    }
    tracker.record_successful_use("o3");
    tracker.set_order_mode(OrderMode::Usage);
    assert!(dir.path().join(USAGE_FILE_NAME).exists());

    let reloaded = UsageTracker::load(Arc::new(FileUsageStore::new(dir.path())));
    let state = reloaded.snapshot();
    assert_eq!(state.usage_count("grok-3"), 1);
    assert_eq!(state.usage_count("o3"), 0);
    assert_eq!(state.order_mode, OrderMode::Usage);
    assert_eq!(state.consecutive_usage.model_id.as_deref(), Some("o3"));
    assert_eq!(state.consecutive_usage.count, 1);

    let registry = ModelRegistry::builtin();
    let ordered = reloaded.ordered(registry.list());
    assert_eq!(ordered[0].id, "grok-3");
    // Ties fall back to the canonical order.
    assert_eq!(ordered[1].id, "gpt-4.1");
}

#[test]
fn switching_models_discards_partial_streak() {
    let dir = TempDir::new().unwrap();
    let tracker = UsageTracker::load(Arc::new(FileUsageStore::new(dir.path())));
    for id in ["gpt-4o", "gpt-4o", "o3", "o3", "gpt-4o"] {
        tracker.record_successful_use(id);
    }
    let state = tracker.snapshot();
    assert!(state.usage_stats.is_empty());
    assert_eq!(state.consecutive_usage.model_id.as_deref(), Some("gpt-4o"));
    assert_eq!(state.consecutive_usage.count, 1);
}

#[test]
fn manual_reorder_persists_as_custom_order() {
    let dir = TempDir::new().unwrap();
    let registry = ModelRegistry::builtin();
    let models = registry.list();
    let tracker = UsageTracker::load(Arc::new(FileUsageStore::new(dir.path())));

    assert!(!tracker.can_move_up(models, "gpt-4.1"));
    assert!(!tracker.can_move_up(models, "not-a-model"));
    assert!(tracker.move_model(models, "gpt-4o", MoveDirection::Up));

    let reloaded = UsageTracker::load(Arc::new(FileUsageStore::new(dir.path())));
    assert_eq!(reloaded.order_mode(), OrderMode::Custom);
    let ordered = reloaded.ordered(models);
    assert_eq!(&ids(&ordered)[..3], &["gpt-4o", "gpt-4.1", "gpt-4o-mini"]);

    let last = models.last().unwrap().id.clone();
    assert!(!reloaded.can_move_down(models, &last));
    assert!(!reloaded.move_model(models, &last, MoveDirection::Down));
}

#[test]
fn reset_returns_to_default_order() {
    let dir = TempDir::new().unwrap();
    let registry = ModelRegistry::builtin();
    let tracker = UsageTracker::load(Arc::new(FileUsageStore::new(dir.path())));
    for _ in 0..3 {
        tracker.record_successful_use("o1");
    }
    tracker.set_custom_order(vec!["o1".into(), "gpt-5".into()]);
    tracker.set_order_mode(OrderMode::Custom);

    tracker.reset();

    let reloaded = UsageTracker::load(Arc::new(FileUsageStore::new(dir.path())));
    let state = reloaded.snapshot();
    assert!(state.usage_stats.is_empty());
    assert!(state.custom_order.is_empty());
    assert_eq!(state.order_mode, OrderMode::Default);
    assert_eq!(ids(&reloaded.ordered(registry.list())), registry.ids());
}

#[test]
fn loaded_catalogue_orders_known_models_canonically() {
    let registry = ModelRegistry::from_json(
        r#"[{"id": "team-bot"}, {"id": "o3"}, {"id": "house-model"}, {"id": "gpt-4.1"}]"#,
    )
    .unwrap();
    let tracker = UsageTracker::load(Arc::new(MemoryUsageStore::new()));
    assert_eq!(
        ids(&tracker.ordered(registry.list())),
        vec!["gpt-4.1", "o3", "team-bot", "house-model"]
    );
}

#[test]
fn unversioned_record_is_migrated() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join(USAGE_FILE_NAME),
        r#"
orderMode = "custom"
customModelOrder = ["o3", "gpt-4.1", "o3"]

[usageStats]
"o3" = 2
"gpt-4o" = 0

[consecutiveModelUsage]
modelId = "o3"
count = 5
"#,
    )
    .unwrap();

    let state = FileUsageStore::new(dir.path()).load().unwrap().unwrap();
    assert_eq!(state.custom_order, vec!["o3", "gpt-4.1"]);
    assert_eq!(state.usage_count("o3"), 2);
    assert!(!state.usage_stats.contains_key("gpt-4o"));
    assert_eq!(state.consecutive_usage.count, 0);
}

#[test]
fn corrupt_record_starts_fresh() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join(USAGE_FILE_NAME), "not = [valid").unwrap();
    let store = Arc::new(FileUsageStore::new(dir.path()));
    assert!(store.load().is_err());

    let tracker = UsageTracker::load(store);
    assert_eq!(tracker.snapshot(), ModelUsageState::default());
}
