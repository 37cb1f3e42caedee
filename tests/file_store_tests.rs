use serde_json::json;
use std::sync::{Arc, Mutex};
use stepwise_migrate::{
    FileStore, KeyValueStore, MigrationCase, MigrationRegistry, Migrator, StoredVersion,
};
use tempfile::tempdir;

fn registry_with_counter(hits: &Arc<Mutex<Vec<u32>>>) -> Arc<MigrationRegistry> {
    let registry = Arc::new(MigrationRegistry::with_key_prefix("app"));
    for version in [2, 3] {
        let hits = hits.clone();
        registry
            .register_sync_upgrade_step("prefs", version, move || {
                hits.lock().unwrap().push(version);
                Ok(())
            })
            .unwrap();
    }
    registry
}

#[tokio::test]
async fn recorded_version_survives_restart() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("local_storage.json");
    let hits = Arc::new(Mutex::new(Vec::new()));

    {
        let store = Arc::new(FileStore::open(&path).await.unwrap());
        let migrator = Migrator::new("prefs", registry_with_counter(&hits), store);
        let outcome = migrator.migrate(1).await.unwrap();
        assert_eq!(outcome.case(), MigrationCase::FirstRun);
    }

    {
        let store = Arc::new(FileStore::open(&path).await.unwrap());
        let migrator = Migrator::new("prefs", registry_with_counter(&hits), store);
        let outcome = migrator.migrate(1).await.unwrap();
        assert_eq!(outcome.case(), MigrationCase::Unchanged);
    }

    {
        let store = Arc::new(FileStore::open(&path).await.unwrap());
        let migrator = Migrator::new("prefs", registry_with_counter(&hits), store);
        let outcome = migrator.migrate(3).await.unwrap();
        assert_eq!(outcome.steps_run(), &[2, 3]);
    }

    let store = FileStore::open(&path).await.unwrap();
    assert_eq!(store.get("app.prefs").await.unwrap(), Some("3".to_string()));
    assert_eq!(*hits.lock().unwrap(), vec![2, 3]);

    let on_disk: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(on_disk, json!({ "app.prefs": "3" }));
}

#[tokio::test]
async fn steps_can_rewrite_data_in_the_same_store() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("local_storage.json");

    let store = Arc::new(FileStore::open(&path).await.unwrap());
    store
        .set("BeautifulMigration.todos", "1".to_string())
        .await
        .unwrap();
    store
        .set("todos", json!(["a", "b"]).to_string())
        .await
        .unwrap();

    let registry = Arc::new(MigrationRegistry::new());
    let step_store = store.clone();
    registry
        .register_upgrade_step("todos", 2, move || {
            let store = step_store.clone();
            async move {
                let raw = store.get("todos").await?.unwrap_or_else(|| "[]".to_string());
                let titles: Vec<String> = serde_json::from_str(&raw)?;
                let items: Vec<_> = titles
                    .into_iter()
                    .map(|title| json!({ "title": title, "done": false }))
                    .collect();
                store.set("todos", serde_json::to_string(&items)?).await
            }
        })
        .unwrap();

    let migrator = Migrator::new("todos", registry, store.clone());
    migrator.migrate(2).await.unwrap();

    let reopened = FileStore::open(&path).await.unwrap();
    let todos: serde_json::Value =
        serde_json::from_str(&reopened.get("todos").await.unwrap().unwrap()).unwrap();
    assert_eq!(
        todos,
        json!([
            { "title": "a", "done": false },
            { "title": "b", "done": false }
        ])
    );
    assert_eq!(
        migrator.previous_version().await.unwrap(),
        StoredVersion::Recorded(2)
    );
}
