//! End-to-end sync cycles against an in-memory store and transport.

use larder_core::db::{LibSqlStore, LocalStore};
use larder_core::sync::{encode_payload, read_remote_snapshot, SyncEngine};
use larder_core::transport::MemoryTransport;
use larder_core::{Error, Ingredient, Recipe, Result, SyncData, SyncRecord, TransportError};
use pretty_assertions::assert_eq;
use serde_json::json;

fn ingredient(id: &str, name: &str, updated_at: i64) -> Ingredient {
    Ingredient {
        id: id.to_string(),
        name: name.to_string(),
        category: None,
        default_unit: None,
        updated_at,
        is_deleted: false,
        extra: serde_json::Map::new(),
    }
}

fn snapshot_bytes(ingredients: Vec<Ingredient>, last_modified: i64) -> Vec<u8> {
    encode_payload(&SyncData {
        ingredients,
        last_modified,
        ..SyncData::empty()
    })
    .unwrap()
}

/// Store whose reads work but whose commit always fails
struct CommitFailsStore {
    inner: LibSqlStore,
}

impl LocalStore for CommitFailsStore {
    async fn read_all<R: SyncRecord>(&self) -> Result<Vec<R>> {
        self.inner.read_all().await
    }

    async fn read_last_modified(&self) -> Result<i64> {
        self.inner.read_last_modified().await
    }

    async fn commit(&self, _merged: &SyncData) -> Result<i64> {
        Err(Error::Database("disk I/O error".to_string()))
    }
}

async fn engine() -> SyncEngine<LibSqlStore, MemoryTransport> {
    let store = LibSqlStore::open_in_memory().await.unwrap();
    SyncEngine::new(store, MemoryTransport::new())
}

#[tokio::test(flavor = "multi_thread")]
async fn remote_newer_record_wins() {
    let engine = engine().await;
    engine.store().save(&ingredient("1", "Original", 1000)).await.unwrap();
    let target = engine
        .transport()
        .insert_file("home.mealsync", snapshot_bytes(vec![ingredient("1", "Updated", 2000)], 2000));

    let outcome = engine.perform_sync(&target).await.unwrap();

    assert_eq!(outcome.merged.ingredients, vec![ingredient("1", "Updated", 2000)]);
    assert_eq!(outcome.merged.last_modified, 2000);
    assert_eq!(outcome.updated_target, Some(target));
    assert_eq!(engine.transport().upload_count(), 1);

    let local: Ingredient = engine.store().get("1").await.unwrap().unwrap();
    assert_eq!(local.name, "Updated");
    assert_eq!(engine.store().read_last_modified().await.unwrap(), 2000);
}

#[tokio::test(flavor = "multi_thread")]
async fn identical_data_skips_upload() {
    let engine = engine().await;
    engine.store().save(&ingredient("1", "Salt", 1000)).await.unwrap();
    let target = engine
        .transport()
        .insert_file("home.mealsync", snapshot_bytes(vec![ingredient("1", "Salt", 1000)], 1000));

    let outcome = engine.perform_sync(&target).await.unwrap();

    assert_eq!(outcome.updated_target, None);
    assert_eq!(engine.transport().upload_count(), 0);
    assert_eq!(engine.transport().download_count(), 1);
    assert_eq!(outcome.merged.ingredients, vec![ingredient("1", "Salt", 1000)]);
}

#[tokio::test(flavor = "multi_thread")]
async fn invalid_payload_leaves_store_untouched() {
    let engine = engine().await;
    engine.store().save(&ingredient("1", "Salt", 1000)).await.unwrap();
    let before = engine.store().read_snapshot().await.unwrap();
    let target = engine.transport().insert_file(
        "home.mealsync",
        serde_json::to_vec(&json!({ "invalid": "structure" })).unwrap(),
    );

    let result = engine.perform_sync(&target).await;

    assert!(matches!(result, Err(Error::Format(_))));
    assert_eq!(engine.store().read_snapshot().await.unwrap(), before);
    assert_eq!(engine.transport().upload_count(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn local_record_wins_timestamp_tie() {
    let engine = engine().await;
    engine.store().save(&ingredient("1", "Local", 1000)).await.unwrap();
    let target = engine
        .transport()
        .insert_file("home.mealsync", snapshot_bytes(vec![ingredient("1", "Remote", 1000)], 900));

    let outcome = engine.perform_sync(&target).await.unwrap();

    assert_eq!(outcome.merged.ingredients, vec![ingredient("1", "Local", 1000)]);
    let uploaded = read_remote_snapshot(&engine.transport().contents(&target).unwrap()).unwrap();
    assert_eq!(uploaded.ingredients, vec![ingredient("1", "Local", 1000)]);
    assert_eq!(uploaded.last_modified, 1000);
}

#[tokio::test(flavor = "multi_thread")]
async fn deletions_are_kept_locally_but_not_uploaded() {
    let engine = engine().await;
    engine.store().save(&ingredient("keep", "Oil", 1000)).await.unwrap();
    engine.store().save(&ingredient("drop", "Lard", 1000)).await.unwrap();
    engine.store().soft_delete::<Ingredient>("drop").await.unwrap();
    let target = engine.transport().insert_file(
        "home.mealsync",
        snapshot_bytes(vec![ingredient("drop", "Lard", 1000)], 1000),
    );

    let outcome = engine.perform_sync(&target).await.unwrap();

    assert_eq!(outcome.merged.tombstone_count(), 1);
    let local: Vec<Ingredient> = engine.store().read_all().await.unwrap();
    assert!(local.iter().any(|record| record.id == "drop" && record.is_deleted()));

    let uploaded = read_remote_snapshot(&engine.transport().contents(&target).unwrap()).unwrap();
    assert_eq!(uploaded.tombstone_count(), 0);
    assert_eq!(uploaded.ingredients, vec![ingredient("keep", "Oil", 1000)]);
}

#[tokio::test(flavor = "multi_thread")]
async fn auth_expiry_surfaces_without_local_changes() {
    let engine = engine().await;
    engine.store().save(&ingredient("1", "Salt", 1000)).await.unwrap();
    let target = engine
        .transport()
        .insert_file("home.mealsync", snapshot_bytes(vec![ingredient("2", "Oil", 5000)], 5000));
    engine
        .transport()
        .fail_next(TransportError::AuthExpired("session expired".to_string()));

    let error = engine.perform_sync(&target).await.unwrap_err();

    assert!(error.is_auth_expired());
    let local: Vec<Ingredient> = engine.store().read_all().await.unwrap();
    assert_eq!(local, vec![ingredient("1", "Salt", 1000)]);
    assert_eq!(engine.store().read_last_modified().await.unwrap(), 1000);
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_upload_is_sent_after_next_local_edit() {
    let engine = engine().await;
    engine.store().save(&ingredient("1", "Salt", 1000)).await.unwrap();
    let target = engine
        .transport()
        .insert_file("home.mealsync", snapshot_bytes(vec![ingredient("2", "Oil", 3000)], 3000));
    engine
        .transport()
        .fail_next_upload(TransportError::Request("connection reset".to_string()));

    let error = engine.perform_sync(&target).await.unwrap_err();
    assert!(matches!(error, Error::Transport(TransportError::Request(_))));
    assert!(!error.is_auth_expired());

    // The merge was committed before the upload failed
    let local: Vec<Ingredient> = engine.store().read_all().await.unwrap();
    assert_eq!(local.len(), 2);
    assert_eq!(engine.store().read_last_modified().await.unwrap(), 3000);
    let stale = read_remote_snapshot(&engine.transport().contents(&target).unwrap()).unwrap();
    assert_eq!(stale.ingredients.len(), 1);

    // Local and remote lastModified now agree, so only a newer local edit
    // pushes the merged data out again
    engine.store().save(&ingredient("3", "Flour", 4000)).await.unwrap();
    let retried = engine.perform_sync(&target).await.unwrap();
    assert_eq!(retried.updated_target, Some(target.clone()));
    let uploaded = read_remote_snapshot(&engine.transport().contents(&target).unwrap()).unwrap();
    assert_eq!(uploaded.ingredients.len(), 3);
    assert_eq!(uploaded.last_modified, 4000);
}

#[tokio::test(flavor = "multi_thread")]
async fn second_sync_is_a_no_op() {
    let engine = engine().await;
    engine.store().save(&ingredient("1", "Salt", 1000)).await.unwrap();
    let target = engine
        .transport()
        .insert_file("home.mealsync", snapshot_bytes(vec![ingredient("2", "Oil", 2000)], 2000));

    let first = engine.perform_sync(&target).await.unwrap();
    let second = engine.perform_sync(&target).await.unwrap();

    assert_eq!(engine.transport().upload_count(), 1);
    assert_eq!(second.updated_target, None);

    let mut first_records = first.merged.ingredients;
    let mut second_records = second.merged.ingredients;
    first_records.sort_by(|a, b| a.id.cmp(&b.id));
    second_records.sort_by(|a, b| a.id.cmp(&b.id));
    assert_eq!(first_records, second_records);
}

#[tokio::test(flavor = "multi_thread")]
async fn legacy_remote_recipe_is_migrated() {
    let engine = engine().await;
    let payload = json!({
        "recipes": [{
            "id": "r1",
            "name": "Pancakes",
            "ingredients": [{ "name": "Flour", "quantity": 200, "unit": "g" }],
            "instructions": ["Mix", "Fry"],
            "totalTime": 25,
            "updatedAt": 1500
        }],
        "ingredients": [],
        "mealPlans": [],
        "lastModified": 1500,
        "version": 1
    });
    let target = engine
        .transport()
        .insert_file("home.mealsync", serde_json::to_vec(&payload).unwrap());

    engine.perform_sync(&target).await.unwrap();

    let recipe: Recipe = engine.store().get("r1").await.unwrap().unwrap();
    assert_eq!(recipe.prep_time, 13);
    assert_eq!(recipe.cook_time, 12);
    assert_eq!(recipe.sections.len(), 1);
    assert_eq!(recipe.sections[0].instructions, vec!["Mix", "Fry"]);
    assert_eq!(recipe.sections[0].ingredients[0].name, "Flour");
    assert_eq!(engine.store().read_last_modified().await.unwrap(), 1500);
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_commit_skips_upload() {
    let inner = LibSqlStore::open_in_memory().await.unwrap();
    inner.save(&ingredient("1", "Salt", 1000)).await.unwrap();
    let engine = SyncEngine::new(CommitFailsStore { inner }, MemoryTransport::new());
    let target = engine
        .transport()
        .insert_file("home.mealsync", snapshot_bytes(vec![ingredient("2", "Oil", 2000)], 2000));

    let error = engine.perform_sync(&target).await.unwrap_err();

    assert!(matches!(error, Error::Database(_)));
    assert_eq!(engine.transport().download_count(), 1);
    assert_eq!(engine.transport().upload_count(), 0);
    let remote = read_remote_snapshot(&engine.transport().contents(&target).unwrap()).unwrap();
    assert_eq!(remote.ingredients, vec![ingredient("2", "Oil", 2000)]);
}
