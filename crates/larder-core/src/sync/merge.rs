//! Last-write-wins merge of two snapshots

use std::collections::HashMap;

use crate::models::{SyncData, SyncRecord, SNAPSHOT_VERSION};

/// Merge one collection from both sides.
///
/// Every local record is kept unless the remote side holds the same id with a
/// strictly greater `updated_at`. Remote-only records are added. Equal
/// timestamps keep the local record. Tombstones are ordinary records here, so
/// a newer deletion beats an older edit and a newer edit undeletes.
///
/// The order of the returned records is unspecified.
pub fn merge_collection<R: SyncRecord>(local: &[R], remote: &[R]) -> Vec<R> {
    let mut merged: HashMap<&str, &R> = local
        .iter()
        .map(|record| (record.id(), record))
        .collect();

    for incoming in remote {
        let newer = merged
            .get(incoming.id())
            .map_or(true, |existing| incoming.updated_at() > existing.updated_at());
        if newer {
            merged.insert(incoming.id(), incoming);
        }
    }

    merged.into_values().cloned().collect()
}

/// Merge every collection of two snapshots.
///
/// The result's `last_modified` is the larger of the two inputs.
pub fn merge_snapshot(local: &SyncData, remote: &SyncData) -> SyncData {
    SyncData {
        recipes: merge_collection(&local.recipes, &remote.recipes),
        meal_plans: merge_collection(&local.meal_plans, &remote.meal_plans),
        ingredients: merge_collection(&local.ingredients, &remote.ingredients),
        grocery_lists: merge_collection(&local.grocery_lists, &remote.grocery_lists),
        grocery_items: merge_collection(&local.grocery_items, &remote.grocery_items),
        last_modified: local.last_modified.max(remote.last_modified),
        version: SNAPSHOT_VERSION,
    }
}
