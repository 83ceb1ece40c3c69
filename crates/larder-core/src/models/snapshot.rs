//! Point-in-time snapshot of every synchronized collection

use serde::{Deserialize, Serialize};

use super::{GroceryItem, GroceryList, Ingredient, MealPlan, Recipe, SyncRecord};

/// Serialization schema version written into every uploaded snapshot
pub const SNAPSHOT_VERSION: i64 = 1;

/// A full copy of the five collections plus a high-water-mark timestamp.
///
/// Built fresh for each sync cycle and discarded afterwards; only the records
/// it carries are persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncData {
    pub recipes: Vec<Recipe>,
    pub meal_plans: Vec<MealPlan>,
    pub ingredients: Vec<Ingredient>,
    pub grocery_lists: Vec<GroceryList>,
    pub grocery_items: Vec<GroceryItem>,
    /// Largest `updated_at` seen when the snapshot was taken
    pub last_modified: i64,
    pub version: i64,
}

impl Default for SyncData {
    fn default() -> Self {
        Self::empty()
    }
}

impl SyncData {
    /// The snapshot used when there is nothing on the remote side yet
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            recipes: Vec::new(),
            meal_plans: Vec::new(),
            ingredients: Vec::new(),
            grocery_lists: Vec::new(),
            grocery_items: Vec::new(),
            last_modified: 0,
            version: SNAPSHOT_VERSION,
        }
    }

    /// Copy of this snapshot with every tombstone dropped
    #[must_use]
    pub fn without_tombstones(&self) -> Self {
        Self {
            recipes: live(&self.recipes),
            meal_plans: live(&self.meal_plans),
            ingredients: live(&self.ingredients),
            grocery_lists: live(&self.grocery_lists),
            grocery_items: live(&self.grocery_items),
            last_modified: self.last_modified,
            version: self.version,
        }
    }

    /// Largest `updated_at` across all records, 0 when empty
    #[must_use]
    pub fn max_updated_at(&self) -> i64 {
        [
            max_of(&self.recipes),
            max_of(&self.meal_plans),
            max_of(&self.ingredients),
            max_of(&self.grocery_lists),
            max_of(&self.grocery_items),
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }

    #[must_use]
    pub fn record_count(&self) -> usize {
        self.recipes.len()
            + self.meal_plans.len()
            + self.ingredients.len()
            + self.grocery_lists.len()
            + self.grocery_items.len()
    }

    #[must_use]
    pub fn tombstone_count(&self) -> usize {
        count_deleted(&self.recipes)
            + count_deleted(&self.meal_plans)
            + count_deleted(&self.ingredients)
            + count_deleted(&self.grocery_lists)
            + count_deleted(&self.grocery_items)
    }
}

fn live<R: SyncRecord>(records: &[R]) -> Vec<R> {
    records
        .iter()
        .filter(|record| !record.is_deleted())
        .cloned()
        .collect()
}

fn max_of<R: SyncRecord>(records: &[R]) -> i64 {
    records.iter().map(SyncRecord::updated_at).max().unwrap_or(0)
}

fn count_deleted<R: SyncRecord>(records: &[R]) -> usize {
    records.iter().filter(|record| record.is_deleted()).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_snapshot_has_current_version() {
        let empty = SyncData::empty();
        assert_eq!(empty.last_modified, 0);
        assert_eq!(empty.version, SNAPSHOT_VERSION);
        assert_eq!(empty.record_count(), 0);
        assert_eq!(empty.max_updated_at(), 0);
    }

    #[test]
    fn without_tombstones_keeps_live_records_only() {
        let mut kept = Ingredient::new("salt");
        kept.updated_at = 10;
        let mut gone = Ingredient::new("msg");
        gone.mark_deleted(20);

        let snapshot = SyncData {
            ingredients: vec![kept.clone(), gone],
            last_modified: 20,
            ..SyncData::empty()
        };

        let filtered = snapshot.without_tombstones();
        assert_eq!(filtered.ingredients, vec![kept]);
        assert_eq!(filtered.last_modified, 20);
        assert_eq!(snapshot.tombstone_count(), 1);
        assert_eq!(snapshot.max_updated_at(), 20);
    }

    #[test]
    fn wire_names_are_camel_case() {
        let value = serde_json::to_value(SyncData::empty()).unwrap();
        for key in [
            "recipes",
            "mealPlans",
            "ingredients",
            "groceryLists",
            "groceryItems",
            "lastModified",
            "version",
        ] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
    }
}
