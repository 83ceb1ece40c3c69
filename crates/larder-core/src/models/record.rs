//! The contract every synchronized entity satisfies

use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

/// The five synchronized collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Recipes,
    Ingredients,
    MealPlans,
    GroceryLists,
    GroceryItems,
}

impl Collection {
    pub const ALL: [Self; 5] = [
        Self::Recipes,
        Self::Ingredients,
        Self::MealPlans,
        Self::GroceryLists,
        Self::GroceryItems,
    ];

    /// Table holding this collection in the local store
    #[must_use]
    pub const fn table_name(self) -> &'static str {
        match self {
            Self::Recipes => "recipes",
            Self::Ingredients => "ingredients",
            Self::MealPlans => "meal_plans",
            Self::GroceryLists => "grocery_lists",
            Self::GroceryItems => "grocery_items",
        }
    }

    /// Field name of this collection in a serialized snapshot
    #[must_use]
    pub const fn wire_name(self) -> &'static str {
        match self {
            Self::Recipes => "recipes",
            Self::Ingredients => "ingredients",
            Self::MealPlans => "mealPlans",
            Self::GroceryLists => "groceryLists",
            Self::GroceryItems => "groceryItems",
        }
    }
}

/// A record that takes part in last-write-wins sync.
///
/// `updated_at` is a Unix millisecond timestamp set on every mutation and is
/// the only signal used to resolve conflicts. Deleted records stay in their
/// collection as tombstones.
pub trait SyncRecord: Clone + Serialize + DeserializeOwned {
    /// Collection this record type lives in
    const COLLECTION: Collection;

    /// Identifier, unique within the collection
    fn id(&self) -> &str;

    /// Logical write time (Unix ms)
    fn updated_at(&self) -> i64;

    /// Tombstone flag
    fn is_deleted(&self) -> bool;

    /// Turn this record into a tombstone written at `at`
    fn mark_deleted(&mut self, at: i64);

    /// Bump `updated_at` after an edit
    fn touch(&mut self);
}

/// Generate a new time-sortable record identifier (UUID v7).
#[must_use]
pub fn new_record_id() -> String {
    Uuid::now_v7().to_string()
}

#[allow(clippy::trivially_copy_pass_by_ref)]
pub(crate) const fn is_false(value: &bool) -> bool {
    !*value
}

macro_rules! impl_sync_record {
    ($ty:ty, $collection:expr) => {
        impl $crate::models::SyncRecord for $ty {
            const COLLECTION: $crate::models::Collection = $collection;

            fn id(&self) -> &str {
                &self.id
            }

            fn updated_at(&self) -> i64 {
                self.updated_at
            }

            fn is_deleted(&self) -> bool {
                self.is_deleted
            }

            fn mark_deleted(&mut self, at: i64) {
                self.is_deleted = true;
                self.updated_at = at;
            }

            fn touch(&mut self) {
                self.updated_at = $crate::util::next_write_time(self.updated_at);
            }
        }
    };
}

pub(crate) use impl_sync_record;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_ids_are_unique() {
        assert_ne!(new_record_id(), new_record_id());
    }

    #[test]
    fn table_and_wire_names_cover_every_collection() {
        let tables: Vec<_> = Collection::ALL.iter().map(|c| c.table_name()).collect();
        assert_eq!(
            tables,
            vec![
                "recipes",
                "ingredients",
                "meal_plans",
                "grocery_lists",
                "grocery_items"
            ]
        );
        assert_eq!(Collection::MealPlans.wire_name(), "mealPlans");
        assert_eq!(Collection::GroceryItems.wire_name(), "groceryItems");
    }
}
