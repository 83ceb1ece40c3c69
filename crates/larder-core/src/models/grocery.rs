//! Grocery list and grocery item models

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::record::{impl_sync_record, new_record_id, Collection};
use crate::util::{next_write_time, unix_millis_now};

/// A shopping list, usually covering a planned date range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroceryList {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
    #[serde(default, skip_serializing_if = "super::record::is_false")]
    pub is_deleted: bool,
    /// Fields written by newer clients, carried through sync unchanged
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl_sync_record!(GroceryList, Collection::GroceryLists);

impl GroceryList {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let now = unix_millis_now();
        Self {
            id: new_record_id(),
            name: name.into(),
            start_date: None,
            end_date: None,
            created_at: now,
            updated_at: now,
            is_deleted: false,
            extra: Map::new(),
        }
    }
}

/// One line on a grocery list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroceryItem {
    pub id: String,
    /// Owning `GroceryList`
    pub list_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub checked: bool,
    /// Recipes that contributed this item
    #[serde(default)]
    pub recipe_ids: Vec<String>,
    #[serde(default)]
    pub updated_at: i64,
    #[serde(default, skip_serializing_if = "super::record::is_false")]
    pub is_deleted: bool,
    /// Fields written by newer clients, carried through sync unchanged
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl_sync_record!(GroceryItem, Collection::GroceryItems);

impl GroceryItem {
    #[must_use]
    pub fn new(list_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: new_record_id(),
            list_id: list_id.into(),
            name: name.into(),
            quantity: None,
            unit: None,
            category: None,
            checked: false,
            recipe_ids: Vec::new(),
            updated_at: unix_millis_now(),
            is_deleted: false,
            extra: Map::new(),
        }
    }

    /// Flip the checked state, recording the edit
    pub fn toggle_checked(&mut self) {
        self.checked = !self.checked;
        self.updated_at = next_write_time(self.updated_at);
    }
}
