//! Pantry ingredient model

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::record::{impl_sync_record, new_record_id, Collection};
use crate::util::unix_millis_now;

/// An ingredient known to the pantry, reused across recipes and grocery lists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    pub id: String,
    pub name: String,
    /// Store aisle or grouping, e.g. "Dairy"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_unit: Option<String>,
    #[serde(default)]
    pub updated_at: i64,
    #[serde(default, skip_serializing_if = "super::record::is_false")]
    pub is_deleted: bool,
    /// Fields written by newer clients, carried through sync unchanged
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl_sync_record!(Ingredient, Collection::Ingredients);

impl Ingredient {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: new_record_id(),
            name: name.into(),
            category: None,
            default_unit: None,
            updated_at: unix_millis_now(),
            is_deleted: false,
            extra: Map::new(),
        }
    }
}
