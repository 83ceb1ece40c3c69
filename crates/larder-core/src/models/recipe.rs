//! Recipe model

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::record::{impl_sync_record, new_record_id, Collection};
use crate::util::unix_millis_now;

/// One ingredient line inside a recipe section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeIngredient {
    /// Display name, e.g. "flour"
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Link to a pantry `Ingredient`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingredient_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl RecipeIngredient {
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quantity: None,
            unit: None,
            ingredient_id: None,
            note: None,
        }
    }
}

/// A titled group of ingredients and steps ("For the sauce")
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeSection {
    /// Section heading; `None` for the single untitled section
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<RecipeIngredient>,
    #[serde(default)]
    pub instructions: Vec<String>,
}

/// A recipe in its current (sectioned) shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        default,
        deserialize_with = "super::lenient::optional_whole",
        skip_serializing_if = "Option::is_none"
    )]
    pub servings: Option<u32>,
    /// Preparation time in minutes
    #[serde(default, deserialize_with = "super::lenient::whole")]
    pub prep_time: u32,
    /// Cooking time in minutes
    #[serde(default, deserialize_with = "super::lenient::whole")]
    pub cook_time: u32,
    pub sections: Vec<RecipeSection>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    /// Creation timestamp (Unix ms)
    #[serde(default)]
    pub created_at: i64,
    /// Last update timestamp (Unix ms)
    #[serde(default)]
    pub updated_at: i64,
    /// Soft delete flag for sync
    #[serde(default, skip_serializing_if = "super::record::is_false")]
    pub is_deleted: bool,
    /// Fields written by newer clients, carried through sync unchanged
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl_sync_record!(Recipe, Collection::Recipes);

impl Recipe {
    /// Create an empty recipe with a single untitled section
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let now = unix_millis_now();
        Self {
            id: new_record_id(),
            name: name.into(),
            description: None,
            servings: None,
            prep_time: 0,
            cook_time: 0,
            sections: vec![RecipeSection::default()],
            tags: Vec::new(),
            source_url: None,
            created_at: now,
            updated_at: now,
            is_deleted: false,
            extra: Map::new(),
        }
    }

    #[must_use]
    pub const fn total_time(&self) -> u32 {
        self.prep_time.saturating_add(self.cook_time)
    }

    /// All ingredient lines across sections, in section order
    pub fn ingredients(&self) -> impl Iterator<Item = &RecipeIngredient> {
        self.sections
            .iter()
            .flat_map(|section| section.ingredients.iter())
    }
}
