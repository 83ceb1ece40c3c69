//! Upgrades for recipes written by older app versions
//!
//! Older snapshots stored a recipe's ingredients and instructions as flat
//! top-level lists and kept a single `totalTime`. The current shape groups
//! them into sections and splits the time into preparation and cooking.

use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::models::{Recipe, RecipeIngredient, RecipeSection};

/// A recipe as found in a downloaded snapshot, in whichever shape it was
/// written.
#[derive(Debug, Clone, PartialEq)]
pub enum VersionedRecipe {
    /// Current layout with a `sections` array
    Sectioned(SectionedRecipe),
    /// Legacy layout with top-level `ingredients` / `instructions`
    Flat(FlatRecipe),
}

impl<'de> Deserialize<'de> for VersionedRecipe {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let sectioned = value
            .get("sections")
            .is_some_and(Value::is_array);

        if sectioned {
            serde_json::from_value(value)
                .map(Self::Sectioned)
                .map_err(de::Error::custom)
        } else {
            serde_json::from_value(value)
                .map(Self::Flat)
                .map_err(de::Error::custom)
        }
    }
}

/// Fields shared by every recipe layout
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeDetails {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "crate::models::lenient::optional_whole")]
    pub servings: Option<u32>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
    #[serde(default)]
    pub is_deleted: bool,
}

/// Timing fields in either the split or the legacy single-value form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyTimes {
    #[serde(default, deserialize_with = "crate::models::lenient::optional_whole")]
    pub prep_time: Option<u32>,
    #[serde(default, deserialize_with = "crate::models::lenient::optional_whole")]
    pub cook_time: Option<u32>,
    #[serde(default, deserialize_with = "crate::models::lenient::optional_whole")]
    pub total_time: Option<u32>,
}

/// Preparation and cooking minutes after migration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CookingTimes {
    pub prep_time: u32,
    pub cook_time: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionedRecipe {
    #[serde(flatten)]
    pub details: RecipeDetails,
    pub sections: Vec<RecipeSection>,
    #[serde(flatten)]
    pub times: LegacyTimes,
    /// Unknown fields, kept for the migrated record
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatRecipe {
    #[serde(flatten)]
    pub details: RecipeDetails,
    #[serde(default)]
    pub ingredients: Option<Vec<RecipeIngredient>>,
    #[serde(default)]
    pub instructions: Option<Vec<String>>,
    /// Nested recipes were never carried forward; read only so they are
    /// recognised and dropped.
    #[serde(default)]
    pub sub_recipes: Option<Value>,
    #[serde(flatten)]
    pub times: LegacyTimes,
    /// Unknown fields, kept for the migrated record
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Bring a recipe of any known layout into the current shape.
///
/// Sectioned recipes keep their sections untouched. Flat recipes get exactly
/// one untitled section holding their ingredients and instructions; the
/// legacy top-level lists and `subRecipes` do not survive. Timing is
/// migrated independently by [`migrate_recipe_time`].
pub fn migrate_recipe(recipe: VersionedRecipe) -> Recipe {
    let (details, sections, times, extra) = match recipe {
        VersionedRecipe::Sectioned(sectioned) => (
            sectioned.details,
            sectioned.sections,
            sectioned.times,
            sectioned.extra,
        ),
        VersionedRecipe::Flat(flat) => {
            let section = RecipeSection {
                name: None,
                ingredients: flat.ingredients.unwrap_or_default(),
                instructions: flat.instructions.unwrap_or_default(),
            };
            (flat.details, vec![section], flat.times, flat.extra)
        }
    };
    let CookingTimes {
        prep_time,
        cook_time,
    } = migrate_recipe_time(times);

    Recipe {
        id: details.id,
        name: details.name,
        description: details.description,
        servings: details.servings,
        prep_time,
        cook_time,
        sections,
        tags: details.tags,
        source_url: details.source_url,
        created_at: details.created_at,
        updated_at: details.updated_at,
        is_deleted: details.is_deleted,
        extra,
    }
}

/// Split a legacy `totalTime` into preparation and cooking time.
///
/// Applies only when both split fields are absent: preparation takes the
/// larger half. Missing values default to zero.
pub const fn migrate_recipe_time(times: LegacyTimes) -> CookingTimes {
    match (times.prep_time, times.cook_time, times.total_time) {
        (None, None, Some(total)) => CookingTimes {
            prep_time: total.div_ceil(2),
            cook_time: total / 2,
        },
        (prep, cook, _) => CookingTimes {
            prep_time: match prep {
                Some(minutes) => minutes,
                None => 0,
            },
            cook_time: match cook {
                Some(minutes) => minutes,
                None => 0,
            },
        },
    }
}
