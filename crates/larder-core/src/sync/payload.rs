//! Wire codec and structural validation for remote snapshots
//!
//! A snapshot travels as gzip-compressed JSON. Anything downloaded must pass
//! [`validate_snapshot`] before it is merged; the validator is the only way to
//! obtain a [`RawSnapshot`], and a `RawSnapshot` is the only way to a remote
//! [`SyncData`].

use std::io::{Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::migrate::{migrate_recipe, VersionedRecipe};
use crate::error::{FormatError, Result};
use crate::models::{
    Collection, GroceryItem, GroceryList, Ingredient, MealPlan, SyncData, SNAPSHOT_VERSION,
};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Collections that every snapshot since the first release carries.
const REQUIRED_COLLECTIONS: [Collection; 3] = [
    Collection::Recipes,
    Collection::Ingredients,
    Collection::MealPlans,
];

/// A downloaded snapshot that passed validation but whose recipes may still
/// be in a legacy layout.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSnapshot {
    pub recipes: Vec<VersionedRecipe>,
    pub meal_plans: Vec<MealPlan>,
    pub ingredients: Vec<Ingredient>,
    pub grocery_lists: Vec<GroceryList>,
    pub grocery_items: Vec<GroceryItem>,
    pub last_modified: i64,
    pub version: i64,
}

impl RawSnapshot {
    /// Migrate every recipe into the current layout.
    #[must_use]
    pub fn migrate(self) -> SyncData {
        SyncData {
            recipes: self.recipes.into_iter().map(migrate_recipe).collect(),
            meal_plans: self.meal_plans,
            ingredients: self.ingredients,
            grocery_lists: self.grocery_lists,
            grocery_items: self.grocery_items,
            last_modified: self.last_modified,
            version: self.version,
        }
    }
}

/// Serialize a snapshot for upload.
pub fn encode_payload(snapshot: &SyncData) -> Result<Vec<u8>> {
    let json = serde_json::to_vec(snapshot)?;
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&json)?;
    Ok(encoder.finish()?)
}

/// Decode downloaded bytes into JSON.
///
/// Gzip is detected by its magic bytes; plain JSON is accepted as well.
pub fn decode_payload(bytes: &[u8]) -> std::result::Result<Value, FormatError> {
    if bytes.starts_with(&GZIP_MAGIC) {
        let mut json = Vec::new();
        GzDecoder::new(bytes)
            .read_to_end(&mut json)
            .map_err(|error| FormatError::new(format!("corrupt gzip stream: {error}")))?;
        parse_json(&json)
    } else {
        parse_json(bytes)
    }
}

fn parse_json(bytes: &[u8]) -> std::result::Result<Value, FormatError> {
    serde_json::from_slice(bytes)
        .map_err(|error| FormatError::new(format!("payload is not JSON: {error}")))
}

/// Check that a decoded payload is a well-formed snapshot.
///
/// Requires numeric `lastModified` and `version`, plus `recipes`,
/// `ingredients` and `mealPlans` arrays. `groceryLists` and `groceryItems`
/// were added later and default to empty when absent, but must be arrays
/// when present. Every record must decode into its entity shape. Unknown
/// fields are ignored.
pub fn validate_snapshot(raw: &Value) -> std::result::Result<RawSnapshot, FormatError> {
    let object = raw
        .as_object()
        .ok_or_else(|| FormatError::new("snapshot must be a JSON object"))?;

    let last_modified = integer_field(object, "lastModified")?;
    let version = integer_field(object, "version")?;
    if version > SNAPSHOT_VERSION {
        tracing::warn!(
            "Snapshot version {version} is newer than supported version {SNAPSHOT_VERSION}; unknown fields will be ignored"
        );
    }

    for collection in REQUIRED_COLLECTIONS {
        if !object.contains_key(collection.wire_name()) {
            return Err(FormatError::new(format!(
                "missing '{}' collection",
                collection.wire_name()
            )));
        }
    }

    Ok(RawSnapshot {
        recipes: records(object, Collection::Recipes)?,
        meal_plans: records(object, Collection::MealPlans)?,
        ingredients: records(object, Collection::Ingredients)?,
        grocery_lists: records(object, Collection::GroceryLists)?,
        grocery_items: records(object, Collection::GroceryItems)?,
        last_modified,
        version,
    })
}

/// Decode, validate and migrate downloaded bytes in one step.
pub fn read_remote_snapshot(bytes: &[u8]) -> std::result::Result<SyncData, FormatError> {
    let value = decode_payload(bytes)?;
    Ok(validate_snapshot(&value)?.migrate())
}

#[allow(clippy::cast_possible_truncation)]
fn integer_field(object: &Map<String, Value>, field: &str) -> std::result::Result<i64, FormatError> {
    let value = object
        .get(field)
        .ok_or_else(|| FormatError::new(format!("missing '{field}'")))?;

    value
        .as_i64()
        .or_else(|| value.as_f64().filter(|n| n.is_finite()).map(|n| n as i64))
        .ok_or_else(|| FormatError::new(format!("'{field}' must be a number")))
}

fn records<T: DeserializeOwned>(
    object: &Map<String, Value>,
    collection: Collection,
) -> std::result::Result<Vec<T>, FormatError> {
    let name = collection.wire_name();
    let Some(value) = object.get(name) else {
        return Ok(Vec::new());
    };
    let items = value
        .as_array()
        .ok_or_else(|| FormatError::new(format!("'{name}' must be an array")))?;

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            T::deserialize(item)
                .map_err(|error| FormatError::new(format!("{name}[{index}]: {error}")))
        })
        .collect()
}
