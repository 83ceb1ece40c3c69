//! Meal plan model

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::record::{impl_sync_record, new_record_id, Collection};
use crate::util::unix_millis_now;

/// Slot of the day a planned meal fills
///
/// Slots this version does not know (added by newer clients) are kept
/// verbatim in [`MealType::Other`] so they survive a sync round trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum MealType {
    Breakfast,
    Lunch,
    #[default]
    Dinner,
    Snack,
    Other(String),
}

impl MealType {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Breakfast => "breakfast",
            Self::Lunch => "lunch",
            Self::Dinner => "dinner",
            Self::Snack => "snack",
            Self::Other(label) => label,
        }
    }
}

impl From<String> for MealType {
    fn from(label: String) -> Self {
        match label.as_str() {
            "breakfast" => Self::Breakfast,
            "lunch" => Self::Lunch,
            "dinner" => Self::Dinner,
            "snack" => Self::Snack,
            _ => Self::Other(label),
        }
    }
}

impl From<MealType> for String {
    fn from(meal_type: MealType) -> Self {
        match meal_type {
            MealType::Other(label) => label,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A calendar entry: one meal on one day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealPlan {
    pub id: String,
    /// Calendar day, `YYYY-MM-DD`
    pub date: String,
    #[serde(default)]
    pub meal_type: MealType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe_id: Option<String>,
    #[serde(
        default,
        deserialize_with = "super::lenient::optional_whole",
        skip_serializing_if = "Option::is_none"
    )]
    pub servings: Option<u32>,
    /// Free-form entry for meals without a recipe ("leftovers")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default)]
    pub updated_at: i64,
    #[serde(default, skip_serializing_if = "super::record::is_false")]
    pub is_deleted: bool,
    /// Fields written by newer clients, carried through sync unchanged
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl_sync_record!(MealPlan, Collection::MealPlans);

impl MealPlan {
    #[must_use]
    pub fn new(date: chrono::NaiveDate, meal_type: MealType) -> Self {
        Self {
            id: new_record_id(),
            date: date.format("%Y-%m-%d").to_string(),
            meal_type,
            recipe_id: None,
            servings: None,
            note: None,
            updated_at: unix_millis_now(),
            is_deleted: false,
            extra: Map::new(),
        }
    }

    /// Parsed calendar day; `None` if the stored date is malformed
    #[must_use]
    pub fn day(&self) -> Option<chrono::NaiveDate> {
        chrono::NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meal_plan_date_roundtrip() {
        let day = chrono::NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
        let plan = MealPlan::new(day, MealType::Lunch);
        assert_eq!(plan.date, "2026-03-09");
        assert_eq!(plan.day(), Some(day));
    }

    #[test]
    fn test_meal_type_wire_format() {
        let json = serde_json::json!({
            "id": "m1",
            "date": "2026-01-01",
            "mealType": "breakfast",
            "updatedAt": 5
        });
        let plan: MealPlan = serde_json::from_value(json).unwrap();
        assert_eq!(plan.meal_type, MealType::Breakfast);
        assert_eq!(plan.meal_type.to_string(), "breakfast");
        assert!(!plan.is_deleted);
    }

    #[test]
    fn test_unknown_meal_type_is_preserved() {
        let json = serde_json::json!({
            "id": "m2",
            "date": "2026-01-02",
            "mealType": "brunch",
            "servings": 2.5,
            "updatedAt": 6
        });
        let plan: MealPlan = serde_json::from_value(json).unwrap();
        assert_eq!(plan.meal_type, MealType::Other("brunch".to_string()));
        assert_eq!(plan.servings, Some(3));

        let encoded = serde_json::to_value(&plan).unwrap();
        assert_eq!(encoded["mealType"], "brunch");
    }
}
