//! Data models for Larder

mod grocery;
mod ingredient;
pub(crate) mod lenient;
mod meal_plan;
mod recipe;
mod record;
mod settings;
mod snapshot;

pub use grocery::{GroceryItem, GroceryList};
pub use ingredient::Ingredient;
pub use meal_plan::{MealPlan, MealType};
pub use recipe::{Recipe, RecipeIngredient, RecipeSection};
pub use record::{new_record_id, Collection, SyncRecord};
pub use settings::{SyncSettings, SyncStatus};
pub use snapshot::{SyncData, SNAPSHOT_VERSION};
