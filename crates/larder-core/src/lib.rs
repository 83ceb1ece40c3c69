//! larder-core - Core library for Larder
//!
//! This crate contains the meal-planning models, the libSQL-backed local
//! store, and the engine that keeps it in sync with a single remote snapshot
//! file. Interfaces embed it and pick a transport.

pub mod db;
pub mod error;
pub mod models;
pub mod sync;
pub mod transport;
pub mod util;

pub use error::{Error, FormatError, NameValidationError, Result, TransportError};
pub use models::{
    GroceryItem, GroceryList, Ingredient, MealPlan, MealType, Recipe, SyncData, SyncRecord,
};
pub use sync::{SyncEngine, SyncOutcome};
pub use transport::{RemoteTransport, SyncTarget};
