//! File-based synchronization of the local store with a remote snapshot.

mod engine;
pub mod merge;
pub mod migrate;
pub mod naming;
pub mod payload;

pub use engine::{SyncEngine, SyncOutcome};
pub use merge::{merge_collection, merge_snapshot};
pub use migrate::{migrate_recipe, migrate_recipe_time, VersionedRecipe};
pub use naming::{normalize_name, validate_name, SYNC_FILE_EXTENSION};
pub use payload::{decode_payload, encode_payload, read_remote_snapshot, validate_snapshot};
