//! Database layer for Larder

mod connection;
mod migrations;
mod settings_repository;
mod store;

pub use connection::Database;
pub use settings_repository::{LibSqlSettingsRepository, SettingsRepository};
pub use store::{LibSqlStore, LocalStore, SyncSettingsStore};
