//! Settings repository implementation

use crate::error::Result;
use crate::models::{SyncSettings, SyncStatus};
use crate::transport::SyncTarget;
use libsql::Connection;
use serde_json::Value;

const KEY_TARGET: &str = "sync_target";
const KEY_LAST_SYNCED_AT: &str = "last_synced_at";
const KEY_LAST_STATUS: &str = "last_sync_status";
const KEY_LAST_ERROR: &str = "last_sync_error";

/// Trait for settings storage operations (async)
#[allow(async_fn_in_trait)]
pub trait SettingsRepository {
    /// Load settings from the database
    async fn load(&self) -> Result<SyncSettings>;

    /// Save settings to the database
    async fn save(&self, settings: &SyncSettings) -> Result<()>;
}

/// libSQL implementation of `SettingsRepository`
pub struct LibSqlSettingsRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlSettingsRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl SettingsRepository for LibSqlSettingsRepository<'_> {
    async fn load(&self) -> Result<SyncSettings> {
        let mut settings = SyncSettings::default();

        // Unreadable values fall back to defaults
        if let Some(value) = self.get_setting(KEY_TARGET).await? {
            match serde_json::from_str::<SyncTarget>(&value) {
                Ok(target) => settings.target = Some(target),
                Err(error) => tracing::warn!("Ignoring unreadable sync target setting: {error}"),
            }
        }

        if let Some(value) = self.get_setting(KEY_LAST_SYNCED_AT).await? {
            settings.last_synced_at = value.parse().ok();
        }

        if let Some(value) = self.get_setting(KEY_LAST_STATUS).await? {
            settings.last_status =
                serde_json::from_value::<SyncStatus>(Value::String(value)).unwrap_or_default();
        }

        settings.last_error = self.get_setting(KEY_LAST_ERROR).await?;

        Ok(settings)
    }

    async fn save(&self, settings: &SyncSettings) -> Result<()> {
        match &settings.target {
            Some(target) => {
                self.set_setting(KEY_TARGET, &serde_json::to_string(target)?)
                    .await?;
            }
            None => self.delete_setting(KEY_TARGET).await?,
        }

        match settings.last_synced_at {
            Some(at) => self.set_setting(KEY_LAST_SYNCED_AT, &at.to_string()).await?,
            None => self.delete_setting(KEY_LAST_SYNCED_AT).await?,
        }

        let status = serde_json::to_string(&settings.last_status)?;
        self.set_setting(KEY_LAST_STATUS, status.trim_matches('"'))
            .await?;

        match &settings.last_error {
            Some(message) => self.set_setting(KEY_LAST_ERROR, message).await?,
            None => self.delete_setting(KEY_LAST_ERROR).await?,
        }
        Ok(())
    }
}

impl LibSqlSettingsRepository<'_> {
    async fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let mut rows = self
            .conn
            .query("SELECT value FROM settings WHERE key = ?", [key])
            .await?;

        if let Some(row) = rows.next().await? {
            let value: String = row.get(0)?;
            Ok(Some(value))
        } else {
            Ok(None)
        }
    }

    async fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO settings (key, value) VALUES (?, ?)",
                [key, value],
            )
            .await?;
        Ok(())
    }

    async fn delete_setting(&self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM settings WHERE key = ?", [key])
            .await?;
        Ok(())
    }
}
