//! One sync cycle: download, merge, commit, upload.

use crate::db::{LocalStore, SyncSettingsStore};
use crate::error::{Error, Result};
use crate::models::{SyncData, SyncSettings, SyncStatus};
use crate::transport::{RemoteTransport, SyncTarget};
use crate::util::unix_millis_now;

use super::merge::merge_snapshot;
use super::payload::{encode_payload, read_remote_snapshot};

/// Result of a completed cycle
#[derive(Debug, Clone, PartialEq)]
pub struct SyncOutcome {
    /// Merged snapshot as committed locally, tombstones included
    pub merged: SyncData,
    /// Target returned by the upload, `None` when nothing was uploaded
    pub updated_target: Option<SyncTarget>,
}

impl SyncOutcome {
    #[must_use]
    pub const fn uploaded(&self) -> bool {
        self.updated_target.is_some()
    }
}

/// Synchronizes a local store with a single remote snapshot file.
///
/// The engine holds no state between cycles. Callers must not run two cycles
/// against the same store at once.
pub struct SyncEngine<S, T> {
    store: S,
    transport: T,
}

impl<S: LocalStore, T: RemoteTransport> SyncEngine<S, T> {
    pub const fn new(store: S, transport: T) -> Self {
        Self { store, transport }
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Run one full cycle against `target`.
    ///
    /// A download or validation failure leaves the local store untouched. A
    /// failed upload happens after the commit, so the local store is already
    /// merged and the next cycle uploads again.
    pub async fn perform_sync(&self, target: &SyncTarget) -> Result<SyncOutcome> {
        let local = self.store.read_snapshot().await?;
        tracing::debug!(
            "Local snapshot: {} records, lastModified = {}",
            local.record_count(),
            local.last_modified
        );

        let remote = self.fetch_remote(target).await?;

        let merged = merge_snapshot(&local, &remote);
        let committed = self.store.commit(&merged).await?;
        tracing::debug!("Local lastModified after commit: {committed}");

        if local.last_modified == remote.last_modified {
            tracing::info!(
                "Remote '{}' already matches local data, skipping upload",
                target.name()
            );
            return Ok(SyncOutcome {
                merged,
                updated_target: None,
            });
        }

        let upload = merged.without_tombstones();
        let bytes = encode_payload(&upload)?;
        tracing::info!(
            "Uploading {} records ({} bytes) to '{}'",
            upload.record_count(),
            bytes.len(),
            target.name()
        );
        let updated_target = self.transport.upload(target, bytes).await?;

        Ok(SyncOutcome {
            merged,
            updated_target: Some(updated_target),
        })
    }

    async fn fetch_remote(&self, target: &SyncTarget) -> Result<SyncData> {
        if !self.transport.exists(target).await? {
            tracing::info!("Remote '{}' does not exist yet", target.name());
            return Ok(SyncData::empty());
        }

        let bytes = self.transport.download(target).await?;
        let remote = read_remote_snapshot(&bytes)?;
        tracing::debug!(
            "Remote snapshot: {} records, lastModified = {}",
            remote.record_count(),
            remote.last_modified
        );
        Ok(remote)
    }
}

impl<S: LocalStore + SyncSettingsStore, T: RemoteTransport> SyncEngine<S, T> {
    /// Sync with the target saved in settings and record the result there.
    ///
    /// On success the stored target is replaced by the uploaded one, so a
    /// `New` target becomes `Existing` after its first cycle.
    pub async fn perform_sync_and_record(&self) -> Result<SyncOutcome> {
        let mut settings: SyncSettings = self.store.load_sync_settings().await?;
        let target = settings
            .target
            .clone()
            .ok_or_else(|| Error::InvalidInput("no sync target selected".to_string()))?;

        match self.perform_sync(&target).await {
            Ok(outcome) => {
                if let Some(updated) = &outcome.updated_target {
                    settings.target = Some(updated.clone());
                }
                settings.last_synced_at = Some(unix_millis_now());
                settings.last_status = SyncStatus::Synced;
                settings.last_error = None;
                self.store.save_sync_settings(&settings).await?;
                Ok(outcome)
            }
            Err(error) => {
                tracing::warn!("Sync with '{}' failed: {error}", target.name());
                settings.last_status = if error.is_auth_expired() {
                    SyncStatus::AuthExpired
                } else {
                    SyncStatus::Failed
                };
                settings.last_error = Some(error.to_string());
                if let Err(save_error) = self.store.save_sync_settings(&settings).await {
                    tracing::error!("Failed to record sync failure: {save_error}");
                }
                Err(error)
            }
        }
    }
}
