//! Persisted sync settings

use serde::{Deserialize, Serialize};

use crate::transport::SyncTarget;

/// Result of the most recent sync attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// No sync has run yet
    #[default]
    Never,
    /// Last cycle completed
    Synced,
    /// Last cycle failed; retry the whole cycle
    Failed,
    /// Last cycle failed because credentials expired
    AuthExpired,
}

/// Local-only sync preferences and bookkeeping
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Remote file the user chose to sync with
    pub target: Option<SyncTarget>,
    /// Completion time of the last successful cycle (Unix ms)
    pub last_synced_at: Option<i64>,
    pub last_status: SyncStatus,
    /// Error message of the last failed cycle
    pub last_error: Option<String>,
}
