//! Remote file transports the sync engine uploads to and downloads from.

mod memory;
mod r2;

use serde::{Deserialize, Serialize};

use crate::error::{NameValidationError, Result, TransportError};
use crate::sync::naming::{normalize_name, validate_name};

pub use memory::MemoryTransport;
pub use r2::{R2Config, R2Transport};

/// Reference to the remote snapshot file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SyncTarget {
    /// Chosen by the user but not uploaded yet
    New { name: String },
    /// Known to the remote; `id` is the transport's identifier for it
    Existing { id: String, name: String },
}

impl SyncTarget {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::New { name } | Self::Existing { name, .. } => name,
        }
    }

    #[must_use]
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::New { .. } => None,
            Self::Existing { id, .. } => Some(id),
        }
    }
}

/// Opaque byte storage for the snapshot file.
///
/// Implementations own their authentication. Credential expiry must surface
/// as [`TransportError::AuthExpired`].
#[allow(async_fn_in_trait)]
pub trait RemoteTransport {
    /// Whether the target refers to a file that exists remotely
    async fn exists(&self, target: &SyncTarget) -> std::result::Result<bool, TransportError>;

    /// Fetch the file contents
    async fn download(&self, target: &SyncTarget) -> std::result::Result<Vec<u8>, TransportError>;

    /// Store the file contents, returning the (possibly newly assigned) target
    async fn upload(
        &self,
        target: &SyncTarget,
        bytes: Vec<u8>,
    ) -> std::result::Result<SyncTarget, TransportError>;

    /// Names of the sync files already present at the sync location
    async fn list_names(&self) -> std::result::Result<Vec<String>, TransportError>;
}

/// Validate a user-chosen name against the remote location and build a
/// not-yet-created target for it.
///
/// The outer result carries transport failures; the inner one carries name
/// feedback meant for the user.
pub async fn create_target<T: RemoteTransport>(
    transport: &T,
    name: &str,
) -> Result<std::result::Result<SyncTarget, NameValidationError>> {
    let existing = transport.list_names().await?;
    Ok(validate_name(name, &existing).map(|()| SyncTarget::New {
        name: normalize_name(name),
    }))
}
