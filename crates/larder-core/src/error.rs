//! Error types for larder-core

use thiserror::Error;

/// Result type alias using larder-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in larder-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// libSQL error
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Record not found
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Downloaded sync payload failed validation
    #[error(transparent)]
    Format(#[from] FormatError),

    /// Remote transport failure
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl Error {
    /// Whether this error means the remote credentials expired and the user
    /// has to sign in again before retrying.
    pub const fn is_auth_expired(&self) -> bool {
        matches!(self, Self::Transport(TransportError::AuthExpired(_)))
    }
}

/// A remote snapshot payload that could not be trusted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid sync payload: {0}")]
pub struct FormatError(pub String);

impl FormatError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Failures reported by a remote transport.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Credentials are no longer valid; re-authenticate before retrying.
    #[error("Remote authentication expired: {0}")]
    AuthExpired(String),

    /// The remote object does not exist
    #[error("Remote object not found: {0}")]
    NotFound(String),

    /// Any other request failure (network, permission, quota, timeout)
    #[error("Remote request failed: {0}")]
    Request(String),
}

impl TransportError {
    /// Classify an error raised by an underlying transport library.
    ///
    /// Walks the `source()` chain and maps any [`AuthExpired`] marker to
    /// [`TransportError::AuthExpired`], so transports that wrap their own
    /// errors keep the distinction without string matching.
    pub fn classify(error: &(dyn std::error::Error + 'static)) -> Self {
        let mut current = Some(error);
        while let Some(candidate) = current {
            if let Some(marker) = candidate.downcast_ref::<AuthExpired>() {
                return Self::AuthExpired(marker.0.clone());
            }
            if let Some(inner) = candidate.downcast_ref::<Self>() {
                return match inner {
                    Self::AuthExpired(message) => Self::AuthExpired(message.clone()),
                    Self::NotFound(message) => Self::NotFound(message.clone()),
                    Self::Request(message) => Self::Request(message.clone()),
                };
            }
            current = candidate.source();
        }
        Self::Request(error.to_string())
    }
}

/// Marker error a transport implementation can place anywhere in its error
/// chain to signal expired credentials.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("authentication expired: {0}")]
pub struct AuthExpired(pub String);

/// Expected, recoverable feedback about a user-chosen sync file name.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NameValidationError {
    /// Name is empty or whitespace-only
    #[error("Name cannot be empty")]
    Empty,

    /// Name contains a character that remote file systems reject
    #[error("Name cannot contain '{0}'")]
    InvalidCharacter(char),

    /// A file with the same normalized name already exists
    #[error("A sync file named '{0}' already exists")]
    AlreadyExists(String),
}
