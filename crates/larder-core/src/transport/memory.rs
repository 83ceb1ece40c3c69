//! In-process transport backed by a map.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{RemoteTransport, SyncTarget};
use crate::error::TransportError;

#[derive(Debug, Default)]
struct MemoryState {
    /// id -> (name, bytes)
    files: HashMap<String, (String, Vec<u8>)>,
    next_id: u64,
    uploads: usize,
    downloads: usize,
    fail_next: Option<TransportError>,
    fail_upload: Option<TransportError>,
}

/// Transport that keeps files in memory and counts calls.
///
/// Useful for tests and for running the app without a remote account.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    state: Mutex<MemoryState>,
}

impl MemoryTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a file directly, bypassing the upload counter.
    pub fn insert_file(&self, name: &str, bytes: Vec<u8>) -> SyncTarget {
        let mut state = self.lock();
        let id = allocate_id(&mut state);
        state
            .files
            .insert(id.clone(), (name.to_string(), bytes));
        SyncTarget::Existing {
            id,
            name: name.to_string(),
        }
    }

    /// Current contents of a target, if it exists
    pub fn contents(&self, target: &SyncTarget) -> Option<Vec<u8>> {
        let id = target.id()?;
        self.lock().files.get(id).map(|(_, bytes)| bytes.clone())
    }

    /// Make the next transport call fail with `error`.
    pub fn fail_next(&self, error: TransportError) {
        self.lock().fail_next = Some(error);
    }

    /// Make the next upload fail with `error`, letting other calls through.
    pub fn fail_next_upload(&self, error: TransportError) {
        self.lock().fail_upload = Some(error);
    }

    pub fn upload_count(&self) -> usize {
        self.lock().uploads
    }

    pub fn download_count(&self) -> usize {
        self.lock().downloads
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn take_failure(state: &mut MemoryState) -> Result<(), TransportError> {
        state.fail_next.take().map_or(Ok(()), Err)
    }
}

fn allocate_id(state: &mut MemoryState) -> String {
    state.next_id += 1;
    format!("mem-{}", state.next_id)
}

impl RemoteTransport for MemoryTransport {
    async fn exists(&self, target: &SyncTarget) -> Result<bool, TransportError> {
        let mut state = self.lock();
        Self::take_failure(&mut state)?;
        Ok(target.id().is_some_and(|id| state.files.contains_key(id)))
    }

    async fn download(&self, target: &SyncTarget) -> Result<Vec<u8>, TransportError> {
        let mut state = self.lock();
        Self::take_failure(&mut state)?;
        state.downloads += 1;
        target
            .id()
            .and_then(|id| state.files.get(id))
            .map(|(_, bytes)| bytes.clone())
            .ok_or_else(|| TransportError::NotFound(target.name().to_string()))
    }

    async fn upload(&self, target: &SyncTarget, bytes: Vec<u8>) -> Result<SyncTarget, TransportError> {
        let mut state = self.lock();
        Self::take_failure(&mut state)?;
        if let Some(error) = state.fail_upload.take() {
            return Err(error);
        }
        state.uploads += 1;

        let id = match target {
            SyncTarget::Existing { id, .. } => id.clone(),
            SyncTarget::New { .. } => allocate_id(&mut state),
        };
        let name = target.name().to_string();
        state.files.insert(id.clone(), (name.clone(), bytes));
        Ok(SyncTarget::Existing { id, name })
    }

    async fn list_names(&self) -> Result<Vec<String>, TransportError> {
        let mut state = self.lock();
        Self::take_failure(&mut state)?;
        let mut names: Vec<String> = state.files.values().map(|(name, _)| name.clone()).collect();
        names.sort();
        Ok(names)
    }
}
