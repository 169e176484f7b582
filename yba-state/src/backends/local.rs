//! Local file backend
//!
//! State is a JSON file (default `yba.state.json`); the lock is a sibling
//! `.lock` file created exclusively.

use async_trait::async_trait;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::backend::{BackendError, BackendResult, StateBackend};
use crate::lock::LockInfo;
use crate::state::StateFile;

pub struct LocalBackend {
    state_path: PathBuf,
    lock_path: PathBuf,
}

impl LocalBackend {
    pub const DEFAULT_STATE_FILE: &'static str = "yba.state.json";

    pub fn new() -> Self {
        Self::with_path(PathBuf::from(Self::DEFAULT_STATE_FILE))
    }

    pub fn with_path(state_path: impl Into<PathBuf>) -> Self {
        let state_path = state_path.into();
        let lock_path = state_path.with_extension("lock");
        Self {
            state_path,
            lock_path,
        }
    }

    pub fn state_path(&self) -> &Path {
        &self.state_path
    }

    fn read_lock(&self) -> BackendResult<Option<LockInfo>> {
        if !self.lock_path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.lock_path)
            .map_err(|e| BackendError::Io(format!("Failed to read lock file: {}", e)))?;
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| BackendError::InvalidState(format!("Failed to parse lock file: {}", e)))
    }

    fn remove_lock(&self) -> BackendResult<()> {
        std::fs::remove_file(&self.lock_path)
            .map_err(|e| BackendError::Io(format!("Failed to remove lock file: {}", e)))
    }
}

impl Default for LocalBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StateBackend for LocalBackend {
    async fn read_state(&self) -> BackendResult<Option<StateFile>> {
        if !self.state_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.state_path)
            .map_err(|e| BackendError::Io(format!("Failed to read state file: {}", e)))?;
        let state: StateFile = serde_json::from_str(&content).map_err(|e| {
            BackendError::InvalidState(format!("Failed to parse state file: {}", e))
        })?;
        debug!(path = %self.state_path.display(), serial = state.serial, "read state");
        Ok(Some(state))
    }

    async fn write_state(&self, state: &StateFile) -> BackendResult<()> {
        if let Some(stored) = self.read_state().await?
            && stored.lineage != state.lineage
        {
            return Err(BackendError::LineageMismatch {
                expected: stored.lineage,
                actual: state.lineage.clone(),
            });
        }

        let content = serde_json::to_string_pretty(state).map_err(|e| {
            BackendError::Serialization(format!("Failed to serialize state: {}", e))
        })?;

        // Write beside the target, then rename over it
        let tmp_path = self.state_path.with_extension("json.tmp");
        std::fs::write(&tmp_path, content)
            .map_err(|e| BackendError::Io(format!("Failed to write state file: {}", e)))?;
        std::fs::rename(&tmp_path, &self.state_path)
            .map_err(|e| BackendError::Io(format!("Failed to replace state file: {}", e)))?;
        debug!(path = %self.state_path.display(), serial = state.serial, "wrote state");
        Ok(())
    }

    async fn acquire_lock(&self, operation: &str) -> BackendResult<LockInfo> {
        if let Some(existing) = self.read_lock()? {
            if !existing.is_expired() {
                return Err(BackendError::locked(&existing));
            }
            warn!(lock_id = %existing.id, who = %existing.who, "removing expired state lock");
            self.remove_lock()?;
        }

        let lock = LockInfo::new(operation);
        let content = serde_json::to_string_pretty(&lock)
            .map_err(|e| BackendError::Serialization(format!("Failed to serialize lock: {}", e)))?;

        let mut file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.lock_path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                // Another run took the lock between the check and the create
                return match self.read_lock()? {
                    Some(holder) => Err(BackendError::locked(&holder)),
                    None => Err(BackendError::Io("Lock file vanished while acquiring".to_string())),
                };
            }
            Err(e) => return Err(BackendError::Io(format!("Failed to create lock file: {}", e))),
        };
        file.write_all(content.as_bytes())
            .map_err(|e| BackendError::Io(format!("Failed to write lock file: {}", e)))?;

        Ok(lock)
    }

    async fn release_lock(&self, lock: &LockInfo) -> BackendResult<()> {
        let existing = self
            .read_lock()?
            .ok_or_else(|| BackendError::LockNotFound(lock.id.clone()))?;
        if existing.id != lock.id {
            return Err(BackendError::LockMismatch {
                expected: lock.id.clone(),
                actual: existing.id,
            });
        }
        self.remove_lock()
    }

    async fn force_unlock(&self, lock_id: &str) -> BackendResult<()> {
        let existing = self
            .read_lock()?
            .ok_or_else(|| BackendError::LockNotFound(lock_id.to_string()))?;
        if existing.id != lock_id {
            return Err(BackendError::LockMismatch {
                expected: lock_id.to_string(),
                actual: existing.id,
            });
        }
        self.remove_lock()
    }
}
