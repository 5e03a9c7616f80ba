use crate::error::{DataflowError, Result};
use file_guard::{FileGuard, Lock};
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::OwnedMutexGuard;

pub const RESTORE_LOCK_FILE: &str = "dflow-restore.lock";

/// One writer slot per dataset root.
///
/// Waiters are served in the order they asked; writers on different roots
/// never share a slot.
#[derive(Debug, Default)]
pub struct RootLocks {
    roots: Mutex<HashMap<PathBuf, Arc<tokio::sync::Mutex<()>>>>,
}

impl RootLocks {
    pub async fn acquire(&self, root: &Path) -> OwnedMutexGuard<()> {
        let slot = {
            let mut roots = self.roots.lock().unwrap_or_else(|e| e.into_inner());
            roots.entry(root.to_path_buf()).or_default().clone()
        };

        slot.lock_owned().await
    }
}

/// Advisory lock held against other processes restoring into the same
/// repository.
pub struct ProcessLock {
    _guard: FileGuard<Box<File>>,
}

impl ProcessLock {
    /// Takes the lock without waiting; a held lock is a `WriteConflict`.
    pub fn try_acquire(git_dir: &Path, root: &Path, path: &str) -> Result<Self> {
        let lock_path = git_dir.join(RESTORE_LOCK_FILE);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|source| DataflowError::Io {
                root: root.to_path_buf(),
                path: lock_path.clone(),
                source,
            })?;

        let guard = file_guard::try_lock(Box::new(file), Lock::Exclusive, 0, 1).map_err(|e| {
            DataflowError::WriteConflict {
                root: root.to_path_buf(),
                path: path.to_string(),
                detail: format!("{lock_path:?} is held by another process: {e}"),
            }
        })?;

        Ok(ProcessLock { _guard: guard })
    }
}
