use crate::areas::backend::TrackedPaths;
use crate::artifacts::status::file_change::{ChangeSet, WorkingChange};
use crate::artifacts::status::path_entry::Status;
use derive_new::new;

/// Classifies paths against the tracked set and the backend's change set.
#[derive(new)]
pub struct Inspector<'s> {
    tracked: &'s TrackedPaths,
    changes: &'s ChangeSet,
}

impl<'s> Inspector<'s> {
    /// Status of a file that is present on disk.
    pub fn classify_present(&self, path: &str) -> Status {
        match self.changes.get(path) {
            Some(WorkingChange::Modified) => Status::Modified,
            Some(WorkingChange::Untracked) => Status::Untracked,
            // staged for removal yet still on disk
            Some(WorkingChange::Deleted) => Status::Untracked,
            None if self.tracked.contains(path) => Status::Tracked,
            None => Status::Untracked,
        }
    }

    /// Whether a path missing from disk is a deleted committed file.
    ///
    /// Paths that only ever lived in the index were never committed and
    /// vanish without trace.
    pub fn is_deleted(&self, path: &str) -> bool {
        self.tracked.is_committed(path)
    }

    /// Whether the backend itself saw `path` disappear.
    pub fn reports_deleted(&self, path: &str) -> bool {
        self.changes.get(path) == Some(&WorkingChange::Deleted)
    }
}
