use crate::areas::backend::{GitBackend, TrackedPaths};
use crate::areas::workspace::{ScannedEntry, Workspace};
use crate::artifacts::status::inspector::Inspector;
use crate::artifacts::status::path_entry::{
    EntryKind, PartialScanWarning, PathEntry, Status, ancestors,
};
use crate::error::{DataflowError, Result};
use chrono::{DateTime, Utc};
use derive_new::new;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use tracing::{debug, warn};

/// Point-in-time snapshot of the working tree, sorted by path.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatusInfo {
    pub entries: Vec<PathEntry>,
    pub warnings: Vec<PartialScanWarning>,
}

impl StatusInfo {
    pub fn get(&self, path: &str) -> Option<&PathEntry> {
        self.entries
            .binary_search_by(|entry| entry.path.as_str().cmp(path))
            .ok()
            .map(|i| &self.entries[i])
    }

    pub fn status_of(&self, path: &str) -> Option<Status> {
        self.get(path).map(|entry| entry.status)
    }

    pub fn files(&self) -> impl Iterator<Item = &PathEntry> {
        self.entries.iter().filter(|entry| !entry.is_dir())
    }
}

#[derive(new)]
pub struct StatusResolver<'d> {
    backend: &'d GitBackend,
    workspace: &'d Workspace,
    /// Upper bound of commits scanned for per-path last commits.
    max_log_scan: usize,
    annotate_commits: bool,
}

impl<'d> StatusResolver<'d> {
    pub async fn resolve(&self) -> Result<StatusInfo> {
        let root = self.workspace.path();

        let workspace = self.workspace.clone();
        let scan = tokio::task::spawn_blocking(move || workspace.scan());

        let (tracked, changes) = tokio::try_join!(
            self.backend.list_tracked_paths(root),
            self.backend.working_tree_status(root)
        )?;

        let scan = scan.await.map_err(|e| DataflowError::Io {
            root: root.to_path_buf(),
            path: root.to_path_buf(),
            source: std::io::Error::other(e),
        })?;

        let inspector = Inspector::new(&tracked, &changes);
        let mut entries = BTreeMap::<String, PathEntry>::new();

        for scanned in scan.entries {
            let entry = self.classify_scanned(scanned, &inspector);
            entries.insert(entry.path.clone(), entry);
        }

        let mut warnings = scan.warnings;
        for path in tracked.committed.keys() {
            if entries.contains_key(path)
                || !inspector.is_deleted(path)
                || self.workspace.is_ignored_path(path)
            {
                continue;
            }
            let entry = self.classify_missing(path, &tracked, &inspector);
            warnings.extend(entry.warnings.iter().cloned());
            entries.insert(path.clone(), entry);
        }

        // keep every entry attached to a directory
        let missing_dirs = entries
            .values()
            .filter(|entry| !entry.is_dir())
            .flat_map(|entry| ancestors(&entry.path))
            .filter(|dir| !entries.contains_key(*dir))
            .map(str::to_string)
            .collect::<Vec<_>>();
        for dir in missing_dirs {
            entries
                .entry(dir.clone())
                .or_insert_with(|| PathEntry::directory(dir));
        }

        let has_deleted = entries.values().any(|e| e.status == Status::Deleted);
        if self.annotate_commits || has_deleted {
            self.annotate_last_commits(&mut entries).await?;
        }

        for warning in &warnings {
            warn!(path = %warning.path, message = %warning.message, "partial scan");
        }
        debug!(entries = entries.len(), warnings = warnings.len(), "status resolved");

        Ok(StatusInfo {
            entries: entries.into_values().collect(),
            warnings,
        })
    }

    fn classify_scanned(&self, scanned: ScannedEntry, inspector: &Inspector<'_>) -> PathEntry {
        if scanned.kind == EntryKind::Directory {
            return PathEntry::directory(scanned.path);
        }

        let status = if scanned.warning.is_some() {
            Status::Untracked
        } else {
            inspector.classify_present(&scanned.path)
        };

        let mut entry = PathEntry::file(scanned.path, status)
            .with_size(scanned.size)
            .with_modified(scanned.modified);
        entry.annexed = scanned.annexed;
        if let Some(message) = scanned.warning {
            entry.warnings.push(PartialScanWarning {
                path: entry.path.clone(),
                message,
            });
        }

        entry
    }

    /// Entry for a committed path the scan did not reach.
    ///
    /// Only a path that is gone from disk is deleted. One that is still
    /// there, or cannot be checked, is untracked and carries a warning.
    fn classify_missing(
        &self,
        path: &str,
        tracked: &TrackedPaths,
        inspector: &Inspector<'_>,
    ) -> PathEntry {
        let deleted =
            || PathEntry::file(path, Status::Deleted).with_size(tracked.committed_size(path));
        if inspector.reports_deleted(path) {
            return deleted();
        }

        let on_disk = std::fs::symlink_metadata(self.workspace.path().join(path));
        let (size, modified, message) = match on_disk {
            Err(err) if matches!(err.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => {
                return deleted();
            }
            Err(err) => (None, None, format!("committed path could not be checked: {err}")),
            Ok(metadata) => (
                Some(metadata.len()),
                metadata.modified().ok().map(DateTime::<Utc>::from),
                "committed path is on disk but was not reached by the scan".to_string(),
            ),
        };

        let mut entry = PathEntry::file(path, Status::Untracked)
            .with_size(size)
            .with_modified(modified);
        entry.warnings.push(PartialScanWarning {
            path: path.to_string(),
            message,
        });

        entry
    }

    // Deleted entries always take their committed timestamp; commit ids are
    // only attached when annotation is on.
    async fn annotate_last_commits(&self, entries: &mut BTreeMap<String, PathEntry>) -> Result<()> {
        let last_commits = self
            .backend
            .last_commits(self.workspace.path(), self.max_log_scan)
            .await?;

        for entry in entries.values_mut().filter(|entry| !entry.is_dir()) {
            if let Some((id, committed_at)) = last_commits.get(&entry.path) {
                if self.annotate_commits {
                    entry.last_commit = Some(id.clone());
                }
                if entry.status == Status::Deleted {
                    entry.modified = Some(committed_at.with_timezone(&Utc));
                }
            }
        }

        Ok(())
    }
}
