use crate::areas::backend::GitBackend;
use crate::areas::workspace::{Workspace, normalize_relative_path};
use crate::artifacts::history::cache::HistoryCache;
use crate::artifacts::history::commit_id::CommitId;
use crate::artifacts::history::commit_record::CommitRecord;
use crate::artifacts::restore::locks::{ProcessLock, RootLocks};
use crate::artifacts::restore::state::{RestoreState, RestoreTrail, Transition};
use crate::artifacts::status::path_entry::{PathEntry, Status};
use crate::error::{DataflowError, Result};
use chrono::{DateTime, Utc};
use derive_new::new;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::OwnedMutexGuard;
use tracing::{info, warn};

const DATALAD_DIR: &str = ".datalad";

#[derive(Debug, Clone, new)]
pub struct RestoreRequest {
    pub path: String,
    pub revision: String,
    /// Acknowledges replacing a file that is still present on disk.
    pub overwrite: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RestoreOutcome {
    pub path: String,
    pub revision: CommitId,
    /// `None` when the restored content already matched `HEAD`.
    pub commit: Option<CommitRecord>,
    pub entry: PathEntry,
    pub trail: Vec<Transition>,
}

#[derive(Debug, Clone)]
pub struct RestoreSettings {
    pub message_prefix: String,
    pub datalad_save: bool,
}

/// Drives one restore request through its state machine.
#[derive(new)]
pub struct RestoreService<'d> {
    backend: &'d GitBackend,
    workspace: &'d Workspace,
    locks: &'d RootLocks,
    cache: Arc<HistoryCache>,
    settings: RestoreSettings,
}

impl<'d> RestoreService<'d> {
    fn root(&self) -> &Path {
        self.workspace.path()
    }

    fn invalid(&self, path: &str, reason: impl Into<String>) -> DataflowError {
        DataflowError::InvalidRestoreTarget {
            root: self.root().to_path_buf(),
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    pub async fn restore(&self, request: RestoreRequest) -> Result<RestoreOutcome> {
        let mut trail = RestoreTrail::new(request.path.clone());

        let path = match normalize_relative_path(&request.path) {
            Ok(path) => path,
            Err(reason) => {
                let err = self.invalid(&request.path, reason);
                trail.fail(&err);
                return Err(err);
            }
        };

        let root_guard = self.locks.acquire(self.root()).await;
        trail.advance(RestoreState::Validating, None);

        let revision = match self.validate(&path, &request).await {
            Ok(revision) => revision,
            Err(err) => {
                trail.fail(&err);
                return Err(err);
            }
        };

        let process_lock = match self.lock_process(&path).await {
            Ok(lock) => lock,
            Err(err) => {
                trail.fail(&err);
                return Err(err);
            }
        };

        trail.advance(RestoreState::Checkout, Some(revision.to_string()));
        if let Err(err) = self
            .backend
            .checkout_path_at_revision(self.root(), &path, revision.as_ref())
            .await
        {
            trail.fail(&err);
            return Err(err);
        }

        trail.advance(RestoreState::Committing, None);
        let step = CommitStep {
            backend: self.backend.clone(),
            root: self.root().to_path_buf(),
            path: path.clone(),
            revision: revision.clone(),
            message: format!(
                "{} {} from {}",
                self.settings.message_prefix,
                path,
                revision.to_short_oid()
            ),
            datalad_save: self.settings.datalad_save,
            cache: self.cache.clone(),
        };

        // the commit runs to completion even if this future is dropped
        let handle = tokio::spawn(step.run(root_guard, process_lock));
        let commit = match handle.await {
            Ok(Ok(commit)) => commit,
            Ok(Err(source)) => {
                let err = self.uncommitted(&path, &request.revision, source);
                trail.fail(&err);
                return Err(err);
            }
            Err(join_error) => {
                let source = DataflowError::Io {
                    root: self.root().to_path_buf(),
                    path: PathBuf::from(&path),
                    source: std::io::Error::other(join_error),
                };
                let err = self.uncommitted(&path, &request.revision, source);
                trail.fail(&err);
                return Err(err);
            }
        };

        trail.advance(
            RestoreState::Done,
            commit.as_ref().map(|record| record.id.to_string()),
        );

        Ok(RestoreOutcome {
            entry: self.restored_entry(&path, commit.as_ref()),
            path,
            revision,
            commit,
            trail: trail.into_transitions(),
        })
    }

    async fn validate(&self, path: &str, request: &RestoreRequest) -> Result<CommitId> {
        if self.workspace.exists(path) {
            if self.workspace.is_dir(path) {
                return Err(self.invalid(path, "a directory exists at this path"));
            }
            if !request.overwrite {
                return Err(self.invalid(
                    path,
                    "file is present in the working tree; overwriting must be acknowledged",
                ));
            }
        }

        let revision = self
            .backend
            .resolve_revision(self.root(), &request.revision)
            .await?;

        if !self
            .backend
            .path_exists_at_revision(self.root(), path, &revision)
            .await?
        {
            return Err(self.invalid(
                path,
                format!("no such file at revision '{}'", request.revision),
            ));
        }

        Ok(revision)
    }

    async fn lock_process(&self, path: &str) -> Result<ProcessLock> {
        let git_dir = self.backend.git_dir(self.root()).await?;
        ProcessLock::try_acquire(&git_dir, self.root(), path)
    }

    fn uncommitted(&self, path: &str, revision: &str, source: DataflowError) -> DataflowError {
        DataflowError::RestoredButUncommitted {
            root: self.root().to_path_buf(),
            path: path.to_string(),
            revision: revision.to_string(),
            source: Box::new(source),
        }
    }

    fn restored_entry(&self, path: &str, commit: Option<&CommitRecord>) -> PathEntry {
        let full_path = self.root().join(path);
        let metadata = std::fs::metadata(&full_path).ok();

        let mut entry = PathEntry::file(path, Status::Tracked)
            .with_size(metadata.as_ref().map(|m| m.len()))
            .with_modified(
                metadata
                    .and_then(|m| m.modified().ok())
                    .map(DateTime::<Utc>::from),
            );
        entry.last_commit = commit.map(|record| record.id.clone());

        entry
    }
}

/// Owned state of the `Committing` step, moved into its own task.
struct CommitStep {
    backend: GitBackend,
    root: PathBuf,
    path: String,
    revision: CommitId,
    message: String,
    datalad_save: bool,
    cache: Arc<HistoryCache>,
}

impl CommitStep {
    async fn run(
        self,
        _root_guard: OwnedMutexGuard<()>,
        _process_lock: ProcessLock,
    ) -> Result<Option<CommitRecord>> {
        let paths = [self.path.as_str()];

        if !self.backend.has_staged_changes(&self.root, &paths).await? {
            info!(path = %self.path, revision = %self.revision, "restored content matches HEAD, nothing to commit");
            return Ok(None);
        }

        let record = self
            .backend
            .commit_paths(&self.root, &paths, &self.message)
            .await?;
        self.cache.invalidate(&self.root).await;

        if self.datalad_save
            && self.root.join(DATALAD_DIR).is_dir()
            && let Err(e) = self
                .backend
                .datalad_save(&self.root, &paths, &self.message)
                .await
        {
            warn!(path = %self.path, error = %e, "datalad save after restore failed");
        }

        Ok(Some(record))
    }
}
