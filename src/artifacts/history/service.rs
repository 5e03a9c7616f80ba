use crate::areas::backend::GitBackend;
use crate::artifacts::diff::change::{DiffFilter, PathChange, filter_changes};
use crate::artifacts::history::cache::{HistoryCache, LogPage};
use crate::artifacts::history::commit_record::CommitRecord;
use crate::error::Result;
use bytes::Bytes;
use derive_new::new;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Read projections of a dataset's history.
#[derive(new)]
pub struct HistoryService<'d> {
    backend: &'d GitBackend,
    cache: &'d HistoryCache,
    root: &'d Path,
}

impl<'d> HistoryService<'d> {
    /// Newest first, at most `limit` records, never padded or reordered.
    pub async fn list_commits(&self, limit: usize) -> Result<LogPage> {
        let head = self.backend.head_commit(self.root).await?;
        let (cached, generation) = self.cache.get(self.root, limit, head.as_ref()).await;
        if let Some(page) = cached {
            debug!(limit, "commit log served from cache");
            return Ok(page);
        }

        let records: LogPage = Arc::from(self.backend.commit_log(self.root, limit).await?);
        self.cache
            .insert(self.root, limit, head, records.clone(), generation)
            .await;

        Ok(records)
    }

    pub async fn diff(&self, commit: &str, filter: Option<DiffFilter>) -> Result<Vec<PathChange>> {
        let changes = self.backend.diff_for_commit(self.root, commit).await?;
        Ok(filter_changes(changes, filter))
    }

    /// Patch text of `commit`, optionally limited to one path.
    pub async fn file_diff(&self, commit: &str, path: Option<&str>) -> Result<Bytes> {
        self.backend.file_diff(self.root, commit, path).await
    }

    pub async fn commit(&self, commit: &str) -> Result<CommitRecord> {
        self.backend.commit_record(self.root, commit).await
    }

    pub async fn file_history(&self, path: &str, limit: usize) -> Result<Vec<CommitRecord>> {
        self.backend.file_history(self.root, path, limit).await
    }

    pub async fn compare_to_head(
        &self,
        revision: &str,
        filter: Option<DiffFilter>,
    ) -> Result<Vec<PathChange>> {
        let changes = self.backend.compare_to_head(self.root, revision).await?;
        Ok(filter_changes(changes, filter))
    }

    pub async fn read_file(&self, path: &str, revision: &str) -> Result<Bytes> {
        self.backend
            .read_blob_at_revision(self.root, path, revision)
            .await
    }
}
