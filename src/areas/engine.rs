use crate::areas::dataset::{Dataset, GraphOptions};
use crate::artifacts::diff::change::PathChange;
use crate::artifacts::graph::node::Graph;
use crate::artifacts::history::cache::{HistoryCache, LogPage};
use crate::artifacts::restore::locks::RootLocks;
use crate::artifacts::restore::service::{RestoreOutcome, RestoreRequest};
use crate::config::Config;
use crate::error::{DataflowError, Result};
use bytes::Bytes;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Overrides applied on top of every dataset's configuration.
#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    pub config_path: Option<PathBuf>,
    pub program: Option<String>,
    pub timeout: Option<Duration>,
}

/// Entry point of the engine.
///
/// Holds the only state shared between requests: one writer slot per
/// dataset root and the commit log cache. Clones share that state.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    options: EngineOptions,
    locks: Arc<RootLocks>,
    cache: Arc<HistoryCache>,
}

impl Engine {
    pub fn new(options: EngineOptions) -> Self {
        Engine {
            options,
            ..Default::default()
        }
    }

    /// Opens a dataset root, loading its configuration.
    pub async fn open(&self, root: impl AsRef<Path>) -> Result<Dataset> {
        let root = canonical_root(root.as_ref())?;
        let config = Config::load(&root, self.options.config_path.as_deref())?;

        self.open_with_config(root, config).await
    }

    /// Opens a dataset root with an explicit configuration (engine overrides
    /// still apply).
    pub async fn open_with_config(&self, root: impl AsRef<Path>, mut config: Config) -> Result<Dataset> {
        let root = canonical_root(root.as_ref())?;

        if let Some(program) = &self.options.program {
            config.backend.program = program.clone();
        }
        if let Some(timeout) = self.options.timeout {
            config.backend.timeout_secs = timeout.as_secs_f64();
        }

        let dataset = Dataset::new(
            root.into_boxed_path(),
            config,
            self.locks.clone(),
            self.cache.clone(),
        );
        dataset.backend().ensure_repository(dataset.root()).await?;
        debug!(root = ?dataset.root(), "dataset opened");

        Ok(dataset)
    }

    pub async fn get_dataflow_graph(&self, root: impl AsRef<Path>) -> Result<Graph> {
        self.open(root)
            .await?
            .dataflow_graph(GraphOptions::default())
            .await
    }

    pub async fn get_commit_log(&self, root: impl AsRef<Path>, limit: usize) -> Result<LogPage> {
        self.open(root).await?.commit_log(limit).await
    }

    pub async fn get_commit_diff(
        &self,
        root: impl AsRef<Path>,
        commit: &str,
    ) -> Result<Vec<PathChange>> {
        self.open(root).await?.commit_diff(commit, None).await
    }

    pub async fn get_file_diff(
        &self,
        root: impl AsRef<Path>,
        commit: &str,
        path: Option<&str>,
    ) -> Result<Bytes> {
        self.open(root).await?.file_diff(commit, path).await
    }

    pub async fn restore_path(
        &self,
        root: impl AsRef<Path>,
        path: &str,
        commit: &str,
        overwrite: bool,
    ) -> Result<RestoreOutcome> {
        self.open(root)
            .await?
            .restore_path(RestoreRequest::new(
                path.to_string(),
                commit.to_string(),
                overwrite,
            ))
            .await
    }
}

// Locks and cache entries are keyed by this path, so every spelling of a
// root must map to the same key.
fn canonical_root(root: &Path) -> Result<PathBuf> {
    let root = root
        .canonicalize()
        .map_err(|_| DataflowError::NotARepository {
            root: root.to_path_buf(),
        })?;

    if root.is_dir() {
        Ok(root)
    } else {
        Err(DataflowError::NotARepository { root })
    }
}
