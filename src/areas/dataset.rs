use crate::areas::backend::GitBackend;
use crate::areas::workspace::Workspace;
use crate::artifacts::diff::change::{DiffFilter, PathChange};
use crate::artifacts::graph::builder::GraphBuilder;
use crate::artifacts::graph::node::Graph;
use crate::artifacts::history::cache::{HistoryCache, LogPage};
use crate::artifacts::history::commit_record::CommitRecord;
use crate::artifacts::history::service::HistoryService;
use crate::artifacts::restore::locks::RootLocks;
use crate::artifacts::restore::service::{
    RestoreOutcome, RestoreRequest, RestoreService, RestoreSettings,
};
use crate::artifacts::status::status_info::{StatusInfo, StatusResolver};
use crate::config::Config;
use bytes::Bytes;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Copy)]
pub struct GraphOptions {
    pub inference: bool,
}

impl Default for GraphOptions {
    fn default() -> Self {
        GraphOptions { inference: true }
    }
}

/// One opened dataset root: its configuration, backend and working tree.
///
/// Cheap to clone; the writer slots and the history cache are shared with
/// every other handle the same engine opened.
#[derive(Debug, Clone)]
pub struct Dataset {
    config: Arc<Config>,
    backend: GitBackend,
    workspace: Workspace,
    locks: Arc<RootLocks>,
    cache: Arc<HistoryCache>,
}

impl Dataset {
    pub(crate) fn new(
        root: Box<Path>,
        config: Config,
        locks: Arc<RootLocks>,
        cache: Arc<HistoryCache>,
    ) -> Self {
        let backend = GitBackend::new(config.backend.program.clone(), config.backend.timeout());
        let workspace = Workspace::new(root, config.scan.ignored_names.clone());

        Dataset {
            config: Arc::new(config),
            backend,
            workspace,
            locks,
            cache,
        }
    }

    pub fn root(&self) -> &Path {
        self.workspace.path()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn backend(&self) -> &GitBackend {
        &self.backend
    }

    /// Directory name of the root, used as the root node label.
    pub fn name(&self) -> String {
        self.root()
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.root().to_string_lossy().into_owned())
    }

    fn history(&self) -> HistoryService<'_> {
        HistoryService::new(&self.backend, &self.cache, self.root())
    }

    pub async fn status(&self) -> crate::Result<StatusInfo> {
        StatusResolver::new(
            &self.backend,
            &self.workspace,
            self.config.graph.max_log_scan,
            self.config.graph.annotate_commits,
        )
        .resolve()
        .await
    }

    pub async fn dataflow_graph(&self, options: GraphOptions) -> crate::Result<Graph> {
        let status = self.status().await?;
        let inference = options.inference.then_some(&self.config.inference);

        Ok(GraphBuilder::new(self.name(), inference).build(status))
    }

    pub async fn commit_log(&self, limit: usize) -> crate::Result<LogPage> {
        self.history().list_commits(limit).await
    }

    pub async fn commit_diff(
        &self,
        commit: &str,
        filter: Option<DiffFilter>,
    ) -> crate::Result<Vec<PathChange>> {
        self.history().diff(commit, filter).await
    }

    pub async fn file_diff(&self, commit: &str, path: Option<&str>) -> crate::Result<Bytes> {
        self.history().file_diff(commit, path).await
    }

    pub async fn commit(&self, revision: &str) -> crate::Result<CommitRecord> {
        self.history().commit(revision).await
    }

    pub async fn compare_to_head(
        &self,
        revision: &str,
        filter: Option<DiffFilter>,
    ) -> crate::Result<Vec<PathChange>> {
        self.history().compare_to_head(revision, filter).await
    }

    pub async fn file_history(&self, path: &str, limit: usize) -> crate::Result<Vec<CommitRecord>> {
        self.history().file_history(path, limit).await
    }

    pub async fn read_file_at_revision(&self, path: &str, revision: &str) -> crate::Result<Bytes> {
        self.history().read_file(path, revision).await
    }

    pub async fn restore_path(&self, request: RestoreRequest) -> crate::Result<RestoreOutcome> {
        let settings = RestoreSettings {
            message_prefix: self.config.restore.message_prefix.clone(),
            datalad_save: self.config.backend.datalad_save,
        };

        RestoreService::new(
            &self.backend,
            &self.workspace,
            &self.locks,
            self.cache.clone(),
            settings,
        )
        .restore(request)
        .await
    }
}
