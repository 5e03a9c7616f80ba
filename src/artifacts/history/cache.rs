use crate::artifacts::history::commit_id::CommitId;
use crate::artifacts::history::commit_record::CommitRecord;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;

pub type LogPage = Arc<[CommitRecord]>;

#[derive(Debug, Default)]
struct RootSlot {
    /// Bumped on every invalidation; loads started under an older generation
    /// are not stored.
    generation: u64,
    pages: HashMap<usize, (Option<CommitId>, LogPage)>,
}

/// Commit log pages keyed by (dataset root, limit).
///
/// Each root has its own `RwLock`: readers of one root never wait on another
/// root, and only invalidation takes the write side. A page is served only
/// while the branch head it was read at is still current.
#[derive(Debug, Default)]
pub struct HistoryCache {
    roots: Mutex<HashMap<PathBuf, Arc<RwLock<RootSlot>>>>,
}

impl HistoryCache {
    fn slot(&self, root: &Path) -> Arc<RwLock<RootSlot>> {
        let mut roots = self.roots.lock().unwrap_or_else(|e| e.into_inner());
        roots.entry(root.to_path_buf()).or_default().clone()
    }

    /// Cached page plus the generation it was looked up under.
    pub async fn get(
        &self,
        root: &Path,
        limit: usize,
        head: Option<&CommitId>,
    ) -> (Option<LogPage>, u64) {
        let slot = self.slot(root);
        let slot = slot.read().await;

        let page = slot
            .pages
            .get(&limit)
            .filter(|(cached_head, _)| cached_head.as_ref() == head)
            .map(|(_, page)| page.clone());

        (page, slot.generation)
    }

    /// Stores a page unless the root was invalidated since `generation`.
    pub async fn insert(
        &self,
        root: &Path,
        limit: usize,
        head: Option<CommitId>,
        page: LogPage,
        generation: u64,
    ) -> bool {
        let slot = self.slot(root);
        let mut slot = slot.write().await;

        if slot.generation != generation {
            return false;
        }
        slot.pages.insert(limit, (head, page));
        true
    }

    pub async fn invalidate(&self, root: &Path) {
        let slot = self.slot(root);
        let mut slot = slot.write().await;

        slot.generation += 1;
        slot.pages.clear();
    }
}
