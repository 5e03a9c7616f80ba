use crate::artifacts::history::commit_id::CommitId;
use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::{Deserialize, Serialize};

const LABEL_WIDTH: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

/// Closed status taxonomy of a path relative to the last commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Tracked,
    Modified,
    Untracked,
    Deleted,
    Directory,
}

impl From<&Status> for &str {
    fn from(status: &Status) -> Self {
        match status {
            Status::Tracked => "tracked",
            Status::Modified => "modified",
            Status::Untracked => "untracked",
            Status::Deleted => "deleted",
            Status::Directory => "directory",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label: &str = self.into();
        let colored_str = match self {
            Status::Tracked => label.green(),
            Status::Modified => label.yellow(),
            Status::Untracked => label.bright_red(),
            Status::Deleted => label.red().strikethrough(),
            Status::Directory => label.blue(),
        };
        // pad on the plain text, colour codes have no width
        write!(
            f,
            "{}{:pad$}",
            colored_str,
            "",
            pad = LABEL_WIDTH.saturating_sub(label.len())
        )
    }
}

/// Non-fatal problem met while scanning one path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialScanWarning {
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for PartialScanWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// One file or directory below the dataset root.
///
/// `path` is relative, `/`-separated and unique within a snapshot. Sizes are
/// unknown for directories and for unresolved annex stubs; deleted entries
/// carry the size and commit time of their last committed version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathEntry {
    pub path: String,
    pub kind: EntryKind,
    pub status: Status,
    pub size: Option<u64>,
    pub modified: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub annexed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_commit: Option<CommitId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<PartialScanWarning>,
}

impl PathEntry {
    pub fn file(path: impl Into<String>, status: Status) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::File,
            status,
            size: None,
            modified: None,
            annexed: false,
            last_commit: None,
            warnings: Vec::new(),
        }
    }

    pub fn directory(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::Directory,
            status: Status::Directory,
            size: None,
            modified: None,
            annexed: false,
            last_commit: None,
            warnings: Vec::new(),
        }
    }

    pub fn with_size(mut self, size: Option<u64>) -> Self {
        self.size = size;
        self
    }

    pub fn with_modified(mut self, modified: Option<DateTime<Utc>>) -> Self {
        self.modified = modified;
        self
    }

    pub fn name(&self) -> &str {
        basename(&self.path)
    }

    pub fn parent(&self) -> Option<&str> {
        parent_path(&self.path)
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

pub fn basename(path: &str) -> &str {
    path.rsplit_once('/').map_or(path, |(_, name)| name)
}

/// Parent of a relative path; `None` for top-level paths (whose parent is
/// the dataset root).
pub fn parent_path(path: &str) -> Option<&str> {
    path.rsplit_once('/').map(|(parent, _)| parent)
}

/// All strict ancestors of a relative path, outermost first.
pub fn ancestors(path: &str) -> impl Iterator<Item = &str> {
    path.match_indices('/').map(move |(i, _)| &path[..i])
}
