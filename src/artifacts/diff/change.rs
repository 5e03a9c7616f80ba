use bitflags::bitflags;
use colored::{ColoredString, Colorize};
use serde::{Deserialize, Serialize};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct DiffFilter: u32 {
        const ADDED = 0b0001;
        const DELETED = 0b0010;
        const MODIFIED = 0b0100;
        const RENAMED = 0b1000;
    }
}

impl DiffFilter {
    pub fn try_parse(s: &str) -> Option<Self> {
        let mut filter = Self::empty();

        for c in s.chars() {
            match c.to_ascii_uppercase() {
                'A' => filter |= Self::ADDED,
                'D' => filter |= Self::DELETED,
                'M' => filter |= Self::MODIFIED,
                'R' => filter |= Self::RENAMED,
                _ => return None,
            }
        }

        Some(filter)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Modified,
    Deleted,
    Renamed,
}

impl ChangeKind {
    pub fn matches_filter(&self, filter: DiffFilter) -> bool {
        match self {
            ChangeKind::Added => filter.contains(DiffFilter::ADDED),
            ChangeKind::Deleted => filter.contains(DiffFilter::DELETED),
            ChangeKind::Modified => filter.contains(DiffFilter::MODIFIED),
            ChangeKind::Renamed => filter.contains(DiffFilter::RENAMED),
        }
    }

    pub fn status_char(&self) -> char {
        match self {
            ChangeKind::Added => 'A',
            ChangeKind::Modified => 'M',
            ChangeKind::Deleted => 'D',
            ChangeKind::Renamed => 'R',
        }
    }

    pub fn colored_label(&self) -> ColoredString {
        match self {
            ChangeKind::Added => "added:    ".green(),
            ChangeKind::Modified => "modified: ".yellow(),
            ChangeKind::Deleted => "deleted:  ".red(),
            ChangeKind::Renamed => "renamed:  ".cyan(),
        }
    }
}

/// One path-level entry of a commit's change list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathChange {
    pub path: String,
    pub kind: ChangeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_path: Option<String>,
}

impl PathChange {
    pub fn new(path: impl Into<String>, kind: ChangeKind) -> Self {
        Self {
            path: path.into(),
            kind,
            previous_path: None,
        }
    }

    pub fn renamed(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            path: to.into(),
            kind: ChangeKind::Renamed,
            previous_path: Some(from.into()),
        }
    }
}

impl std::fmt::Display for PathChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.previous_path {
            Some(from) => write!(f, "{}{} -> {}", self.kind.colored_label(), from, self.path),
            None => write!(f, "{}{}", self.kind.colored_label(), self.path),
        }
    }
}

pub fn filter_changes(changes: Vec<PathChange>, filter: Option<DiffFilter>) -> Vec<PathChange> {
    match filter {
        None => changes,
        Some(filter) => changes
            .into_iter()
            .filter(|change| change.kind.matches_filter(filter))
            .collect(),
    }
}
