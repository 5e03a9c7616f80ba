use crate::artifacts::history::commit_id::CommitId;
use crate::artifacts::status::path_entry::{EntryKind, PartialScanWarning, PathEntry, Status};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Id of the dataset root node.
pub const ROOT_ID: &str = ".";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    Contains,
    Produces,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub kind: EdgeKind,
}

impl GraphEdge {
    pub fn contains(source: impl Into<String>, target: impl Into<String>) -> Self {
        GraphEdge {
            source: source.into(),
            target: target.into(),
            kind: EdgeKind::Contains,
        }
    }

    pub fn produces(source: impl Into<String>, target: impl Into<String>) -> Self {
        GraphEdge {
            source: source.into(),
            target: target.into(),
            kind: EdgeKind::Produces,
        }
    }
}

/// Pipeline stage a top-level directory stands for, recognised by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    RawData,
    Preprocessed,
    Analysis,
    Models,
    Scripts,
    Results,
    Plots,
    Visualizations,
    Other,
}

static STAGE_KINDS: phf::Map<&'static str, StageKind> = phf::phf_map! {
    "raw_data" => StageKind::RawData,
    "preprocessed" => StageKind::Preprocessed,
    "analysis" => StageKind::Analysis,
    "models" => StageKind::Models,
    "scripts" => StageKind::Scripts,
    "results" => StageKind::Results,
    "plots" => StageKind::Plots,
    "visualizations" => StageKind::Visualizations,
};

impl StageKind {
    pub fn from_dir_name(name: &str) -> Self {
        STAGE_KINDS.get(name).copied().unwrap_or(StageKind::Other)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StageKind::RawData => "raw_data",
            StageKind::Preprocessed => "preprocessed",
            StageKind::Analysis => "analysis",
            StageKind::Models => "models",
            StageKind::Scripts => "scripts",
            StageKind::Results => "results",
            StageKind::Plots => "plots",
            StageKind::Visualizations => "visualizations",
            StageKind::Other => "other",
        }
    }
}

/// Aggregate file counts of a directory subtree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StageSummary {
    pub tracked: usize,
    pub modified: usize,
    pub untracked: usize,
    pub deleted: usize,
    pub total_size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<StageKind>,
}

impl StageSummary {
    pub fn add_file(&mut self, entry: &PathEntry) {
        match entry.status {
            Status::Tracked => self.tracked += 1,
            Status::Modified => self.modified += 1,
            Status::Untracked => self.untracked += 1,
            Status::Deleted => self.deleted += 1,
            Status::Directory => return,
        }
        self.total_size += entry.size.unwrap_or(0);
    }

    pub fn files(&self) -> usize {
        self.tracked + self.modified + self.untracked + self.deleted
    }

    pub fn has_changes(&self) -> bool {
        self.modified + self.untracked + self.deleted > 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    pub kind: EntryKind,
    pub status: Status,
    pub size: Option<u64>,
    pub modified: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_commit: Option<CommitId>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub annexed: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<PartialScanWarning>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<StageSummary>,
}

impl GraphNode {
    pub fn root(label: impl Into<String>) -> Self {
        GraphNode {
            id: ROOT_ID.to_string(),
            label: label.into(),
            kind: EntryKind::Directory,
            status: Status::Directory,
            size: None,
            modified: None,
            last_commit: None,
            annexed: false,
            warnings: Vec::new(),
            summary: None,
        }
    }

    pub fn is_root(&self) -> bool {
        self.id == ROOT_ID
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

impl From<PathEntry> for GraphNode {
    fn from(entry: PathEntry) -> Self {
        GraphNode {
            label: entry.name().to_string(),
            id: entry.path,
            kind: entry.kind,
            status: entry.status,
            size: entry.size,
            modified: entry.modified,
            last_commit: entry.last_commit,
            annexed: entry.annexed,
            warnings: entry.warnings,
            summary: None,
        }
    }
}

/// Dataflow graph of one dataset: a containment tree rooted at [`ROOT_ID`]
/// plus inferred `produces` edges.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Graph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub warnings: Vec<PartialScanWarning>,
}

impl Graph {
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn root(&self) -> Option<&GraphNode> {
        self.node(ROOT_ID)
    }

    /// Targets of the `contains` edges leaving `id`, in path order.
    pub fn children(&self, id: &str) -> Vec<&GraphNode> {
        self.edges
            .iter()
            .filter(|edge| edge.kind == EdgeKind::Contains && edge.source == id)
            .filter_map(|edge| self.node(&edge.target))
            .collect()
    }

    pub fn edges_of_kind(&self, kind: EdgeKind) -> impl Iterator<Item = &GraphEdge> {
        self.edges.iter().filter(move |edge| edge.kind == kind)
    }
}
