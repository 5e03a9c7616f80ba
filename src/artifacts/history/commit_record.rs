use crate::artifacts::diff::change::PathChange;
use crate::artifacts::history::commit_id::CommitId;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Read-only projection of one commit of the dataset history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub id: CommitId,
    pub parents: Vec<CommitId>,
    pub author: String,
    pub timestamp: DateTime<FixedOffset>,
    pub message: String,
    pub changes: Vec<PathChange>,
}

impl CommitRecord {
    pub fn short_message(&self) -> &str {
        self.message.lines().next().unwrap_or_default()
    }

    pub fn readable_timestamp(&self) -> String {
        self.timestamp
            .format("%a %b %-d %H:%M:%S %Y %z")
            .to_string()
    }

    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    pub fn touches(&self, path: &str) -> bool {
        self.changes
            .iter()
            .any(|change| change.path == path || change.previous_path.as_deref() == Some(path))
    }
}
