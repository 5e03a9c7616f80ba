//! Commit identifier
//!
//! Full hexadecimal object name as printed by the backend: 40 characters for
//! SHA-1 repositories, 64 for SHA-256 ones. The short form is the usual
//! 7-character abbreviation.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

const SHORT_LENGTH: usize = 7;

static OBJECT_NAME: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^(?:[0-9a-fA-F]{40}|[0-9a-fA-F]{64})$").ok());

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommitId(String);

impl CommitId {
    /// Validates a full object name; any other shape is rejected so that
    /// backend output drift surfaces instead of propagating.
    pub fn try_parse(id: &str) -> Option<Self> {
        let id = id.trim();

        OBJECT_NAME
            .as_ref()
            .filter(|pattern| pattern.is_match(id))
            .map(|_| Self(id.to_ascii_lowercase()))
    }

    pub fn to_short_oid(&self) -> &str {
        &self.0[..SHORT_LENGTH]
    }
}

/// Whether a user-supplied revision is safe to hand to the backend as a
/// positional argument.
pub fn is_plausible_revision(revision: &str) -> bool {
    !revision.is_empty()
        && !revision.starts_with('-')
        && !revision.chars().any(|c| c.is_whitespace() || c.is_control())
}

impl AsRef<str> for CommitId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CommitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
