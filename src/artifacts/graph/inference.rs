//! Best-effort `produces` edges
//!
//! A naming convention, not provenance: within each directory that holds a
//! scripts directory and an outputs directory, the newest script is taken to
//! have produced every output that is at least as new. The convention
//! directories may sit at any depth.

use crate::artifacts::graph::node::GraphEdge;
use crate::artifacts::status::path_entry::{PathEntry, Status};
use crate::config::InferenceConfig;
use chrono::{DateTime, Utc};
use std::cmp::Reverse;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Script,
    Output,
}

/// Role of `path` and the directory holding its convention directory, taken
/// from the outermost ancestor named like a stage. The dataset root is `""`.
fn convention<'p>(path: &'p str, config: &InferenceConfig) -> Option<(Role, &'p str)> {
    let (dirs, _) = path.rsplit_once('/')?;
    let mut offset: usize = 0;

    for name in dirs.split('/') {
        let role = if config.scripts.iter().any(|dir| dir == name) {
            Some(Role::Script)
        } else if config.outputs.iter().any(|dir| dir == name) {
            Some(Role::Output)
        } else {
            None
        };
        if let Some(role) = role {
            let parent = offset.checked_sub(1).map_or("", |end| &path[..end]);
            return Some((role, parent));
        }
        offset += name.len() + 1;
    }

    None
}

fn candidates<'e>(
    entries: &'e [PathEntry],
    config: &'e InferenceConfig,
) -> impl Iterator<Item = (&'e PathEntry, Role, &'e str, DateTime<Utc>)> {
    entries
        .iter()
        .filter(|entry| !entry.is_dir() && entry.status != Status::Deleted)
        .filter_map(move |entry| {
            let (role, parent) = convention(&entry.path, config)?;
            Some((entry, role, parent, entry.modified?))
        })
}

/// Infers `produces` edges from `entries` (sorted by path).
///
/// Each group is the directory holding a scripts and an outputs directory.
/// Its source is the most recently modified script; equal timestamps go to
/// the lexicographically smallest path. Deleted files and files without a
/// timestamp never take part. Targets are returned in path order.
pub fn infer_produces_edges(entries: &[PathEntry], config: &InferenceConfig) -> Vec<GraphEdge> {
    if !config.is_enabled() {
        return Vec::new();
    }

    let mut sources: BTreeMap<&str, (&PathEntry, DateTime<Utc>)> = BTreeMap::new();
    for (entry, role, parent, modified) in candidates(entries, config) {
        if role != Role::Script {
            continue;
        }
        let rank = (modified, Reverse(entry.path.as_str()));
        let newer = sources
            .get(parent)
            .is_none_or(|(best, best_time)| rank > (*best_time, Reverse(best.path.as_str())));
        if newer {
            sources.insert(parent, (entry, modified));
        }
    }

    candidates(entries, config)
        .filter(|&(_, role, _, _)| role == Role::Output)
        .filter_map(|(output, _, parent, modified)| {
            let (script, script_time) = sources.get(parent)?;
            (modified >= *script_time && output.path != script.path)
                .then(|| GraphEdge::produces(script.path.clone(), output.path.clone()))
        })
        .collect()
}
