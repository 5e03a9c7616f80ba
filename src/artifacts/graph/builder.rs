use crate::artifacts::graph::inference::infer_produces_edges;
use crate::artifacts::graph::node::{Graph, GraphEdge, GraphNode, ROOT_ID, StageKind, StageSummary};
use crate::artifacts::status::path_entry::{PathEntry, ancestors, parent_path};
use crate::artifacts::status::status_info::StatusInfo;
use crate::config::InferenceConfig;
use derive_new::new;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Turns a status snapshot into a dataflow graph.
///
/// Pure: no I/O, same snapshot in, same graph out.
#[derive(new)]
pub struct GraphBuilder<'c> {
    root_label: String,
    /// `None` skips the inference pass.
    inference: Option<&'c InferenceConfig>,
}

impl<'c> GraphBuilder<'c> {
    pub fn build(&self, status: StatusInfo) -> Graph {
        let StatusInfo { entries, warnings } = status;

        let produces = self
            .inference
            .map(|config| infer_produces_edges(&entries, config))
            .unwrap_or_default();
        let summaries = summarize(&entries);

        let directories = entries
            .iter()
            .filter(|entry| entry.is_dir())
            .map(|entry| entry.path.clone())
            .collect::<BTreeSet<_>>();

        let mut nodes = Vec::with_capacity(entries.len() + 1);
        let mut edges = Vec::with_capacity(entries.len() + produces.len());
        let mut root = GraphNode::root(self.root_label.clone());
        root.summary = summaries.get(ROOT_ID).cloned();
        nodes.push(root);

        for entry in entries {
            // parents missing from the snapshot hang off the root
            let parent = parent_path(&entry.path)
                .filter(|parent| directories.contains(*parent))
                .unwrap_or(ROOT_ID)
                .to_string();
            edges.push(GraphEdge::contains(parent, entry.path.clone()));

            let mut node = GraphNode::from(entry);
            if node.is_dir() {
                node.summary = summaries.get(&node.id).cloned();
            }
            nodes.push(node);
        }

        edges.extend(produces);

        debug!(nodes = nodes.len(), edges = edges.len(), "graph built");

        Graph {
            nodes,
            edges,
            warnings,
        }
    }
}

fn summarize(entries: &[PathEntry]) -> HashMap<String, StageSummary> {
    let mut summaries = HashMap::<String, StageSummary>::new();
    summaries.insert(ROOT_ID.to_string(), StageSummary::default());

    for entry in entries {
        if entry.is_dir() {
            let summary = summaries.entry(entry.path.clone()).or_default();
            if !entry.path.contains('/') {
                summary.stage = Some(StageKind::from_dir_name(&entry.path));
            }
            continue;
        }

        for dir in std::iter::once(ROOT_ID).chain(ancestors(&entry.path)) {
            summaries.entry(dir.to_string()).or_default().add_file(entry);
        }
    }

    summaries
}
