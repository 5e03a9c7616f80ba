use crate::areas::dataset::GraphOptions;
use crate::artifacts::graph::node::{EdgeKind, Graph, GraphNode, ROOT_ID, StageKind};
use crate::commands::{Session, format_size};
use colored::Colorize;
use std::collections::HashMap;
use std::io::Write;

#[derive(Debug, Clone, Copy)]
pub struct GraphCommandOptions {
    pub json: bool,
    pub inference: bool,
}

impl Session {
    pub async fn graph(&self, opts: &GraphCommandOptions) -> anyhow::Result<()> {
        let graph = self
            .dataset()
            .dataflow_graph(GraphOptions {
                inference: opts.inference,
            })
            .await?;

        if opts.json {
            return self.write_json(&graph);
        }

        self.show_tree(&graph)?;
        self.show_produces_edges(&graph)?;
        self.show_warnings(&graph)?;

        Ok(())
    }

    fn show_tree(&self, graph: &Graph) -> anyhow::Result<()> {
        let nodes = graph
            .nodes
            .iter()
            .map(|node| (node.id.as_str(), node))
            .collect::<HashMap<_, _>>();
        let mut children = HashMap::<&str, Vec<&GraphNode>>::new();
        for edge in graph.edges_of_kind(EdgeKind::Contains) {
            if let Some(child) = nodes.get(edge.target.as_str()) {
                children.entry(edge.source.as_str()).or_default().push(*child);
            }
        }

        let Some(root) = nodes.get(ROOT_ID) else {
            return Ok(());
        };
        writeln!(self.writer(), "{}{}", root.label.bold(), self.summary_suffix(root))?;
        self.show_children(ROOT_ID, "", &children)
    }

    fn show_children(
        &self,
        id: &str,
        prefix: &str,
        children: &HashMap<&str, Vec<&GraphNode>>,
    ) -> anyhow::Result<()> {
        let Some(nodes) = children.get(id) else {
            return Ok(());
        };

        for (i, node) in nodes.iter().enumerate() {
            let last = i + 1 == nodes.len();
            let connector = if last { "└── " } else { "├── " };

            if node.is_dir() {
                writeln!(
                    self.writer(),
                    "{prefix}{connector}{}{}",
                    format!("{}/", node.label).blue().bold(),
                    self.summary_suffix(node)
                )?;
                let nested = format!("{prefix}{}", if last { "    " } else { "│   " });
                self.show_children(&node.id, &nested, children)?;
            } else {
                writeln!(
                    self.writer(),
                    "{prefix}{connector}{} {} {}{}",
                    node.status,
                    node.label,
                    format_size(node.size).dimmed(),
                    if node.annexed { " (annexed)" } else { "" }
                )?;
            }
        }

        Ok(())
    }

    fn summary_suffix(&self, node: &GraphNode) -> String {
        let Some(summary) = &node.summary else {
            return String::new();
        };

        let stage = match summary.stage {
            Some(stage) if stage != StageKind::Other => format!(" [{}]", stage.as_str()),
            _ => String::new(),
        };

        format!(
            "{stage}  ({} files: {} tracked, {} modified, {} untracked, {} deleted; {})",
            summary.files(),
            summary.tracked,
            summary.modified,
            summary.untracked,
            summary.deleted,
            format_size(Some(summary.total_size))
        )
        .dimmed()
        .to_string()
    }

    fn show_produces_edges(&self, graph: &Graph) -> anyhow::Result<()> {
        let produces = graph.edges_of_kind(EdgeKind::Produces).collect::<Vec<_>>();
        if produces.is_empty() {
            return Ok(());
        }

        writeln!(self.writer())?;
        writeln!(self.writer(), "{}", "Inferred edges:".bold())?;
        for edge in produces {
            writeln!(self.writer(), "  {} -> {}", edge.source, edge.target)?;
        }

        Ok(())
    }

    fn show_warnings(&self, graph: &Graph) -> anyhow::Result<()> {
        if graph.warnings.is_empty() {
            return Ok(());
        }

        writeln!(self.writer())?;
        writeln!(self.writer(), "{}", "Warnings:".yellow().bold())?;
        for warning in &graph.warnings {
            writeln!(self.writer(), "  {warning}")?;
        }

        Ok(())
    }
}
