use crate::areas::workspace::normalize_relative_path;
use crate::artifacts::diff::change::{DiffFilter, PathChange};
use crate::commands::Session;
use colored::Colorize;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Clone, Default)]
pub struct DiffOptions {
    pub filter: Option<DiffFilter>,
    pub name_status: bool,
    pub json: bool,
}

#[derive(Serialize)]
struct PatchView<'a> {
    commit: String,
    path: Option<&'a str>,
    patch: String,
}

impl Session {
    /// Change list of one commit against its first parent.
    pub async fn diff(&self, revision: &str, opts: &DiffOptions) -> anyhow::Result<()> {
        let changes = self.dataset().commit_diff(revision, opts.filter).await?;

        if opts.json {
            return self.write_json(&changes);
        }
        if !opts.name_status {
            let record = self.dataset().commit(revision).await?;
            writeln!(
                self.writer(),
                "{} {}",
                record.id.to_short_oid().yellow(),
                record.short_message()
            )?;
        }

        self.show_changes(&changes, opts.name_status)
    }

    /// Patch of one commit against its first parent, optionally limited to
    /// one path.
    pub async fn patch(&self, revision: &str, path: Option<&str>, json: bool) -> anyhow::Result<()> {
        let path = match path {
            Some(path) => Some(
                normalize_relative_path(path).map_err(|reason| anyhow::anyhow!("{path}: {reason}"))?,
            ),
            None => None,
        };
        let patch = self.dataset().file_diff(revision, path.as_deref()).await?;

        if json {
            let record = self.dataset().commit(revision).await?;
            return self.write_json(&PatchView {
                commit: record.id.to_string(),
                path: path.as_deref(),
                patch: String::from_utf8_lossy(&patch).into_owned(),
            });
        }

        let mut writer = self.writer();
        writer.write_all(&patch)?;
        writer.flush()?;

        Ok(())
    }

    /// Changes between a revision and `HEAD`.
    pub async fn compare(&self, revision: &str, opts: &DiffOptions) -> anyhow::Result<()> {
        let changes = self
            .dataset()
            .compare_to_head(revision, opts.filter)
            .await?;

        if opts.json {
            return self.write_json(&changes);
        }
        if changes.is_empty() && !opts.name_status {
            writeln!(self.writer(), "no changes between {revision} and HEAD")?;
            return Ok(());
        }

        self.show_changes(&changes, opts.name_status)
    }

    fn show_changes(&self, changes: &[PathChange], name_status: bool) -> anyhow::Result<()> {
        for change in changes {
            if !name_status {
                writeln!(self.writer(), "    {change}")?;
                continue;
            }

            match &change.previous_path {
                Some(from) => writeln!(
                    self.writer(),
                    "{}\t{}\t{}",
                    change.kind.status_char(),
                    from,
                    change.path
                )?,
                None => writeln!(
                    self.writer(),
                    "{}\t{}",
                    change.kind.status_char(),
                    change.path
                )?,
            }
        }

        Ok(())
    }
}
