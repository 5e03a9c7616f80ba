use crate::artifacts::restore::service::RestoreRequest;
use crate::commands::Session;
use colored::Colorize;
use std::io::Write;

#[derive(Debug, Clone)]
pub struct RestoreOptions {
    pub revision: String,
    pub overwrite: bool,
    pub json: bool,
}

impl Session {
    pub async fn restore(&self, path: &str, opts: &RestoreOptions) -> anyhow::Result<()> {
        let outcome = self
            .dataset()
            .restore_path(RestoreRequest::new(
                path.to_string(),
                opts.revision.clone(),
                opts.overwrite,
            ))
            .await?;

        if opts.json {
            return self.write_json(&outcome);
        }

        match &outcome.commit {
            Some(commit) => writeln!(
                self.writer(),
                "Restored {} from {} in {}",
                outcome.path.green(),
                outcome.revision.to_short_oid(),
                format!("commit {}", commit.id.to_short_oid()).yellow()
            )?,
            None => writeln!(
                self.writer(),
                "Restored {} from {} (content matches HEAD, nothing to commit)",
                outcome.path.green(),
                outcome.revision.to_short_oid()
            )?,
        }

        Ok(())
    }
}
