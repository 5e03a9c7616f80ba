use crate::areas::workspace::normalize_relative_path;
use crate::commands::Session;
use std::io::Write;

#[derive(Debug, Clone)]
pub struct HistoryOptions {
    pub limit: usize,
    pub json: bool,
}

impl Session {
    pub async fn history(&self, path: &str, opts: &HistoryOptions) -> anyhow::Result<()> {
        let path = normalize_relative_path(path).map_err(|reason| anyhow::anyhow!("{path}: {reason}"))?;
        let records = self.dataset().file_history(&path, opts.limit).await?;

        if opts.json {
            return self.write_json(&records);
        }

        for (i, record) in records.iter().enumerate() {
            if i > 0 {
                writeln!(self.writer())?;
            }
            self.show_commit_medium(record)?;
        }

        Ok(())
    }
}
