use crate::areas::workspace::normalize_relative_path;
use crate::commands::Session;
use std::io::Write;

impl Session {
    /// Writes the raw content of `path` at `revision`.
    pub async fn show(&self, revision: &str, path: &str) -> anyhow::Result<()> {
        let path = normalize_relative_path(path).map_err(|reason| anyhow::anyhow!("{path}: {reason}"))?;
        let content = self.dataset().read_file_at_revision(&path, revision).await?;

        let mut writer = self.writer();
        writer.write_all(&content)?;
        writer.flush()?;

        Ok(())
    }
}
