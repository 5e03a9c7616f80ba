use crate::artifacts::history::commit_record::CommitRecord;
use crate::commands::Session;
use colored::Colorize;
use std::io::Write;

#[derive(Debug, Clone)]
pub struct LogOptions {
    pub limit: usize,
    pub oneline: bool,
    pub json: bool,
}

impl Session {
    pub async fn log(&self, opts: &LogOptions) -> anyhow::Result<()> {
        let records = self.dataset().commit_log(opts.limit).await?;

        if opts.json {
            return self.write_json(&*records);
        }

        for (i, record) in records.iter().enumerate() {
            if opts.oneline {
                self.show_commit_oneline(record)?;
                continue;
            }

            if i > 0 {
                writeln!(self.writer())?;
            }
            self.show_commit_medium(record)?;
        }

        Ok(())
    }

    pub(crate) fn show_commit_medium(&self, record: &CommitRecord) -> anyhow::Result<()> {
        writeln!(self.writer(), "{}", format!("commit {}", record.id).yellow())?;
        if record.parents.len() > 1 {
            let parents = record
                .parents
                .iter()
                .map(|parent| parent.to_short_oid())
                .collect::<Vec<_>>()
                .join(" ");
            writeln!(self.writer(), "Merge:  {parents}")?;
        }
        writeln!(self.writer(), "Author: {}", record.author)?;
        writeln!(self.writer(), "Date:   {}", record.readable_timestamp())?;
        writeln!(self.writer())?;
        for message_line in record.message.lines() {
            writeln!(self.writer(), "    {}", message_line)?;
        }

        if !record.changes.is_empty() {
            writeln!(self.writer())?;
            for change in &record.changes {
                writeln!(self.writer(), "    {change}")?;
            }
        }

        Ok(())
    }

    fn show_commit_oneline(&self, record: &CommitRecord) -> anyhow::Result<()> {
        writeln!(
            self.writer(),
            "{} {}",
            record.id.to_short_oid().yellow(),
            record.short_message()
        )?;

        Ok(())
    }
}
