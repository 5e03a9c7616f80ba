//! Parsers for the backend's log listings
//!
//! Commit headers are requested with unit separators between fields and one
//! NUL after each commit, so commit messages can hold any text. The
//! last-commit scan uses a record separator before each commit followed by
//! the touched paths, each terminated by NUL so names are never C-quoted.

use crate::artifacts::history::commit_id::CommitId;
use crate::artifacts::history::commit_record::CommitRecord;
use chrono::{DateTime, FixedOffset};
use std::collections::HashMap;

pub const FIELD_SEPARATOR: char = '\x1f';
pub const RECORD_SEPARATOR: char = '\x1e';

/// `--format` argument matching [`parse_commit_headers`].
pub const COMMIT_HEADER_FORMAT: &str = "--format=%H%x1f%P%x1f%an%x1f%ae%x1f%aI%x1f%B";

/// `--format` argument matching [`parse_last_commits`].
pub const LAST_COMMIT_FORMAT: &str = "--format=%x1e%H%x1f%cI";

const HEADER_FIELDS: usize = 6;

/// Parses NUL-separated commit headers in backend order. Change lists are
/// left empty for the caller to fill.
pub fn parse_commit_headers(output: &str) -> Result<Vec<CommitRecord>, String> {
    output
        .split('\0')
        .map(|record| record.trim_start_matches('\n'))
        .filter(|record| !record.is_empty())
        .map(parse_commit_header)
        .collect()
}

fn parse_commit_header(record: &str) -> Result<CommitRecord, String> {
    let fields = record.splitn(HEADER_FIELDS, FIELD_SEPARATOR).collect::<Vec<_>>();
    if fields.len() != HEADER_FIELDS {
        return Err(format!(
            "expected {HEADER_FIELDS} header fields, found {}",
            fields.len()
        ));
    }

    let id = CommitId::try_parse(fields[0])
        .ok_or_else(|| format!("invalid commit id '{}'", fields[0]))?;
    let parents = fields[1]
        .split_whitespace()
        .map(|p| CommitId::try_parse(p).ok_or_else(|| format!("invalid parent id '{p}'")))
        .collect::<Result<Vec<_>, _>>()?;
    let timestamp = parse_timestamp(fields[4])?;

    Ok(CommitRecord {
        id,
        parents,
        author: format!("{} <{}>", fields[2], fields[3]),
        timestamp,
        message: fields[5].trim_end().to_string(),
        changes: Vec::new(),
    })
}

pub fn parse_timestamp(value: &str) -> Result<DateTime<FixedOffset>, String> {
    DateTime::parse_from_rfc3339(value.trim())
        .map_err(|e| format!("invalid timestamp '{}': {e}", value.trim()))
}

/// Newest commit touching each path, scanning commits newest first.
pub fn parse_last_commits(
    output: &str,
) -> Result<HashMap<String, (CommitId, DateTime<FixedOffset>)>, String> {
    let mut last_commits = HashMap::new();

    for chunk in output.split(RECORD_SEPARATOR).filter(|c| !c.trim().is_empty()) {
        let (header, paths) = chunk
            .split_once('\0')
            .unwrap_or((chunk.trim_end_matches('\n'), ""));
        let (id, date) = header
            .split_once(FIELD_SEPARATOR)
            .ok_or_else(|| format!("malformed commit header '{header}'"))?;
        let id = CommitId::try_parse(id).ok_or_else(|| format!("invalid commit id '{id}'"))?;
        let timestamp = parse_timestamp(date)?;

        let paths = paths.strip_prefix('\n').unwrap_or(paths);
        for path in paths.split('\0').filter(|path| !path.is_empty()) {
            last_commits
                .entry(path.to_string())
                .or_insert_with(|| (id.clone(), timestamp));
        }
    }

    Ok(last_commits)
}
