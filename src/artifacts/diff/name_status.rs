//! Parser for NUL-terminated `--name-status` output
//!
//! ```text
//! M\0path\0
//! R087\0old\0new\0
//! ```

use crate::artifacts::diff::change::{ChangeKind, PathChange};

pub fn parse_name_status(output: &str) -> Result<Vec<PathChange>, String> {
    let mut fields = output.split('\0').filter(|f| !f.is_empty());
    let mut changes = Vec::new();

    while let Some(code) = fields.next() {
        let code = code.trim_start_matches('\n');
        let letter = code
            .chars()
            .next()
            .ok_or_else(|| "empty status field".to_string())?;

        let mut next_path = |what: &str| {
            fields
                .next()
                .map(str::to_string)
                .ok_or_else(|| format!("status '{code}' without {what} path"))
        };

        let change = match letter {
            'A' => PathChange::new(next_path("a")?, ChangeKind::Added),
            'M' | 'T' | 'U' => PathChange::new(next_path("a")?, ChangeKind::Modified),
            'D' => PathChange::new(next_path("a")?, ChangeKind::Deleted),
            'R' => {
                let from = next_path("a source")?;
                let to = next_path("a destination")?;
                PathChange::renamed(from, to)
            }
            'C' => {
                // copies leave the source untouched
                let _source = next_path("a source")?;
                PathChange::new(next_path("a destination")?, ChangeKind::Added)
            }
            other => return Err(format!("unknown change status '{other}'")),
        };

        changes.push(change);
    }

    Ok(changes)
}
