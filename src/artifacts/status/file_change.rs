use std::collections::BTreeMap;

/// How a path differs from the last commit, as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WorkingChange {
    Modified,
    Untracked,
    Deleted,
}

impl WorkingChange {
    /// Maps a two-letter porcelain code (`XY`) to a working change.
    ///
    /// Staged additions were never committed and count as untracked; any
    /// deletion wins over a modification.
    pub fn from_porcelain(code: &str) -> Option<Self> {
        let mut chars = code.chars();
        let (x, y) = (chars.next()?, chars.next()?);

        match (x, y) {
            ('?', '?') => Some(WorkingChange::Untracked),
            ('!', '!') => None,
            ('D', _) | (_, 'D') => Some(WorkingChange::Deleted),
            ('A', _) => Some(WorkingChange::Untracked),
            (x, y) if is_change_letter(x) || is_change_letter(y) => Some(WorkingChange::Modified),
            _ => None,
        }
    }
}

fn is_change_letter(c: char) -> bool {
    matches!(c, 'M' | 'T' | 'R' | 'C' | 'U' | 'A')
}

impl From<&WorkingChange> for &str {
    fn from(change: &WorkingChange) -> Self {
        match change {
            WorkingChange::Modified => "M",
            WorkingChange::Untracked => "??",
            WorkingChange::Deleted => "D",
        }
    }
}

impl std::fmt::Display for WorkingChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let change_str: &str = self.into();
        write!(f, "{}", change_str)
    }
}

pub type ChangeSet = BTreeMap<String, WorkingChange>;

/// Parses `status --porcelain=v1 -z` output.
///
/// Renamed and copied entries carry their source as an extra field; the
/// source of a rename no longer exists under its old name and is reported as
/// deleted.
pub fn parse_porcelain(output: &str) -> Result<ChangeSet, String> {
    let mut fields = output.split('\0').filter(|f| !f.is_empty());
    let mut changes = ChangeSet::new();

    while let Some(field) = fields.next() {
        if field.len() < 4 || !field.as_bytes()[..3].is_ascii() || field.as_bytes()[2] != b' ' {
            return Err(format!("malformed status entry '{field}'"));
        }

        let (code, path) = (&field[..2], &field[3..]);
        let change = WorkingChange::from_porcelain(code);

        if code.contains('R') || code.contains('C') {
            let source = fields
                .next()
                .ok_or_else(|| format!("status entry '{field}' without source path"))?;
            if code.starts_with('R') {
                changes.insert(source.to_string(), WorkingChange::Deleted);
            }
        }

        if let Some(change) = change {
            changes.insert(path.trim_end_matches('/').to_string(), change);
        }
    }

    Ok(changes)
}
