use crate::artifacts::status::path_entry::{EntryKind, PartialScanWarning};
use chrono::{DateTime, Utc};
use std::fs::Metadata;
use std::path::{Component, Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

const VCS_METADATA: &str = ".git";
const ANNEX_OBJECTS: &str = ".git/annex/objects";

/// One entry found on disk, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedEntry {
    pub path: String,
    pub kind: EntryKind,
    pub size: Option<u64>,
    pub modified: Option<DateTime<Utc>>,
    pub annexed: bool,
    /// Set when the entry's metadata could not be read.
    pub warning: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct WorkspaceScan {
    pub entries: Vec<ScannedEntry>,
    pub warnings: Vec<PartialScanWarning>,
}

#[derive(Debug, Clone)]
pub struct Workspace {
    path: Box<Path>,
    ignored_names: Vec<String>,
}

impl Workspace {
    pub fn new(path: Box<Path>, ignored_names: Vec<String>) -> Self {
        Workspace {
            path,
            ignored_names,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn is_ignored(&self, name: &str) -> bool {
        name == VCS_METADATA || self.ignored_names.iter().any(|ignored| ignored == name)
    }

    /// Whether any component of a relative path is skipped by the scan.
    pub fn is_ignored_path(&self, path: &str) -> bool {
        path.split('/').any(|part| self.is_ignored(part))
    }

    /// Walks the whole working tree, sorted by file name at every level.
    ///
    /// Never fails as a whole: unreadable entries are kept with a warning and
    /// unreadable directories are reported and skipped.
    pub fn scan(&self) -> WorkspaceScan {
        let mut scan = WorkspaceScan::default();

        let walker = WalkDir::new(&self.path)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !self.is_ignored(&entry.file_name().to_string_lossy()));

        for entry in walker {
            match entry {
                Ok(entry) => {
                    if let Some(scanned) = self.scan_entry(&entry, &mut scan.warnings) {
                        scan.entries.push(scanned);
                    }
                }
                Err(err) => {
                    let path = err
                        .path()
                        .and_then(|p| self.relative_path(p))
                        .unwrap_or_else(|| ".".to_string());
                    scan.warnings.push(PartialScanWarning {
                        path,
                        message: err.to_string(),
                    });
                }
            }
        }

        scan.entries.sort_by(|a, b| a.path.cmp(&b.path));
        scan
    }

    fn scan_entry(
        &self,
        entry: &DirEntry,
        warnings: &mut Vec<PartialScanWarning>,
    ) -> Option<ScannedEntry> {
        let path = match entry.path().strip_prefix(&self.path).ok()?.to_str() {
            Some(path) => to_slash_path(path),
            None => {
                warnings.push(PartialScanWarning {
                    path: entry.path().to_string_lossy().into_owned(),
                    message: "path is not valid UTF-8".to_string(),
                });
                return None;
            }
        };

        let file_type = entry.file_type();
        if file_type.is_dir() {
            return Some(ScannedEntry {
                path,
                kind: EntryKind::Directory,
                size: None,
                modified: None,
                annexed: false,
                warning: None,
            });
        }

        let scanned = if file_type.is_symlink() {
            self.scan_symlink(entry.path(), path)
        } else {
            match entry.metadata() {
                Ok(metadata) => ScannedEntry {
                    path,
                    kind: EntryKind::File,
                    size: Some(metadata.len()),
                    modified: modified_time(&metadata),
                    annexed: false,
                    warning: None,
                },
                Err(err) => unreadable(path, err.to_string()),
            }
        };

        if let Some(message) = &scanned.warning {
            warnings.push(PartialScanWarning {
                path: scanned.path.clone(),
                message: message.clone(),
            });
        }

        Some(scanned)
    }

    // Annexed content lives behind symlinks into the annex object store;
    // an unfetched object leaves the link dangling.
    fn scan_symlink(&self, full_path: &Path, path: String) -> ScannedEntry {
        let annexed = std::fs::read_link(full_path)
            .map(|target| target.to_string_lossy().replace('\\', "/").contains(ANNEX_OBJECTS))
            .unwrap_or(false);

        match (std::fs::metadata(full_path), std::fs::symlink_metadata(full_path)) {
            (Ok(target), _) => ScannedEntry {
                path,
                kind: EntryKind::File,
                size: Some(target.len()),
                modified: modified_time(&target),
                annexed,
                warning: None,
            },
            (Err(_), Ok(link)) => ScannedEntry {
                path,
                kind: EntryKind::File,
                size: None,
                modified: modified_time(&link),
                annexed,
                warning: None,
            },
            (Err(_), Err(err)) => unreadable(path, err.to_string()),
        }
    }

    fn relative_path(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.path).ok()?;
        Some(to_slash_path(&relative.to_string_lossy()))
    }

    /// Whether anything (file, directory or dangling link) exists at a
    /// relative path.
    pub fn exists(&self, path: &str) -> bool {
        std::fs::symlink_metadata(self.path.join(path)).is_ok()
    }

    pub fn is_dir(&self, path: &str) -> bool {
        self.path.join(path).is_dir()
    }
}

fn unreadable(path: String, message: String) -> ScannedEntry {
    ScannedEntry {
        path,
        kind: EntryKind::File,
        size: None,
        modified: None,
        annexed: false,
        warning: Some(message),
    }
}

fn modified_time(metadata: &Metadata) -> Option<DateTime<Utc>> {
    metadata.modified().ok().map(DateTime::<Utc>::from)
}

fn to_slash_path(path: &str) -> String {
    if std::path::MAIN_SEPARATOR == '/' {
        path.to_string()
    } else {
        path.replace(std::path::MAIN_SEPARATOR, "/")
    }
}

/// Normalises a caller-supplied relative path to the `/`-separated form used
/// in snapshots.
///
/// Rejects empty and absolute paths, `..` components and anything inside the
/// version-control metadata directory.
pub fn normalize_relative_path(path: &str) -> Result<String, String> {
    let candidate = PathBuf::from(path.replace('\\', "/"));
    if path.trim().is_empty() {
        return Err("path is empty".to_string());
    }
    if candidate.is_absolute() || path.starts_with('/') {
        return Err("path must be relative to the dataset root".to_string());
    }

    let mut parts = Vec::new();
    for component in candidate.components() {
        match component {
            Component::Normal(part) => {
                let part = part
                    .to_str()
                    .ok_or_else(|| "path is not valid UTF-8".to_string())?;
                parts.push(part.to_string());
            }
            Component::CurDir => {}
            Component::ParentDir => return Err("path escapes the dataset root".to_string()),
            Component::RootDir | Component::Prefix(_) => {
                return Err("path must be relative to the dataset root".to_string());
            }
        }
    }

    match parts.first() {
        None => Err("path is empty".to_string()),
        Some(first) if first == VCS_METADATA => {
            Err("path points into version-control metadata".to_string())
        }
        Some(_) => Ok(parts.join("/")),
    }
}
