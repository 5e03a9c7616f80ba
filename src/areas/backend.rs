//! Version-control backend adapter
//!
//! Thin command interface over the `git` executable. Every call runs as a
//! separate process off the caller's task, bounded by the adapter timeout;
//! on expiry the process is killed and reaped before `BackendTimeout` is
//! returned. No status classification happens here.

use crate::artifacts::diff::change::PathChange;
use crate::artifacts::diff::name_status::parse_name_status;
use crate::artifacts::history::commit_id::{CommitId, is_plausible_revision};
use crate::artifacts::history::commit_record::CommitRecord;
use crate::artifacts::history::log_format::{
    COMMIT_HEADER_FORMAT, LAST_COMMIT_FORMAT, parse_commit_headers, parse_last_commits,
};
use crate::artifacts::status::file_change::{ChangeSet, parse_porcelain};
use crate::error::{DataflowError, Result};
use bytes::Bytes;
use chrono::{DateTime, FixedOffset};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::{debug, warn};

const DATALAD_PROGRAM: &str = "datalad";
const INDEX_LOCK: &str = "index.lock";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Read,
    Write,
}

#[derive(Debug)]
struct CommandOutput {
    status: ExitStatus,
    stdout: Vec<u8>,
    stderr: String,
}

/// Paths known to version control: everything in the index plus everything
/// in the `HEAD` tree (with committed blob sizes).
#[derive(Debug, Clone, Default)]
pub struct TrackedPaths {
    pub index: BTreeSet<String>,
    pub committed: BTreeMap<String, Option<u64>>,
}

impl TrackedPaths {
    pub fn contains(&self, path: &str) -> bool {
        self.index.contains(path) || self.committed.contains_key(path)
    }

    pub fn is_committed(&self, path: &str) -> bool {
        self.committed.contains_key(path)
    }

    pub fn committed_size(&self, path: &str) -> Option<u64> {
        self.committed.get(path).copied().flatten()
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.index
            .iter()
            .chain(self.committed.keys().filter(|p| !self.index.contains(*p)))
    }
}

#[derive(Debug, Clone)]
pub struct GitBackend {
    program: String,
    timeout: Duration,
}

impl GitBackend {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        GitBackend {
            program: program.into(),
            timeout,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fails with `NotARepository` unless `root` is the top level of a work
    /// tree.
    pub async fn ensure_repository(&self, root: &Path) -> Result<()> {
        let output = self
            .run(root, "rev-parse", &["rev-parse", "--show-toplevel"], Access::Read)
            .await?;
        if !output.status.success() {
            return Err(self.classify_failure(root, "rev-parse", &output));
        }

        let toplevel = PathBuf::from(self.stdout_text(root, "rev-parse", output)?.trim());
        let same_root = match (toplevel.canonicalize(), root.canonicalize()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        };

        if same_root {
            Ok(())
        } else {
            Err(DataflowError::NotARepository {
                root: root.to_path_buf(),
            })
        }
    }

    pub async fn has_head(&self, root: &Path) -> Result<bool> {
        Ok(self.head_commit(root).await?.is_some())
    }

    /// Commit `HEAD` points at; `None` before the first commit.
    pub async fn head_commit(&self, root: &Path) -> Result<Option<CommitId>> {
        let output = self
            .run(
                root,
                "rev-parse",
                &["rev-parse", "--verify", "--quiet", "HEAD^{commit}"],
                Access::Read,
            )
            .await?;

        match output.status.code() {
            Some(0) => {
                let text = self.stdout_text(root, "rev-parse", output)?;
                CommitId::try_parse(&text).map(Some).ok_or_else(|| {
                    DataflowError::malformed(root, "rev-parse", format!("'{}'", text.trim()))
                })
            }
            Some(1) => Ok(None),
            _ => Err(self.classify_failure(root, "rev-parse", &output)),
        }
    }

    pub async fn list_tracked_paths(&self, root: &Path) -> Result<TrackedPaths> {
        let listing = self
            .checked(root, "ls-files", &["ls-files", "-z"], Access::Read)
            .await?;
        let index = listing
            .split('\0')
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect::<BTreeSet<_>>();

        let committed = self.committed_sizes(root).await?;

        Ok(TrackedPaths { index, committed })
    }

    /// Blob sizes of every path of the `HEAD` tree; empty before the first
    /// commit. Submodule entries have no size.
    pub async fn committed_sizes(&self, root: &Path) -> Result<BTreeMap<String, Option<u64>>> {
        if !self.has_head(root).await? {
            return Ok(BTreeMap::new());
        }

        let listing = self
            .checked(
                root,
                "ls-tree",
                &["ls-tree", "-r", "-l", "-z", "HEAD"],
                Access::Read,
            )
            .await?;

        listing
            .split('\0')
            .filter(|record| !record.is_empty())
            .map(|record| {
                let (meta, path) = record
                    .split_once('\t')
                    .ok_or_else(|| DataflowError::malformed(root, "ls-tree", record))?;
                let size = meta
                    .split_whitespace()
                    .nth(3)
                    .ok_or_else(|| DataflowError::malformed(root, "ls-tree", record))?;
                let size = match size {
                    "-" => None,
                    n => Some(n.parse::<u64>().map_err(|_| {
                        DataflowError::malformed(root, "ls-tree", format!("bad size '{n}'"))
                    })?),
                };
                Ok((path.to_string(), size))
            })
            .collect()
    }

    pub async fn working_tree_status(&self, root: &Path) -> Result<ChangeSet> {
        let listing = self
            .checked(
                root,
                "status",
                &[
                    "status",
                    "--porcelain=v1",
                    "-z",
                    "--untracked-files=all",
                    "--ignored=no",
                ],
                Access::Read,
            )
            .await?;

        parse_porcelain(&listing).map_err(|detail| DataflowError::malformed(root, "status", detail))
    }

    /// Newest first, at most `max_entries`, in the backend's native order.
    pub async fn commit_log(&self, root: &Path, max_entries: usize) -> Result<Vec<CommitRecord>> {
        if max_entries == 0 || !self.has_head(root).await? {
            return Ok(Vec::new());
        }

        let limit = format!("--max-count={max_entries}");
        let listing = self
            .checked(
                root,
                "log",
                &["log", "-z", &limit, COMMIT_HEADER_FORMAT, "HEAD"],
                Access::Read,
            )
            .await?;

        self.with_changes(root, listing).await
    }

    /// Commits touching one path, following renames.
    pub async fn file_history(
        &self,
        root: &Path,
        path: &str,
        max_entries: usize,
    ) -> Result<Vec<CommitRecord>> {
        if max_entries == 0 || !self.has_head(root).await? {
            return Ok(Vec::new());
        }

        let limit = format!("--max-count={max_entries}");
        let listing = self
            .checked(
                root,
                "log",
                &[
                    "log",
                    "-z",
                    "--follow",
                    &limit,
                    COMMIT_HEADER_FORMAT,
                    "HEAD",
                    "--",
                    path,
                ],
                Access::Read,
            )
            .await?;

        self.with_changes(root, listing).await
    }

    async fn with_changes(&self, root: &Path, listing: String) -> Result<Vec<CommitRecord>> {
        let mut records = parse_commit_headers(&listing)
            .map_err(|detail| DataflowError::malformed(root, "log", detail))?;

        for record in records.iter_mut() {
            record.changes = self
                .changes_against_first_parent(root, &record.id, record.parents.first())
                .await?;
        }

        Ok(records)
    }

    /// Change list of one commit against its first parent; root commits
    /// are compared with the empty tree.
    pub async fn diff_for_commit(&self, root: &Path, commit: &str) -> Result<Vec<PathChange>> {
        let id = self.resolve_revision(root, commit).await?;
        let listing = self
            .checked(
                root,
                "diff-tree",
                &[
                    "diff-tree",
                    "-r",
                    "-M",
                    "-z",
                    "--name-status",
                    "--no-commit-id",
                    "--root",
                    "--diff-merges=first-parent",
                    id.as_ref(),
                ],
                Access::Read,
            )
            .await?;

        parse_name_status(&listing)
            .map_err(|detail| DataflowError::malformed(root, "diff-tree", detail))
    }

    /// Unified patch of one commit against its first parent, optionally
    /// limited to `path`.
    pub async fn file_diff(&self, root: &Path, commit: &str, path: Option<&str>) -> Result<Bytes> {
        let id = self.resolve_revision(root, commit).await?;

        let mut args = vec![
            "show",
            "--format=",
            "--no-color",
            "--no-ext-diff",
            "-M",
            "--diff-merges=first-parent",
            id.as_ref(),
        ];
        if let Some(path) = path {
            args.extend_from_slice(&["--", path]);
        }

        let output = self.run(root, "show", &args, Access::Read).await?;
        if !output.status.success() {
            return Err(self.classify_failure(root, "show", &output));
        }

        Ok(Bytes::from(output.stdout))
    }

    /// Full record of a single commit, change list included.
    pub async fn commit_record(&self, root: &Path, commit: &str) -> Result<CommitRecord> {
        let id = self.resolve_revision(root, commit).await?;
        let listing = self
            .checked(
                root,
                "log",
                &["log", "-z", "--max-count=1", COMMIT_HEADER_FORMAT, id.as_ref()],
                Access::Read,
            )
            .await?;

        self.with_changes(root, listing)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DataflowError::malformed(root, "log", "no commit header returned"))
    }

    async fn changes_against_first_parent(
        &self,
        root: &Path,
        id: &CommitId,
        parent: Option<&CommitId>,
    ) -> Result<Vec<PathChange>> {
        let mut args = vec![
            "diff-tree",
            "-r",
            "-M",
            "-z",
            "--name-status",
            "--no-commit-id",
        ];
        match parent {
            Some(parent) => args.push(parent.as_ref()),
            None => args.push("--root"),
        }
        args.push(id.as_ref());

        let listing = self.checked(root, "diff-tree", &args, Access::Read).await?;

        parse_name_status(&listing)
            .map_err(|detail| DataflowError::malformed(root, "diff-tree", detail))
    }

    /// Change list between a revision and `HEAD`.
    pub async fn compare_to_head(&self, root: &Path, revision: &str) -> Result<Vec<PathChange>> {
        let id = self.resolve_revision(root, revision).await?;
        let listing = self
            .checked(
                root,
                "diff",
                &["diff", "-M", "-z", "--name-status", id.as_ref(), "HEAD"],
                Access::Read,
            )
            .await?;

        parse_name_status(&listing).map_err(|detail| DataflowError::malformed(root, "diff", detail))
    }

    /// Newest commit id and commit time per path, scanning at most
    /// `max_commits` commits.
    pub async fn last_commits(
        &self,
        root: &Path,
        max_commits: usize,
    ) -> Result<HashMap<String, (CommitId, DateTime<FixedOffset>)>> {
        if max_commits == 0 || !self.has_head(root).await? {
            return Ok(HashMap::new());
        }

        let limit = format!("--max-count={max_commits}");
        let listing = self
            .checked(
                root,
                "log",
                &[
                    "log",
                    "-z",
                    &limit,
                    LAST_COMMIT_FORMAT,
                    "--name-only",
                    "--no-renames",
                    "HEAD",
                ],
                Access::Read,
            )
            .await?;

        parse_last_commits(&listing).map_err(|detail| DataflowError::malformed(root, "log", detail))
    }

    pub async fn resolve_revision(&self, root: &Path, revision: &str) -> Result<CommitId> {
        if !is_plausible_revision(revision) {
            return Err(DataflowError::RevisionNotFound {
                root: root.to_path_buf(),
                revision: revision.to_string(),
            });
        }

        let spec = format!("{revision}^{{commit}}");
        let output = self
            .run(
                root,
                "rev-parse",
                &["rev-parse", "--verify", "--quiet", &spec],
                Access::Read,
            )
            .await?;

        if !output.status.success() {
            return match self.classify_failure(root, "rev-parse", &output) {
                err @ DataflowError::NotARepository { .. } => Err(err),
                _ => Err(DataflowError::RevisionNotFound {
                    root: root.to_path_buf(),
                    revision: revision.to_string(),
                }),
            };
        }

        let text = self.stdout_text(root, "rev-parse", output)?;
        CommitId::try_parse(&text)
            .ok_or_else(|| DataflowError::malformed(root, "rev-parse", format!("'{}'", text.trim())))
    }

    /// Whether `path` names a file (blob or symlink) in the tree of `commit`.
    pub async fn path_exists_at_revision(
        &self,
        root: &Path,
        path: &str,
        commit: &CommitId,
    ) -> Result<bool> {
        let object = format!("{commit}:{path}");
        let output = self
            .run(root, "cat-file", &["cat-file", "-t", &object], Access::Read)
            .await?;
        if !output.status.success() {
            return Ok(false);
        }

        Ok(self.stdout_text(root, "cat-file", output)?.trim() == "blob")
    }

    pub async fn read_blob_at_revision(
        &self,
        root: &Path,
        path: &str,
        revision: &str,
    ) -> Result<Bytes> {
        let commit = self.resolve_revision(root, revision).await?;
        self.ensure_path_at_revision(root, path, revision, &commit)
            .await?;

        let object = format!("{commit}:{path}");
        let output = self
            .run(root, "cat-file", &["cat-file", "blob", &object], Access::Read)
            .await?;
        if !output.status.success() {
            return Err(self.classify_failure(root, "cat-file", &output));
        }

        Ok(Bytes::from(output.stdout))
    }

    /// Writes the content of `path` at `revision` into the working tree (and
    /// the index).
    pub async fn checkout_path_at_revision(
        &self,
        root: &Path,
        path: &str,
        revision: &str,
    ) -> Result<CommitId> {
        let commit = self.resolve_revision(root, revision).await?;
        self.ensure_path_at_revision(root, path, revision, &commit)
            .await?;
        self.ensure_index_unlocked(root, path).await?;

        let output = self
            .run(
                root,
                "checkout",
                &["checkout", commit.as_ref(), "--", path],
                Access::Write,
            )
            .await?;

        if !output.status.success() {
            return Err(self.write_failure(root, path, "checkout", &output));
        }

        Ok(commit)
    }

    /// Whether the index holds changes to any of `paths` relative to `HEAD`.
    pub async fn has_staged_changes(&self, root: &Path, paths: &[&str]) -> Result<bool> {
        let mut args = vec!["diff", "--cached", "--quiet", "HEAD", "--"];
        args.extend_from_slice(paths);

        let output = self.run(root, "diff", &args, Access::Read).await?;
        match output.status.code() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(self.classify_failure(root, "diff", &output)),
        }
    }

    /// Stages and commits exactly `paths`; other staged changes stay out of
    /// the commit.
    pub async fn commit_paths(
        &self,
        root: &Path,
        paths: &[&str],
        message: &str,
    ) -> Result<CommitRecord> {
        // git commits the whole index when the pathspec is empty
        let Some(&first) = paths.first() else {
            return Err(DataflowError::EmptyPathspec {
                root: root.to_path_buf(),
                operation: "commit".to_string(),
            });
        };
        self.ensure_index_unlocked(root, first).await?;

        let mut add = vec!["add", "-A", "--"];
        add.extend_from_slice(paths);
        let output = self.run(root, "add", &add, Access::Write).await?;
        if !output.status.success() {
            return Err(self.write_failure(root, first, "add", &output));
        }

        let mut commit = vec!["commit", "--quiet", "--no-edit", "-m", message, "--"];
        commit.extend_from_slice(paths);
        let output = self.run(root, "commit", &commit, Access::Write).await?;
        if !output.status.success() {
            return Err(self.write_failure(root, first, "commit", &output));
        }

        self.commit_record(root, "HEAD").await
    }

    /// Records `paths` in the DataLad dataset metadata after a git commit.
    pub async fn datalad_save(&self, root: &Path, paths: &[&str], message: &str) -> Result<()> {
        let mut args = vec!["save", "-m", message, "--"];
        args.extend_from_slice(paths);

        let output = self
            .execute(root, DATALAD_PROGRAM, "datalad save", &args, Access::Write)
            .await?;
        if !output.status.success() {
            return Err(self.classify_failure(root, "datalad save", &output));
        }

        Ok(())
    }

    async fn ensure_path_at_revision(
        &self,
        root: &Path,
        path: &str,
        revision: &str,
        commit: &CommitId,
    ) -> Result<()> {
        if self.path_exists_at_revision(root, path, commit).await? {
            Ok(())
        } else {
            Err(DataflowError::PathNotFoundAtRevision {
                root: root.to_path_buf(),
                path: path.to_string(),
                revision: revision.to_string(),
            })
        }
    }

    async fn ensure_index_unlocked(&self, root: &Path, path: &str) -> Result<()> {
        let git_dir = self.git_dir(root).await?;
        if git_dir.join(INDEX_LOCK).exists() {
            return Err(DataflowError::WriteConflict {
                root: root.to_path_buf(),
                path: path.to_string(),
                detail: format!("{:?} is held by another process", git_dir.join(INDEX_LOCK)),
            });
        }

        Ok(())
    }

    pub async fn git_dir(&self, root: &Path) -> Result<PathBuf> {
        let text = self
            .checked(root, "rev-parse", &["rev-parse", "--git-dir"], Access::Read)
            .await?;
        let git_dir = PathBuf::from(text.trim());

        Ok(if git_dir.is_absolute() {
            git_dir
        } else {
            root.join(git_dir)
        })
    }

    async fn checked(
        &self,
        root: &Path,
        operation: &str,
        args: &[&str],
        access: Access,
    ) -> Result<String> {
        let output = self.run(root, operation, args, access).await?;
        if !output.status.success() {
            return Err(self.classify_failure(root, operation, &output));
        }

        self.stdout_text(root, operation, output)
    }

    fn stdout_text(&self, root: &Path, operation: &str, output: CommandOutput) -> Result<String> {
        String::from_utf8(output.stdout)
            .map_err(|e| DataflowError::malformed(root, operation, format!("non UTF-8 output: {e}")))
    }

    async fn run(
        &self,
        root: &Path,
        operation: &str,
        args: &[&str],
        access: Access,
    ) -> Result<CommandOutput> {
        let mut full_args = vec!["-c", "core.quotepath=off"];
        full_args.extend_from_slice(args);

        self.execute(root, &self.program, operation, &full_args, access)
            .await
    }

    async fn execute(
        &self,
        root: &Path,
        program: &str,
        operation: &str,
        args: &[&str],
        access: Access,
    ) -> Result<CommandOutput> {
        let started = Instant::now();

        let mut command = Command::new(program);
        command
            .args(args)
            .current_dir(root)
            .env("LC_ALL", "C")
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if access == Access::Read {
            command.env("GIT_OPTIONAL_LOCKS", "0");
        }

        let mut child = command.spawn().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => {
                DataflowError::BackendUnavailable {
                    root: root.to_path_buf(),
                    program: program.to_string(),
                    reason: e.to_string(),
                }
            }
            _ if !root.is_dir() => DataflowError::NotARepository {
                root: root.to_path_buf(),
            },
            _ => DataflowError::Io {
                root: root.to_path_buf(),
                path: PathBuf::from(program),
                source: e,
            },
        })?;

        let (mut stdout, mut stderr) = match (child.stdout.take(), child.stderr.take()) {
            (Some(stdout), Some(stderr)) => (stdout, stderr),
            _ => {
                return Err(DataflowError::BackendUnavailable {
                    root: root.to_path_buf(),
                    program: program.to_string(),
                    reason: "process output could not be captured".to_string(),
                });
            }
        };

        let collected = tokio::time::timeout(self.timeout, async {
            let mut out = Vec::new();
            let mut err = Vec::new();
            let (read_out, read_err) = tokio::join!(
                stdout.read_to_end(&mut out),
                stderr.read_to_end(&mut err)
            );
            read_out?;
            read_err?;
            let status = child.wait().await?;
            Ok::<_, std::io::Error>((status, out, err))
        })
        .await;

        match collected {
            Ok(Ok((status, stdout, stderr))) => {
                debug!(
                    operation,
                    ?args,
                    %status,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "backend call finished"
                );
                Ok(CommandOutput {
                    status,
                    stdout,
                    stderr: String::from_utf8_lossy(&stderr).into_owned(),
                })
            }
            Ok(Err(source)) => Err(DataflowError::Io {
                root: root.to_path_buf(),
                path: PathBuf::from(program),
                source,
            }),
            Err(_) => {
                // kill() also waits, so no zombie or lock holder is left behind
                if let Err(e) = child.kill().await {
                    warn!(operation, error = %e, "failed to kill timed out backend process");
                }
                warn!(
                    operation,
                    limit_ms = self.timeout.as_millis() as u64,
                    "backend call timed out"
                );
                Err(DataflowError::BackendTimeout {
                    root: root.to_path_buf(),
                    operation: operation.to_string(),
                    limit: self.timeout,
                })
            }
        }
    }

    fn classify_failure(&self, root: &Path, operation: &str, output: &CommandOutput) -> DataflowError {
        let stderr = output.stderr.trim();

        if stderr.to_ascii_lowercase().contains("not a git repository") {
            DataflowError::NotARepository {
                root: root.to_path_buf(),
            }
        } else {
            DataflowError::BackendFailed {
                root: root.to_path_buf(),
                operation: operation.to_string(),
                status: output.status.to_string(),
                stderr: stderr.to_string(),
            }
        }
    }

    fn write_failure(
        &self,
        root: &Path,
        path: &str,
        operation: &str,
        output: &CommandOutput,
    ) -> DataflowError {
        if output.stderr.contains(INDEX_LOCK) {
            DataflowError::WriteConflict {
                root: root.to_path_buf(),
                path: path.to_string(),
                detail: output.stderr.trim().to_string(),
            }
        } else {
            self.classify_failure(root, operation, output)
        }
    }
}
