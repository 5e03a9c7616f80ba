use crate::common::command::{
    commit_count, dataset_with_three_commits, head_commit_sha, porcelain_status, run_dflow_command,
};
use crate::common::file::delete_path;
use assert_fs::TempDir;
use pretty_assertions::assert_eq;
use predicates::prelude::predicate;
use rstest::rstest;

struct Snapshot {
    head: String,
    commits: usize,
    status: String,
}

fn snapshot(dir: &std::path::Path) -> Result<Snapshot, Box<dyn std::error::Error>> {
    Ok(Snapshot {
        head: head_commit_sha(dir)?,
        commits: commit_count(dir)?,
        status: porcelain_status(dir)?,
    })
}

fn assert_untouched(dir: &std::path::Path, before: &Snapshot) -> Result<(), Box<dyn std::error::Error>> {
    let after = snapshot(dir)?;
    assert_eq!(after.head, before.head);
    assert_eq!(after.commits, before.commits);
    assert_eq!(after.status, before.status);
    Ok(())
}

#[rstest]
fn restore_at_a_revision_without_the_path_fails(
    dataset_with_three_commits: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = dataset_with_three_commits;
    delete_path(&dir.path().join("notes.txt"));
    let before = snapshot(dir.path())?;

    run_dflow_command(dir.path(), &["restore", "notes.txt", "--from", "HEAD~2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot restore 'notes.txt'"))
        .stderr(predicate::str::contains("no such file at revision 'HEAD~2'"));

    assert!(!dir.path().join("notes.txt").exists());
    assert_untouched(dir.path(), &before)
}

#[rstest]
fn restore_of_a_present_file_requires_overwrite(
    dataset_with_three_commits: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = dataset_with_three_commits;
    let before = snapshot(dir.path())?;

    run_dflow_command(dir.path(), &["restore", "notes.txt", "--from", "HEAD"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("overwriting must be acknowledged"));

    assert_untouched(dir.path(), &before)
}

#[rstest]
fn restore_of_a_directory_is_rejected(
    dataset_with_three_commits: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = dataset_with_three_commits;
    delete_path(&dir.path().join("data"));
    let before = snapshot(dir.path())?;

    run_dflow_command(dir.path(), &["restore", "data", "--from", "HEAD"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot restore 'data'"));

    assert_untouched(dir.path(), &before)
}

#[rstest]
fn restore_outside_the_dataset_is_rejected(
    dataset_with_three_commits: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = dataset_with_three_commits;
    let before = snapshot(dir.path())?;

    run_dflow_command(dir.path(), &["restore", "../escape.txt", "--from", "HEAD"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot restore '../escape.txt'"));

    assert_untouched(dir.path(), &before)
}

#[rstest]
fn restore_from_an_unknown_revision_fails(
    dataset_with_three_commits: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = dataset_with_three_commits;
    delete_path(&dir.path().join("notes.txt"));
    let before = snapshot(dir.path())?;

    run_dflow_command(dir.path(), &["restore", "notes.txt", "--from", "deadbeef"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("revision 'deadbeef' not found"));

    assert_untouched(dir.path(), &before)
}
