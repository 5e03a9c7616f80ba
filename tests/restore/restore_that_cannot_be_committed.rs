use crate::common::command::{
    commit_count, dataset_with_three_commits, git_commit_all, git_stdout, head_commit_sha,
    run_dflow_command,
};
use crate::common::file::{FileSpec, delete_path, write_file};
use assert_fs::TempDir;
use pretty_assertions::assert_eq;
use predicates::prelude::predicate;
use rstest::rstest;

fn rewrite_notes(dir: &std::path::Path) {
    write_file(FileSpec::new(dir.join("notes.txt"), "second run\n".to_string()));
    git_commit_all(dir, "Rerun", "2023-01-02 09:00:00 +0000");
}

#[cfg(unix)]
fn install_failing_pre_commit_hook(dir: &std::path::Path) -> Result<(), Box<dyn std::error::Error>> {
    use std::os::unix::fs::PermissionsExt;

    let hook = dir.join(".git").join("hooks").join("pre-commit");
    std::fs::create_dir_all(hook.parent().ok_or("hook has no parent")?)?;
    std::fs::write(&hook, "#!/bin/sh\necho 'rejected by hook' >&2\nexit 1\n")?;
    std::fs::set_permissions(&hook, std::fs::Permissions::from_mode(0o755))?;

    Ok(())
}

#[cfg(unix)]
#[rstest]
fn failed_commit_keeps_the_restored_file_on_disk(
    dataset_with_three_commits: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = dataset_with_three_commits;
    rewrite_notes(dir.path());
    delete_path(&dir.path().join("notes.txt"));
    install_failing_pre_commit_hook(dir.path())?;
    let head = head_commit_sha(dir.path())?;
    let commits = commit_count(dir.path())?;

    run_dflow_command(dir.path(), &["restore", "notes.txt", "--from", "HEAD~1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("'notes.txt' was restored from 'HEAD~1'"))
        .stderr(predicate::str::contains("but not committed"));

    assert_eq!(std::fs::read_to_string(dir.path().join("notes.txt"))?, "first run\n");
    assert_eq!(head_commit_sha(dir.path())?, head);
    assert_eq!(commit_count(dir.path())?, commits);

    // nothing stays locked, so a retry without the hook goes through
    std::fs::remove_file(dir.path().join(".git").join("hooks").join("pre-commit"))?;
    run_dflow_command(dir.path(), &["restore", "notes.txt", "--from", "HEAD~1", "--overwrite"])
        .assert()
        .success();
    assert_eq!(commit_count(dir.path())?, commits + 1);

    Ok(())
}

#[rstest]
fn held_index_lock_is_a_write_conflict_without_mutation(
    dataset_with_three_commits: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = dataset_with_three_commits;
    rewrite_notes(dir.path());
    delete_path(&dir.path().join("notes.txt"));
    let head = head_commit_sha(dir.path())?;
    let commits = commit_count(dir.path())?;
    let index_before = git_stdout(dir.path(), &["ls-files", "--stage"])?;

    let index_lock = dir.path().join(".git").join("index.lock");
    std::fs::write(&index_lock, "")?;

    run_dflow_command(dir.path(), &["restore", "notes.txt", "--from", "HEAD~1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("write conflict on 'notes.txt'"));

    assert!(!dir.path().join("notes.txt").exists());
    std::fs::remove_file(&index_lock)?;
    assert_eq!(git_stdout(dir.path(), &["ls-files", "--stage"])?, index_before);
    assert_eq!(head_commit_sha(dir.path())?, head);
    assert_eq!(commit_count(dir.path())?, commits);

    Ok(())
}
