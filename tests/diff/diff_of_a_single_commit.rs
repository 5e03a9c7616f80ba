use crate::common::command::{
    dataset_with_three_commits, git_commit_all, git_stdout, run_dflow_command, run_git_command,
};
use crate::common::file::{FileSpec, delete_path, write_file};
use assert_fs::TempDir;
use pretty_assertions::assert_eq;
use predicates::prelude::predicate;
use rstest::rstest;
use serde_json::{Value, json};

#[rstest]
fn diff_lists_changes_against_the_first_parent(
    dataset_with_three_commits: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = dataset_with_three_commits;
    write_file(FileSpec::new(
        dir.path().join("data").join("a.csv"),
        "id,value\n1,11\n".to_string(),
    ));
    delete_path(&dir.path().join("notes.txt"));
    write_file(FileSpec::new(
        dir.path().join("results").join("summary.csv"),
        "mean\n15\n".to_string(),
    ));
    git_commit_all(dir.path(), "Run analysis", "2023-01-02 09:00:00 +0000");

    let output = run_dflow_command(dir.path(), &["diff", "HEAD", "--json"])
        .assert()
        .success();
    let changes: Value = serde_json::from_slice(&output.get_output().stdout)?;

    assert_eq!(
        changes,
        json!([
            { "path": "data/a.csv", "kind": "modified" },
            { "path": "notes.txt", "kind": "deleted" },
            { "path": "results/summary.csv", "kind": "added" },
        ])
    );

    run_dflow_command(dir.path(), &["diff", "HEAD", "--name-status", "--diff-filter", "AD"])
        .assert()
        .success()
        .stdout("D\tnotes.txt\nA\tresults/summary.csv\n");

    Ok(())
}

#[rstest]
fn diff_of_the_root_commit_lists_every_file_as_added(
    dataset_with_three_commits: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = dataset_with_three_commits;
    let root = git_stdout(dir.path(), &["rev-list", "--max-parents=0", "HEAD"])?;

    run_dflow_command(dir.path(), &["diff", &root, "--name-status"])
        .assert()
        .success()
        .stdout("A\tdata/a.csv\n");

    Ok(())
}

#[rstest]
fn diff_reports_renames(dataset_with_three_commits: TempDir) -> Result<(), Box<dyn std::error::Error>> {
    let dir = dataset_with_three_commits;
    std::fs::rename(dir.path().join("notes.txt"), dir.path().join("README.txt"))?;
    git_commit_all(dir.path(), "Rename notes", "2023-01-02 09:00:00 +0000");

    run_dflow_command(dir.path(), &["diff", "HEAD", "--name-status"])
        .assert()
        .success()
        .stdout("R\tnotes.txt\tREADME.txt\n");

    Ok(())
}

#[rstest]
fn diff_of_an_unknown_revision_fails(
    dataset_with_three_commits: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    run_dflow_command(dataset_with_three_commits.path(), &["diff", "no-such-branch"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("revision 'no-such-branch' not found"));

    Ok(())
}

#[rstest]
fn diff_rejects_an_unknown_filter(
    dataset_with_three_commits: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    run_dflow_command(dataset_with_three_commits.path(), &["diff", "HEAD", "--diff-filter", "XZ"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid diff filter"));

    Ok(())
}

#[rstest]
fn diff_of_a_merge_follows_the_first_parent(
    dataset_with_three_commits: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = dataset_with_three_commits;
    let main = git_stdout(dir.path(), &["rev-parse", "--abbrev-ref", "HEAD"])?;
    run_git_command(dir.path(), &["checkout", "--quiet", "-b", "side"])
        .assert()
        .success();
    write_file(FileSpec::new(
        dir.path().join("results").join("side.csv"),
        "1\n".to_string(),
    ));
    git_commit_all(dir.path(), "Side result", "2023-01-02 09:00:00 +0000");
    run_git_command(dir.path(), &["checkout", "--quiet", &main])
        .assert()
        .success();
    run_git_command(dir.path(), &["merge", "--quiet", "--no-ff", "--no-edit", "side"])
        .assert()
        .success();

    run_dflow_command(dir.path(), &["diff", "HEAD", "--name-status"])
        .assert()
        .success()
        .stdout("A\tresults/side.csv\n");

    Ok(())
}
