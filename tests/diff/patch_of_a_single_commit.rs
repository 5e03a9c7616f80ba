use crate::common::command::{dataset_with_three_commits, git_commit_all, head_commit_sha, run_dflow_command};
use crate::common::file::{FileSpec, write_file};
use assert_fs::TempDir;
use pretty_assertions::assert_eq;
use predicates::prelude::*;
use rstest::rstest;
use serde_json::Value;

fn edit_two_files(dir: &std::path::Path) {
    write_file(FileSpec::new(
        dir.join("data").join("a.csv"),
        "id,value\n1,10\n2,21\n".to_string(),
    ));
    write_file(FileSpec::new(dir.join("notes.txt"), "second run\n".to_string()));
    git_commit_all(dir, "Rerun", "2023-01-02 09:00:00 +0000");
}

#[rstest]
fn patch_limited_to_one_path_shows_its_line_changes(
    dataset_with_three_commits: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = dataset_with_three_commits;
    edit_two_files(dir.path());

    let output = run_dflow_command(dir.path(), &["diff", "HEAD", "--patch", "data/a.csv"])
        .assert()
        .success();
    let patch = String::from_utf8(output.get_output().stdout.clone())?;

    assert!(patch.contains("--- a/data/a.csv"));
    assert!(patch.contains("-2,20\n"));
    assert!(patch.contains("+2,21\n"));
    assert!(!patch.contains("notes.txt"));

    Ok(())
}

#[rstest]
fn patch_without_a_path_covers_the_whole_commit(
    dataset_with_three_commits: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = dataset_with_three_commits;
    edit_two_files(dir.path());

    run_dflow_command(dir.path(), &["diff", "HEAD", "--patch"])
        .assert()
        .success()
        .stdout(predicate::str::contains("+2,21").and(predicate::str::contains("+second run")));

    Ok(())
}

#[rstest]
fn patch_of_the_root_commit_adds_every_line(
    dataset_with_three_commits: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = dataset_with_three_commits;

    run_dflow_command(dir.path(), &["diff", "HEAD~2", "--patch", "data/a.csv"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("new file mode")
                .and(predicate::str::contains("+id,value"))
                .and(predicate::str::contains("+2,20")),
        );

    Ok(())
}

#[rstest]
fn patch_as_json_names_the_commit(
    dataset_with_three_commits: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = dataset_with_three_commits;
    edit_two_files(dir.path());
    let head = head_commit_sha(dir.path())?;

    let output = run_dflow_command(dir.path(), &["diff", "HEAD", "--patch", "notes.txt", "--json"])
        .assert()
        .success();
    let view: Value = serde_json::from_slice(&output.get_output().stdout)?;

    assert_eq!(view["commit"], head.as_str());
    assert_eq!(view["path"], "notes.txt");
    assert!(
        view["patch"]
            .as_str()
            .is_some_and(|patch| patch.contains("+second run"))
    );

    Ok(())
}

#[rstest]
fn patch_rejects_paths_outside_the_dataset(
    dataset_with_three_commits: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    run_dflow_command(dataset_with_three_commits.path(), &["diff", "HEAD", "--patch", "../x"])
        .assert()
        .failure();

    run_dflow_command(dataset_with_three_commits.path(), &["diff", "HEAD", "data/a.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--patch"));

    Ok(())
}
