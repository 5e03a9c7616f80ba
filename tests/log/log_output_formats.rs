use crate::common::command::{dataset_with_three_commits, head_commit_sha, run_dflow_command};
use assert_fs::TempDir;
use pretty_assertions::assert_eq;
use predicates::prelude::predicate;
use rstest::rstest;

#[rstest]
fn show_multiple_commits_in_oneline_format(
    dataset_with_three_commits: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = dataset_with_three_commits;

    let output = run_dflow_command(dir.path(), &["log", "--oneline"])
        .assert()
        .success();
    let stdout = String::from_utf8(output.get_output().stdout.clone())?;
    let messages = stdout
        .lines()
        .map(|line| line.split_once(' ').map(|(_, message)| message).unwrap_or_default())
        .collect::<Vec<_>>();

    assert_eq!(messages, vec!["Add notes", "Add b", "Add a"]);

    Ok(())
}

#[rstest]
fn show_single_commit_in_medium_format(
    dataset_with_three_commits: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = dataset_with_three_commits;
    let head = head_commit_sha(dir.path())?;

    let expected_output = format!(
        "commit {head}\n\
        Author: fake_user <fake_email@email.com>\n\
        Date:   Sun Jan 1 12:00:00 2023 +0000\n\
        \n    Add notes\n\
        \n    added:    notes.txt\n"
    );

    let output = run_dflow_command(dir.path(), &["log", "-n", "1"])
        .assert()
        .success();
    let actual_output = String::from_utf8(output.get_output().stdout.clone())?;

    assert_eq!(actual_output, expected_output);

    Ok(())
}

#[rstest]
fn log_rejects_a_non_numeric_limit(
    dataset_with_three_commits: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    run_dflow_command(dataset_with_three_commits.path(), &["log", "-n", "many"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));

    Ok(())
}
