use crate::common::command::{
    dataset_with_three_commits, head_commit_sha, init_git_repository, repository_dir,
    run_dflow_command,
};
use assert_fs::TempDir;
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::Value;

#[rstest]
fn log_limit_larger_than_history(
    dataset_with_three_commits: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = dataset_with_three_commits;

    let output = run_dflow_command(dir.path(), &["log", "-n", "5", "--json"])
        .assert()
        .success();
    let records: Value = serde_json::from_slice(&output.get_output().stdout)?;
    let records = records.as_array().ok_or("log is not an array")?;

    assert_eq!(records.len(), 3);
    let messages = records
        .iter()
        .filter_map(|record| record["message"].as_str())
        .map(str::trim_end)
        .collect::<Vec<_>>();
    assert_eq!(messages, vec!["Add notes", "Add b", "Add a"]);
    assert_eq!(records[0]["id"], head_commit_sha(dir.path())?);
    assert_eq!(records[0]["author"], "fake_user <fake_email@email.com>");
    assert_eq!(records[2]["parents"], Value::Array(vec![]));

    Ok(())
}

#[rstest]
fn log_limit_truncates_to_the_newest_commits(
    dataset_with_three_commits: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = dataset_with_three_commits;

    let output = run_dflow_command(dir.path(), &["log", "-n", "2", "--json"])
        .assert()
        .success();
    let records: Value = serde_json::from_slice(&output.get_output().stdout)?;

    let changed = records
        .as_array()
        .ok_or("log is not an array")?
        .iter()
        .map(|record| record["changes"][0]["path"].clone())
        .collect::<Vec<_>>();
    assert_eq!(changed, vec![Value::from("notes.txt"), Value::from("data/b.csv")]);

    Ok(())
}

#[rstest]
fn log_of_a_repository_without_commits_is_empty(
    #[from(repository_dir)] dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    init_git_repository(dir.path());

    let output = run_dflow_command(dir.path(), &["log", "--json"])
        .assert()
        .success();
    let records: Value = serde_json::from_slice(&output.get_output().stdout)?;

    assert_eq!(records, Value::Array(vec![]));

    Ok(())
}
