use crate::common::command::{dataset_with_three_commits, git_commit_all, run_dflow_command};
use crate::common::file::{FileSpec, write_file};
use assert_fs::TempDir;
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::Value;

#[rstest]
fn history_lists_only_commits_touching_the_path(
    dataset_with_three_commits: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = dataset_with_three_commits;
    write_file(FileSpec::new(
        dir.path().join("data").join("a.csv"),
        "id,value\n1,99\n".to_string(),
    ));
    git_commit_all(dir.path(), "Fix a", "2023-01-02 09:00:00 +0000");

    let output = run_dflow_command(dir.path(), &["history", "data/a.csv", "--json"])
        .assert()
        .success();
    let records: Value = serde_json::from_slice(&output.get_output().stdout)?;

    let messages = records
        .as_array()
        .ok_or("history is not an array")?
        .iter()
        .filter_map(|record| record["message"].as_str())
        .map(str::trim_end)
        .collect::<Vec<_>>();
    assert_eq!(messages, vec!["Fix a", "Add a"]);

    Ok(())
}

#[rstest]
fn show_prints_the_content_at_a_revision(
    dataset_with_three_commits: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = dataset_with_three_commits;
    write_file(FileSpec::new(
        dir.path().join("notes.txt"),
        "second run\n".to_string(),
    ));
    git_commit_all(dir.path(), "Update notes", "2023-01-02 09:00:00 +0000");

    let output = run_dflow_command(dir.path(), &["show", "HEAD~1", "notes.txt"])
        .assert()
        .success();

    assert_eq!(output.get_output().stdout, b"first run\n".to_vec());

    Ok(())
}
