use crate::common::command::{dataset_with_three_commits, run_dflow_command};
use assert_fs::TempDir;
use rstest::rstest;

#[rstest]
fn compare_lists_changes_since_a_revision(
    dataset_with_three_commits: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    run_dflow_command(dataset_with_three_commits.path(), &["compare", "HEAD~2", "--name-status"])
        .assert()
        .success()
        .stdout("A\tdata/b.csv\nA\tnotes.txt\n");

    Ok(())
}

#[rstest]
fn compare_with_head_itself_is_empty(
    dataset_with_three_commits: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    run_dflow_command(dataset_with_three_commits.path(), &["compare", "HEAD"])
        .assert()
        .success()
        .stdout("no changes between HEAD and HEAD\n");

    Ok(())
}
