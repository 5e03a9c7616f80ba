use crate::common::command::{init_dataset_dir, repository_dir, run_dflow_command};
use crate::common::file::{FileSpec, write_file};
use assert_fs::TempDir;
use predicates::prelude::predicate;
use rstest::rstest;

#[rstest]
fn graph_renders_a_tree_with_statuses(
    init_dataset_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = init_dataset_dir;
    write_file(FileSpec::new(
        dir.path().join("data").join("b.csv"),
        "x\n".to_string(),
    ));

    run_dflow_command(dir.path(), &["graph"])
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"├── data/")?)
        .stdout(predicate::str::is_match(r"│   ├── tracked\s+a\.csv")?)
        .stdout(predicate::str::is_match(r"│   └── untracked\s+b\.csv 2 B")?)
        .stdout(predicate::str::is_match(r"└── scripts/ \[scripts\]")?)
        .stdout(predicate::str::is_match(r"    └── tracked\s+run\.py")?);

    Ok(())
}

#[rstest]
fn graph_outside_a_repository_fails(repository_dir: TempDir) -> Result<(), Box<dyn std::error::Error>> {
    run_dflow_command(repository_dir.path(), &["graph"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not under version control"));

    Ok(())
}

#[rstest]
fn graph_of_a_repository_without_commits_lists_untracked_files(
    repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    crate::common::command::init_git_repository(repository_dir.path());
    write_file(FileSpec::new(
        repository_dir.path().join("notes.txt"),
        "draft".to_string(),
    ));

    run_dflow_command(repository_dir.path(), &["graph"])
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"└── untracked\s+notes\.txt")?);

    Ok(())
}
