use crate::common::command::{
    commit_count, git_commit_all, git_stdout, head_commit_sha, init_dataset_dir,
    run_dflow_command,
};
use crate::common::file::{FileSpec, delete_path, write_file};
use assert_fs::TempDir;
use dflow::artifacts::restore::service::RestoreRequest;
use dflow::artifacts::status::path_entry::Status;
use dflow::{Engine, GraphOptions};
use pretty_assertions::assert_eq;
use rstest::rstest;

#[rstest]
#[tokio::test]
async fn concurrent_restores_on_one_root(
    init_dataset_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = init_dataset_dir;
    let original = head_commit_sha(dir.path())?;
    write_file(FileSpec::new(
        dir.path().join("data").join("a.csv"),
        "edited\n".to_string(),
    ));
    write_file(FileSpec::new(
        dir.path().join("scripts").join("run.py"),
        "print('edited')\n".to_string(),
    ));
    git_commit_all(dir.path(), "Edit both", "2023-01-02 10:00:00 +0000");
    delete_path(&dir.path().join("data").join("a.csv"));
    delete_path(&dir.path().join("scripts").join("run.py"));
    let commits_before = commit_count(dir.path())?;

    let engine = Engine::default();
    let dataset = engine.open(dir.path()).await?;

    let (first, second) = futures::join!(
        dataset.restore_path(RestoreRequest::new(
            "data/a.csv".to_string(),
            original.clone(),
            false,
        )),
        dataset.restore_path(RestoreRequest::new(
            "scripts/run.py".to_string(),
            original.clone(),
            false,
        )),
    );
    let first = first?;
    let second = second?;

    assert!(first.commit.is_some());
    assert!(second.commit.is_some());
    assert_eq!(commit_count(dir.path())?, commits_before + 2);

    // invocation order is commit order
    let subjects = git_stdout(dir.path(), &["log", "-2", "--format=%s"])?;
    assert_eq!(
        subjects.lines().collect::<Vec<_>>(),
        vec![
            format!("Restore scripts/run.py from {}", &original[..7]),
            format!("Restore data/a.csv from {}", &original[..7]),
        ]
    );

    let graph = dataset.dataflow_graph(GraphOptions::default()).await?;
    let status = |id: &str| graph.node(id).map(|node| node.status);
    assert_eq!(status("data/a.csv"), Some(Status::Tracked));
    assert_eq!(status("scripts/run.py"), Some(Status::Tracked));

    Ok(())
}

#[rstest]
fn restore_while_another_process_holds_the_lock_fails(
    init_dataset_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = init_dataset_dir;
    write_file(FileSpec::new(
        dir.path().join("data").join("a.csv"),
        "edited\n".to_string(),
    ));
    git_commit_all(dir.path(), "Edit a", "2023-01-02 10:00:00 +0000");
    delete_path(&dir.path().join("data").join("a.csv"));
    let commits_before = commit_count(dir.path())?;

    let lock_file = std::fs::OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(dir.path().join(".git").join("dflow-restore.lock"))?;
    let _held = file_guard::lock(&lock_file, file_guard::Lock::Exclusive, 0, 1)?;

    run_dflow_command(dir.path(), &["restore", "data/a.csv", "--from", "HEAD~1"])
        .assert()
        .failure()
        .stderr(predicates::prelude::predicate::str::contains("write conflict on 'data/a.csv'"));

    assert!(!dir.path().join("data").join("a.csv").exists());
    assert_eq!(commit_count(dir.path())?, commits_before);

    Ok(())
}

#[rstest]
#[tokio::test]
async fn commit_log_reflects_a_restore_after_caching(
    init_dataset_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = init_dataset_dir;
    let original = head_commit_sha(dir.path())?;
    write_file(FileSpec::new(
        dir.path().join("data").join("a.csv"),
        "edited\n".to_string(),
    ));
    git_commit_all(dir.path(), "Edit a", "2023-01-02 10:00:00 +0000");

    let dataset = Engine::default().open(dir.path()).await?;
    assert_eq!(dataset.commit_log(10).await?.len(), 2);
    assert_eq!(dataset.commit_log(10).await?.len(), 2);

    dataset
        .restore_path(RestoreRequest::new(
            "data/a.csv".to_string(),
            original,
            true,
        ))
        .await?;

    let log = dataset.commit_log(10).await?;
    assert_eq!(log.len(), 3);
    assert_eq!(log[0].id.as_ref(), head_commit_sha(dir.path())?.as_str());

    Ok(())
}
