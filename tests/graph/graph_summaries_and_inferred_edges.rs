use crate::common::command::{git_commit_all, init_dataset_dir, run_dflow_command};
use crate::common::file::{FileSpec, touch_at, write_file};
use assert_fs::TempDir;
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::{Value, json};

fn graph_json(dir: &std::path::Path, args: &[&str]) -> Result<Value, Box<dyn std::error::Error>> {
    let output = run_dflow_command(dir, args).assert().success();
    Ok(serde_json::from_slice(&output.get_output().stdout)?)
}

fn produces_edges(graph: &Value) -> Vec<(String, String)> {
    graph["edges"]
        .as_array()
        .map(|edges| {
            edges
                .iter()
                .filter(|edge| edge["kind"] == "produces")
                .map(|edge| {
                    (
                        edge["source"].as_str().unwrap_or_default().to_string(),
                        edge["target"].as_str().unwrap_or_default().to_string(),
                    )
                })
                .collect()
        })
        .unwrap_or_default()
}

#[rstest]
fn directory_summaries_count_statuses_and_sizes(
    init_dataset_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = init_dataset_dir;
    write_file(FileSpec::new(
        dir.path().join("data").join("b.csv"),
        "12345".to_string(),
    ));

    let graph = graph_json(dir.path(), &["graph", "--json"])?;
    let data = graph["nodes"]
        .as_array()
        .ok_or("nodes is not an array")?
        .iter()
        .find(|node| node["id"] == "data")
        .ok_or("data directory missing")?;

    let summary = &data["summary"];
    assert_eq!(summary["tracked"], 1);
    assert_eq!(summary["untracked"], 1);
    assert_eq!(summary["modified"], 0);
    assert_eq!(summary["deleted"], 0);
    assert_eq!(
        summary["total_size"],
        (crate::common::command::A_CSV.len() + 5) as u64
    );

    Ok(())
}

#[rstest]
fn newest_script_produces_newer_outputs(
    init_dataset_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = init_dataset_dir;
    let older = dir.path().join("scripts").join("clean.py");
    let newer = dir.path().join("scripts").join("run.py");
    let stale = dir.path().join("results").join("stale.csv");
    let fresh = dir.path().join("results").join("summary.csv");

    write_file(FileSpec::new(older.clone(), "print('clean')\n".to_string()));
    write_file(FileSpec::new(stale.clone(), "old\n".to_string()));
    write_file(FileSpec::new(fresh.clone(), "new\n".to_string()));
    git_commit_all(dir.path(), "Add results", "2023-01-02 10:00:00 +0000");

    touch_at(&older, 10);
    touch_at(&stale, 50);
    touch_at(&newer, 100);
    touch_at(&fresh, 200);

    let graph = graph_json(dir.path(), &["graph", "--json"])?;
    assert_eq!(
        produces_edges(&graph),
        vec![("scripts/run.py".to_string(), "results/summary.csv".to_string())]
    );

    let graph = graph_json(dir.path(), &["graph", "--json", "--no-inference"])?;
    assert_eq!(produces_edges(&graph), vec![]);

    Ok(())
}

#[rstest]
fn top_level_directories_carry_their_stage(
    init_dataset_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = init_dataset_dir;
    write_file(FileSpec::new(
        dir.path().join("raw_data").join("scan.nii"),
        "bytes".to_string(),
    ));

    let graph = graph_json(dir.path(), &["graph", "--json"])?;
    let stage_of = |id: &str| {
        graph["nodes"]
            .as_array()
            .and_then(|nodes| nodes.iter().find(|node| node["id"] == id))
            .map(|node| node["summary"]["stage"].clone())
    };

    assert_eq!(stage_of("raw_data"), Some(json!("raw_data")));
    assert_eq!(stage_of("scripts"), Some(json!("scripts")));

    Ok(())
}

#[rstest]
fn nested_convention_directories_produce_edges(
    init_dataset_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = init_dataset_dir;
    let script = dir.path().join("analysis").join("code").join("run.py");
    let output = dir.path().join("analysis").join("results").join("out.csv");

    write_file(FileSpec::new(script.clone(), "print('run')\n".to_string()));
    write_file(FileSpec::new(output.clone(), "1,2\n".to_string()));
    git_commit_all(dir.path(), "Add analysis", "2023-01-02 10:00:00 +0000");

    touch_at(&script, 100);
    touch_at(&output, 200);
    // the top-level script must not reach into the nested group
    touch_at(&dir.path().join("scripts").join("run.py"), 300);

    let graph = graph_json(dir.path(), &["graph", "--json"])?;
    assert_eq!(
        produces_edges(&graph),
        vec![(
            "analysis/code/run.py".to_string(),
            "analysis/results/out.csv".to_string()
        )]
    );

    Ok(())
}
