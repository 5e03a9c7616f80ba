use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use dflow::artifacts::core::PagerWriter;
use dflow::artifacts::diff::change::DiffFilter;
use dflow::commands::Session;
use dflow::commands::diff::DiffOptions;
use dflow::commands::graph::GraphCommandOptions;
use dflow::commands::history::HistoryOptions;
use dflow::commands::log::LogOptions;
use dflow::commands::restore::RestoreOptions;
use dflow::{Engine, EngineOptions};
use is_terminal::IsTerminal;
use minus::Pager;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "dflow",
    version = "0.1.0",
    author = "Sami Barbut-Dica",
    about = "Status-aware dataflow graphs for git/DataLad datasets",
    long_about = "Classifies every path of a dataset against its last commit, renders the \
    dataset as a dataflow graph, shows its history and restores single files from \
    historical revisions. The dataset must be a git (or DataLad) repository.",
    help_template = r"
{name} {version} - {about}

USAGE:
    {usage}

OPTIONS:
    {all-args}
",
)]
struct Cli {
    #[arg(long, global = true, help = "Dataset root (defaults to the current directory)")]
    root: Option<PathBuf>,
    #[arg(long, global = true, help = "Configuration file (defaults to <root>/.dflow.toml)")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Timeout in seconds for each backend call")]
    timeout: Option<f64>,
    #[arg(short, long, global = true, action = ArgAction::Count, help = "More logging (-v, -vv, -vvv)")]
    verbose: u8,
    #[arg(short, long, global = true, help = "Only log errors")]
    quiet: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(
        name = "graph",
        about = "Show the dataflow graph of the dataset",
        long_about = "Shows every file and directory of the dataset with its status \
        (tracked, modified, untracked, deleted), per-directory summaries and the \
        inferred script-to-output edges."
    )]
    Graph {
        #[arg(long, help = "Print the graph as JSON")]
        json: bool,
        #[arg(long, help = "Skip the inference of script-to-output edges")]
        no_inference: bool,
    },
    #[command(
        name = "log",
        about = "Show the commit log, newest first",
        long_about = "Shows up to N commits of the dataset history, newest first, each \
        with the paths it changed."
    )]
    Log {
        #[arg(short = 'n', long = "max-count", default_value_t = 20, help = "Number of commits")]
        limit: usize,
        #[arg(long, help = "One line per commit")]
        oneline: bool,
        #[arg(long, help = "Print the log as JSON")]
        json: bool,
    },
    #[command(
        name = "diff",
        about = "Show the paths changed by a commit",
        long_about = "Shows the change list of one commit against its first parent \
        (root commits against the empty tree). With --patch, shows the content diff \
        instead, optionally limited to one path."
    )]
    Diff {
        #[arg(index = 1, help = "The commit to inspect")]
        revision: String,
        #[arg(index = 2, requires = "patch", help = "Limit the patch to this path")]
        path: Option<String>,
        #[arg(long, conflicts_with_all = ["diff_filter", "name_status"], help = "Show the content diff")]
        patch: bool,
        #[arg(long, value_parser = parse_diff_filter, help = "Only show changes of the given kinds (A, D, M, R)")]
        diff_filter: Option<DiffFilter>,
        #[arg(long, help = "Print status letters and paths only")]
        name_status: bool,
        #[arg(long, help = "Print the change list as JSON")]
        json: bool,
    },
    #[command(
        name = "compare",
        about = "Show the paths changed between a revision and HEAD"
    )]
    Compare {
        #[arg(index = 1, help = "The revision to compare against HEAD")]
        revision: String,
        #[arg(long, value_parser = parse_diff_filter, help = "Only show changes of the given kinds (A, D, M, R)")]
        diff_filter: Option<DiffFilter>,
        #[arg(long, help = "Print status letters and paths only")]
        name_status: bool,
        #[arg(long, help = "Print the change list as JSON")]
        json: bool,
    },
    #[command(
        name = "history",
        about = "Show the commits touching one path",
        long_about = "Shows the commits that changed one path, following renames."
    )]
    History {
        #[arg(index = 1, help = "Path relative to the dataset root")]
        path: String,
        #[arg(short = 'n', long = "max-count", default_value_t = 20, help = "Number of commits")]
        limit: usize,
        #[arg(long, help = "Print the history as JSON")]
        json: bool,
    },
    #[command(name = "show", about = "Print the content of a path at a revision")]
    Show {
        #[arg(index = 1, help = "The revision to read from")]
        revision: String,
        #[arg(index = 2, help = "Path relative to the dataset root")]
        path: String,
    },
    #[command(
        name = "restore",
        about = "Restore a file from a historical revision and commit it",
        long_about = "Writes the content a path had at the given revision back into the \
        working tree and commits it. Files still present on disk are only replaced \
        with --overwrite."
    )]
    Restore {
        #[arg(index = 1, help = "Path relative to the dataset root")]
        path: String,
        #[arg(long = "from", help = "The revision to restore from")]
        revision: String,
        #[arg(long, help = "Allow replacing a file that is present on disk")]
        overwrite: bool,
        #[arg(long, help = "Print the outcome as JSON")]
        json: bool,
    },
}

fn parse_diff_filter(s: &str) -> std::result::Result<DiffFilter, String> {
    DiffFilter::try_parse(s).ok_or_else(|| format!("invalid diff filter '{s}', expected letters from ADMR"))
}

fn init_tracing(verbose: u8, quiet: bool) {
    let level = match verbose {
        0 if quiet => "error",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn use_pager() -> bool {
    std::io::stdout().is_terminal() && std::env::var_os("NO_PAGER").is_none()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    if !std::io::stdout().is_terminal() {
        colored::control::set_override(false);
    }

    if let Some(timeout) = cli.timeout
        && (!timeout.is_finite() || timeout <= 0.0)
    {
        anyhow::bail!("--timeout must be a positive number of seconds, got {timeout}");
    }

    let timeout = cli
        .timeout
        .map(Duration::try_from_secs_f64)
        .transpose()
        .context("--timeout is out of range")?;
    let engine = Engine::new(EngineOptions {
        config_path: cli.config.clone(),
        program: None,
        timeout,
    });
    let root = match &cli.root {
        Some(root) => root.clone(),
        None => std::env::current_dir()?,
    };
    let dataset = engine.open(&root).await?;

    let paged = matches!(cli.command, Commands::Log { json: false, .. }) && use_pager();
    if paged {
        let pager = Pager::new();
        let session = Session::new(dataset, Box::new(PagerWriter::new(pager.clone())));
        run(&session, &cli.command).await?;
        minus::page_all(pager)?;
    } else {
        let session = Session::new(dataset, Box::new(std::io::stdout()));
        run(&session, &cli.command).await?;
    }

    Ok(())
}

async fn run(session: &Session, command: &Commands) -> Result<()> {
    match command {
        Commands::Graph { json, no_inference } => {
            session
                .graph(&GraphCommandOptions {
                    json: *json,
                    inference: !no_inference,
                })
                .await?
        }
        Commands::Diff {
            revision,
            path,
            patch: true,
            json,
            ..
        } => session.patch(revision, path.as_deref(), *json).await?,
        Commands::Diff {
            revision,
            diff_filter,
            name_status,
            json,
            ..
        } => {
            session
                .diff(
                    revision,
                    &DiffOptions {
                        filter: *diff_filter,
                        name_status: *name_status,
                        json: *json,
                    },
                )
                .await?
        }
        Commands::Compare {
            revision,
            diff_filter,
            name_status,
            json,
        } => {
            session
                .compare(
                    revision,
                    &DiffOptions {
                        filter: *diff_filter,
                        name_status: *name_status,
                        json: *json,
                    },
                )
                .await?
        }
        Commands::History { path, limit, json } => {
            session
                .history(
                    path,
                    &HistoryOptions {
                        limit: *limit,
                        json: *json,
                    },
                )
                .await?
        }
        Commands::Show { revision, path } => session.show(revision, path).await?,
        Commands::Restore {
            path,
            revision,
            overwrite,
            json,
        } => {
            session
                .restore(
                    path,
                    &RestoreOptions {
                        revision: revision.clone(),
                        overwrite: *overwrite,
                        json: *json,
                    },
                )
                .await?
        }
        Commands::Log {
            limit,
            oneline,
            json,
        } => {
            session
                .log(&LogOptions {
                    limit: *limit,
                    oneline: *oneline,
                    json: *json,
                })
                .await?
        }
    }

    Ok(())
}
