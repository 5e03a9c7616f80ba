//! Status-aware dataflow graphs for git/DataLad datasets
//!
//! The engine classifies every path of a dataset against its last commit,
//! renders the tree as a dataflow graph, projects the commit history and
//! restores single files from historical revisions. The version-control
//! backend is the external `git` executable; nothing is persisted here.
//!
//! ```ignore
//! let engine = Engine::default();
//! let graph = engine.get_dataflow_graph("/data/study").await?;
//! let log = engine.get_commit_log("/data/study", 20).await?;
//! ```

pub mod areas;
pub mod artifacts;
pub mod commands;
pub mod config;
pub mod error;

pub use areas::dataset::{Dataset, GraphOptions};
pub use areas::engine::{Engine, EngineOptions};
pub use error::{DataflowError, Result};
