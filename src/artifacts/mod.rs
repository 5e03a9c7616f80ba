//! Dataflow data structures and algorithms
//!
//! - `core`: shared utilities (pager wrapper)
//! - `diff`: path-level change lists and diff filters
//! - `graph`: dataflow graph nodes, edges, builder and inference
//! - `history`: commit records, log parsing and the log cache
//! - `restore`: the restore state machine, locks and service
//! - `status`: working tree status resolution

pub mod core;
pub mod diff;
pub mod graph;
pub mod history;
pub mod restore;
pub mod status;
