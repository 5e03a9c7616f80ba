//! Commit history
//!
//! - `commit_id`, `commit_record`: the read-only history model
//! - `log_format`: parsers for the backend's log output
//! - `cache`: per-root log page cache
//! - `service`: log, diff and per-file history queries

pub mod cache;
pub mod commit_id;
pub mod commit_record;
pub mod log_format;
pub mod service;
