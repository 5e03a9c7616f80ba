//! Path-level change lists
//!
//! - `change`: change kinds, path changes and `--diff-filter` style filters
//! - `name_status`: parser for the backend's name-status listing

pub mod change;
pub mod name_status;
