//! Working tree status resolution
//!
//! - `file_change`: backend change codes and the porcelain parser
//! - `path_entry`: the status taxonomy and snapshot entries
//! - `inspector`: classification of a single path
//! - `status_info`: the resolver producing a full snapshot

pub mod file_change;
pub mod inspector;
pub mod path_entry;
pub mod status_info;
