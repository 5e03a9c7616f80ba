//! Point-in-time restoration of single files
//!
//! - `state`: the restore state machine and its trail
//! - `locks`: per-root and cross-process writer exclusion
//! - `service`: validation, checkout and the uncancellable commit step

pub mod locks;
pub mod service;
pub mod state;
