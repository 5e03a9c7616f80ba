//! Core dataset components
//!
//! - `backend`: the version-control command adapter
//! - `workspace`: working tree scanning and path normalisation
//! - `dataset`: one opened dataset root and its operations
//! - `engine`: shared writer slots and history cache, the inbound queries

pub mod backend;
pub mod dataset;
pub mod engine;
pub mod workspace;
