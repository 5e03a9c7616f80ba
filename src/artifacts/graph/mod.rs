//! Dataflow graph construction
//!
//! - `node`: nodes, edges, stage summaries
//! - `builder`: containment tree and summaries from a status snapshot
//! - `inference`: naming-convention `produces` edges

pub mod builder;
pub mod inference;
pub mod node;
