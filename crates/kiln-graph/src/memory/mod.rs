//! In-memory ModuleGraph implementation.
//!
//! Modules live in an insertion-ordered map keyed by specifier; a reverse
//! edge index makes "who imports X" a single lookup for change propagation.

mod graph;
mod mutations;
mod queries;
mod traversal;

pub use graph::ModuleGraph;
pub use traversal::{Direction, Tracing, Visitor, WalkControl, WalkOutcome};
