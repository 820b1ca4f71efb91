//! # kiln-graph
//!
//! Module records, dependency edges and transitive content hashing for the
//! kiln build pipeline.
//!
//! This crate owns identity and storage only. It performs no I/O and never
//! calls a transpiler: the compiler fills the graph, the bundler reads it.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                 ModuleGraph                  │
//! │   specifier -> Module   +   reverse edges    │
//! └───────────────┬──────────────────────────────┘
//!                 │ walk(start, direction, tracing, visitor)
//!        ┌────────┴─────────┐
//!        ▼                  ▼
//!   ┌───────────┐     ┌─────────────┐
//!   │ HashChain │     │  compiler / │
//!   │  (fold)   │     │  bundler    │
//!   └───────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use kiln_graph::{DependencyEdge, HashChain, Module, ModuleGraph, ModuleState, Specifier};
//!
//! # fn main() -> kiln_graph::Result<()> {
//! let graph = ModuleGraph::new();
//! let app = Specifier::new("/src/app.ts")?;
//! let lib = Specifier::new("/src/lib.ts")?;
//!
//! let mut lib_module = Module::pending(lib.clone());
//! lib_module.source_hash = HashChain::source_hash(b"Y");
//! lib_module.state = ModuleState::Ready;
//! graph.insert(lib_module);
//!
//! let mut app_module = Module::pending(app.clone());
//! app_module.source_hash = HashChain::source_hash(b"X");
//! app_module.deps.push(DependencyEdge::new(lib.clone()));
//! app_module.state = ModuleState::Ready;
//! graph.insert(app_module);
//!
//! assert_eq!(graph.dependents(&lib), vec![app.clone()]);
//! assert!(HashChain::content_hash(&graph, &app).is_some());
//! # Ok(())
//! # }
//! ```
//!
//! ## Thread Safety
//!
//! `ModuleGraph` is a cheap-to-clone handle over an `Arc<RwLock<..>>`.
//! Concurrent compile branches may read and mutate it freely; every method
//! holds the lock for one operation only.

pub mod hash;
pub mod module;
pub mod specifier;

mod memory;

pub use hash::{HashChain, TOKEN_LEN};
pub use memory::{Direction, ModuleGraph, Tracing, Visitor, WalkControl, WalkOutcome};
pub use module::{
    DependencyEdge, HashSlot, Module, ModuleFlags, ModuleState, OutputRef, SourceKind,
};
pub use specifier::Specifier;

/// Error types for graph operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A mutation targeted a specifier with no record.
    #[error("Unknown module: {0}")]
    UnknownModule(Specifier),

    /// A string could not be turned into a specifier.
    #[error("Invalid specifier: {0}")]
    InvalidSpecifier(String),
}

/// Result type alias for graph operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests;
