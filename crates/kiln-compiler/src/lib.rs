//! # kiln-compiler
//!
//! Incremental, content-addressed compilation of ES modules.
//!
//! A compile pass resolves, loads and transpiles modules, records their
//! dependency edges in a [`kiln_graph::ModuleGraph`] and files the compiled
//! bytes in an [`ArtifactStore`] under a key derived from the module's
//! content hash. Every hashed import in compiled output carries its
//! dependency's hash token (`/_kiln/src/lib.ts.js?v=<token>`), so a change
//! deep in the graph is repaired by patching tokens in place instead of
//! re-transpiling importers.
//!
//! ## Pipeline
//!
//! ```text
//! compile(root)
//!   │
//!   ├─ claim (tracing set) ─► load ─► reuse? ─► transpile ─► rewrite imports
//!   │                                                     │
//!   │                    recurse into dependencies ◄──────┘
//!   ▼
//! settle: content hash ─► patch hash slots ─► store artifact + sidecar
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use kiln_compiler::{CompileOptions, Compiler, FsLoader, ImportScanner, MemoryStore};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let compiler = Compiler::new(
//!     Arc::new(FsLoader::new()),
//!     Arc::new(ImportScanner::new()),
//!     Arc::new(MemoryStore::new()),
//! );
//! let entry = compiler.resolve_entry("/srv/app/src/main.ts")?;
//! let module = compiler.compile(&entry, CompileOptions::default()).await?;
//! println!("{} -> {}", module.specifier, module.content_hash);
//! # Ok(())
//! # }
//! ```

pub mod compiler;
pub mod emit;
pub mod error;
pub mod loader;
pub mod manifest;
pub mod pass;
pub mod propagate;
pub mod resolve;
pub mod store;
pub mod transpile;
pub mod watch;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use compiler::{ChangeOutcome, Compiler, ModuleSettled};
pub use emit::{OUTPUT_PREFIX, output_path};
pub use error::{
    ArtifactError, FatalBuildError, LoadError, MissingDependency, ModuleError, ResolveError,
    SourceLocation, StoreError, TranspileError,
};
pub use loader::{FsLoader, LoadedSource, SourceLoader};
pub use manifest::{BuildManifest, ManifestStatus};
pub use pass::{CompileOptions, CompilePass, PassReport};
pub use propagate::{ChangePropagator, PropagationReport, Refreshed};
pub use resolve::{AliasListener, ExternalListener, ResolveListener, ResolveOutcome, Resolved, Resolver};
pub use store::{ArtifactStore, MemoryStore, RedbStore, Sidecar, artifact_key};
pub use transpile::{DiscoveredImport, ImportScanner, TranspileOutput, Transpiler};
pub use watch::{SourceChanged, WatchLoop};

pub use kiln_graph;
