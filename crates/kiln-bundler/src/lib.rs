//! # kiln-bundler
//!
//! Production bundling on top of a settled kiln module graph.
//!
//! [`BundleAnalyzer`] partitions the graph into one shared bundle and one
//! bundle per entry (plus an async bundle for every dynamic import it
//! discovers). [`Bundler`] gates the build on every reachable module being
//! compiled, hands each chunk's compiled modules to a [`ChunkEmitter`] and
//! writes `<name>.<hash>.js` files plus `bundle-manifest.json`.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use kiln_bundler::{Bundler, EntryPoint};
//! use kiln_compiler::{CompileOptions, Compiler, FsLoader, ImportScanner, MemoryStore};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(MemoryStore::new());
//! let compiler = Compiler::new(Arc::new(FsLoader::new()), Arc::new(ImportScanner::new()), store.clone());
//! let main = compiler.resolve_entry("/srv/app/src/main.ts")?;
//! compiler.compile(&main, CompileOptions::default()).await?;
//!
//! let output = Bundler::new(compiler.graph().clone(), store, "dist")
//!     .bundle(&[EntryPoint::new("main", vec![main])])
//!     .await?;
//! for chunk in &output.manifest.chunks {
//!     println!("{} -> {}", chunk.name, chunk.file);
//! }
//! # Ok(())
//! # }
//! ```

pub mod analyzer;
pub mod bundler;
pub mod error;

#[cfg(feature = "logging")]
pub mod logging;

pub use analyzer::{
    Analysis, AnalysisReport, BundleAnalyzer, DependencyGraph, EntryKind, EntryPoint, EntryTree,
    NodeId, TreeView,
};
pub use bundler::{
    BUNDLE_MANIFEST, BundleManifest, BundleOutput, Bundler, Chunk, ChunkEmitter, ChunkInput,
    ChunkModule, ConcatEmitter, SHARED_CHUNK,
};
pub use error::{BundleError, Result};
