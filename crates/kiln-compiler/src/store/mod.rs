//! Content-addressed artifact storage.
//!
//! Compiled bytes are stored under a key derived from the module's content
//! hash. A small per-specifier sidecar remembers what a compile produced
//! (source hash, dependency edges with their hash slots, flags) so a warm
//! start can skip the transpiler when the source is unchanged.

mod memory;
mod redb_store;

use kiln_graph::{DependencyEdge, HashChain, Module, ModuleFlags, OutputRef, SourceKind, Specifier};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

pub use self::memory::MemoryStore;
pub use self::redb_store::RedbStore;

/// Store key for a module's compiled bytes.
///
/// Led by the content hash; the specifier digest keeps two modules with
/// equal content hashes (identical sources) from sharing one blob, since
/// their rewritten import paths differ.
pub fn artifact_key(specifier: &Specifier, content_hash: &str) -> String {
    let owner = HashChain::source_hash(specifier.as_str().as_bytes());
    format!("{content_hash}-{}", &owner[..16])
}

/// What one compile of a specifier produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sidecar {
    pub specifier: Specifier,
    pub source_hash: String,
    pub content_hash: String,
    pub kind: Option<SourceKind>,
    pub deps: Vec<DependencyEdge>,
    pub flags: ModuleFlags,
    pub output: Option<OutputRef>,
    /// Dependency targets that resolved as external.
    pub externals: Vec<Specifier>,
}

impl Sidecar {
    pub fn from_module(module: &Module, externals: Vec<Specifier>) -> Self {
        Self {
            specifier: module.specifier.clone(),
            source_hash: module.source_hash.clone(),
            content_hash: module.content_hash.clone(),
            kind: module.kind.clone(),
            deps: module.deps.clone(),
            flags: module.flags,
            output: module.output.clone(),
            externals,
        }
    }
}

/// Blob store plus sidecar and metadata tables.
///
/// Implementations are synchronous and cheap to call from async code; the
/// compiler never holds graph locks across store calls.
pub trait ArtifactStore: Send + Sync {
    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError>;

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    fn contains(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.get(key)?.is_some())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError>;

    fn put_sidecar(&self, sidecar: &Sidecar) -> Result<(), StoreError>;

    fn get_sidecar(&self, specifier: &Specifier) -> Result<Option<Sidecar>, StoreError>;

    fn remove_sidecar(&self, specifier: &Specifier) -> Result<(), StoreError>;

    fn set_metadata(&self, key: &str, value: &str) -> Result<(), StoreError>;

    fn get_metadata(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Drop every blob, sidecar and metadata entry.
    fn clear(&self) -> Result<(), StoreError>;
}
