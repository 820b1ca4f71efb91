//! Core ModuleGraph structure and inner state.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use rustc_hash::{FxBuildHasher, FxHashMap as HashMap, FxHashSet as HashSet};

use super::super::{Module, Specifier};

/// In-memory module dependency graph.
///
/// Cloning a `ModuleGraph` clones a handle; every clone observes the same
/// records. All methods take the lock for the duration of a single
/// operation and never across an `.await`, so callers on the compile
/// thread need no extra discipline beyond not holding a visitor open while
/// mutating.
#[derive(Debug, Clone, Default)]
pub struct ModuleGraph {
    pub(super) inner: Arc<RwLock<GraphInner>>,
}

#[derive(Debug, Clone, Default)]
pub(super) struct GraphInner {
    /// All modules indexed by specifier (wrapped in Arc for cheap cloning)
    pub modules: IndexMap<Specifier, Arc<Module>, FxBuildHasher>,
    /// Reverse edges: module -> modules that import it.
    ///
    /// Entries survive removal of the target so dependents of a deleted
    /// file can still be found.
    pub dependents: HashMap<Specifier, HashSet<Specifier>>,
}

impl ModuleGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }
}

impl GraphInner {
    pub(super) fn link(&mut self, module: &Module) {
        for edge in &module.deps {
            self.dependents
                .entry(edge.target.clone())
                .or_default()
                .insert(module.specifier.clone());
        }
    }

    pub(super) fn unlink(&mut self, module: &Module) {
        for edge in &module.deps {
            if let Some(set) = self.dependents.get_mut(&edge.target) {
                set.remove(&module.specifier);
                if set.is_empty() {
                    self.dependents.remove(&edge.target);
                }
            }
        }
    }
}
