//! Query methods for ModuleGraph.

use super::super::{DependencyEdge, Module, Specifier};
use super::graph::ModuleGraph;

impl ModuleGraph {
    /// Retrieve a module by specifier.
    ///
    /// Returns an owned `Module`; records are stored behind `Arc` so this is
    /// a shallow copy of the record fields.
    pub fn module(&self, specifier: &Specifier) -> Option<Module> {
        let inner = self.inner.read();
        inner.modules.get(specifier).map(|arc| (**arc).clone())
    }

    /// All modules, in first-reference order.
    pub fn modules(&self) -> Vec<Module> {
        let inner = self.inner.read();
        inner.modules.values().map(|arc| (**arc).clone()).collect()
    }

    /// All specifiers, in first-reference order.
    pub fn specifiers(&self) -> Vec<Specifier> {
        let inner = self.inner.read();
        inner.modules.keys().cloned().collect()
    }

    /// Dependency edges of a module (forward edges, source order).
    pub fn dependencies(&self, specifier: &Specifier) -> Vec<DependencyEdge> {
        let inner = self.inner.read();
        inner
            .modules
            .get(specifier)
            .map(|module| module.deps.clone())
            .unwrap_or_default()
    }

    /// Modules that import `specifier` (reverse edges), sorted for
    /// deterministic traversal.
    pub fn dependents(&self, specifier: &Specifier) -> Vec<Specifier> {
        let inner = self.inner.read();
        let mut dependents: Vec<Specifier> = inner
            .dependents
            .get(specifier)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        dependents.sort();
        dependents
    }

    /// Whether a module record is present.
    pub fn contains(&self, specifier: &Specifier) -> bool {
        let inner = self.inner.read();
        inner.modules.contains_key(specifier)
    }

    /// Number of module records.
    pub fn len(&self) -> usize {
        let inner = self.inner.read();
        inner.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Modules currently in the `Errored` state.
    pub fn errored(&self) -> Vec<Module> {
        let inner = self.inner.read();
        inner
            .modules
            .values()
            .filter(|module| module.error().is_some())
            .map(|arc| (**arc).clone())
            .collect()
    }
}
