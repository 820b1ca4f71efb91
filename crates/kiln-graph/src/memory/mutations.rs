//! Mutation methods for ModuleGraph.

use std::sync::Arc;

use super::super::{DependencyEdge, Module, Specifier};
use super::graph::ModuleGraph;
use crate::{Error, Result};

impl ModuleGraph {
    /// Return the module for `specifier`, creating a `Pending` record if the
    /// specifier has never been referenced.
    ///
    /// The boolean is true when the record was created by this call.
    pub fn get_or_create(&self, specifier: &Specifier) -> (Module, bool) {
        let mut inner = self.inner.write();
        if let Some(existing) = inner.modules.get(specifier) {
            return ((**existing).clone(), false);
        }

        let module = Module::pending(specifier.clone());
        inner
            .modules
            .insert(specifier.clone(), Arc::new(module.clone()));
        (module, true)
    }

    /// Insert or replace a module record, re-indexing its reverse edges.
    pub fn insert(&self, module: Module) {
        let mut inner = self.inner.write();
        if let Some(previous) = inner.modules.get(&module.specifier).cloned() {
            inner.unlink(&previous);
        }
        inner.link(&module);
        inner
            .modules
            .insert(module.specifier.clone(), Arc::new(module));
    }

    /// Apply `mutate` to an existing record and return the updated copy.
    ///
    /// Reverse edges are re-indexed when the dependency list changes.
    pub fn update<F>(&self, specifier: &Specifier, mutate: F) -> Result<Module>
    where
        F: FnOnce(&mut Module),
    {
        let mut inner = self.inner.write();
        let previous = inner
            .modules
            .get(specifier)
            .cloned()
            .ok_or_else(|| Error::UnknownModule(specifier.clone()))?;

        let mut module = (*previous).clone();
        mutate(&mut module);

        if module.deps != previous.deps {
            inner.unlink(&previous);
            inner.link(&module);
        }

        inner
            .modules
            .insert(specifier.clone(), Arc::new(module.clone()));
        Ok(module)
    }

    /// Replace the dependency list of a module.
    pub fn set_dependencies(
        &self,
        specifier: &Specifier,
        deps: Vec<DependencyEdge>,
    ) -> Result<Module> {
        self.update(specifier, |module| module.deps = deps)
    }

    /// Remove a module record entirely.
    ///
    /// Edges *to* the removed module stay indexed: its dependents still
    /// import it and must be able to find out.
    pub fn remove(&self, specifier: &Specifier) -> Option<Module> {
        let mut inner = self.inner.write();
        let removed = inner.modules.shift_remove(specifier)?;
        inner.unlink(&removed);
        Some(Arc::unwrap_or_clone(removed))
    }

    /// Discard every record.
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.modules.clear();
        inner.dependents.clear();
    }
}
