//! Hash-chain repair after a module's source changed.
//!
//! Dependents are never re-transpiled. Their code did not change, only the
//! token naming which version of a dependency they point at, so each
//! affected artifact is patched at its recorded hash slots and re-filed
//! under its new content hash.

use kiln_graph::{
    Direction, HashChain, Module, ModuleGraph, ModuleState, OutputRef, Specifier, Tracing,
    WalkControl,
};

use crate::emit;
use crate::error::{ArtifactError, MissingDependency};
use crate::store::{ArtifactStore, Sidecar, artifact_key};

/// Result of re-deriving one module's hash and artifact.
#[derive(Debug, Clone)]
pub struct Refreshed {
    pub module: Module,
    /// The module's content hash differs from what was stored before.
    pub hash_changed: bool,
    /// Artifact blobs written.
    pub writes: usize,
    pub missing: Vec<MissingDependency>,
}

/// Outcome of one propagation run.
#[derive(Debug, Default)]
pub struct PropagationReport {
    /// Dependents whose content hash changed, nearest first.
    pub updated: Vec<Specifier>,
    pub writes: usize,
    pub missing: Vec<MissingDependency>,
    pub failures: Vec<(Specifier, ArtifactError)>,
}

impl PropagationReport {
    pub fn is_noop(&self) -> bool {
        self.updated.is_empty() && self.writes == 0
    }
}

/// Repairs content hashes and embedded hash tokens over a graph.
pub struct ChangePropagator<'a> {
    graph: &'a ModuleGraph,
    store: &'a dyn ArtifactStore,
}

impl<'a> ChangePropagator<'a> {
    pub fn new(graph: &'a ModuleGraph, store: &'a dyn ArtifactStore) -> Self {
        Self { graph, store }
    }

    /// Walk every module that transitively imports `changed` and bring its
    /// content hash and artifact up to date. `on_change` runs once for each
    /// module whose effective content changed.
    ///
    /// Running this on a consistent graph performs no writes.
    pub fn propagate<F>(&self, changed: &Specifier, mut on_change: F) -> PropagationReport
    where
        F: FnMut(&Specifier, &Module),
    {
        let mut affected = Vec::new();
        let mut tracing = Tracing::default();
        self.graph.walk(
            changed,
            Direction::Dependents,
            &mut tracing,
            &mut |specifier: &Specifier, module: Option<&Module>, depth: usize| {
                if depth > 0 && module.is_some_and(Module::is_ready) {
                    affected.push(specifier.clone());
                }
                WalkControl::Continue
            },
        );

        let mut report = PropagationReport::default();
        for specifier in affected {
            match self.refresh(&specifier, None) {
                Ok(Some(refreshed)) => {
                    report.writes += refreshed.writes;
                    report.missing.extend(refreshed.missing);
                    if refreshed.hash_changed {
                        tracing::debug!("propagated hash change to {}", specifier);
                        on_change(&specifier, &refreshed.module);
                        report.updated.push(specifier);
                    }
                }
                Ok(None) => {}
                Err(error) => {
                    tracing::warn!("failed to repair {}: {}", specifier, error);
                    report.failures.push((specifier, error));
                }
            }
        }
        report
    }

    /// Recompute one module's content hash from current graph state, patch
    /// its dependency tokens and file the artifact under the new key.
    ///
    /// `staged` carries freshly emitted bytes; otherwise the current artifact
    /// is read from the store. Returns `None` for modules that have nothing
    /// to settle (external, removed or never loaded).
    pub fn refresh(
        &self,
        specifier: &Specifier,
        staged: Option<Vec<u8>>,
    ) -> Result<Option<Refreshed>, ArtifactError> {
        let Some(module) = self.graph.module(specifier) else {
            return Ok(None);
        };
        if module.external || module.source_hash.is_empty() {
            return Ok(None);
        }

        let content_hash = HashChain::content_hash(self.graph, specifier)
            .unwrap_or_else(|| module.source_hash.clone());

        let fresh = staged.is_some();
        let mut code = match staged {
            Some(code) => code,
            None => self.stored_code(&module)?,
        };

        let mut missing = Vec::new();
        let mut externals = Vec::new();
        let mut patched = false;
        for edge in &module.deps {
            let Some(target) = self.graph.module(&edge.target) else {
                missing.push(MissingDependency {
                    importer: specifier.clone(),
                    dependency: edge.target.clone(),
                });
                continue;
            };
            if target.external {
                externals.push(edge.target.clone());
                continue;
            }
            if edge.is_dynamic {
                continue;
            }
            let (Some(slot), Some(dep_hash)) = (
                edge.hash_slot,
                HashChain::content_hash(self.graph, &edge.target),
            ) else {
                continue;
            };
            patched |= emit::patch(specifier, &mut code, slot, HashChain::token(&dep_hash))?;
        }

        let key = artifact_key(specifier, &content_hash);
        let previous_key = module.output.as_ref().map(|output| output.key.clone());
        let key_changed = previous_key.as_deref() != Some(key.as_str());

        let mut writes = 0;
        if fresh || patched || key_changed {
            self.store.put(&key, &code)?;
            writes += 1;
            if let Some(old) = previous_key.filter(|old| *old != key) {
                self.store.remove(&old)?;
            }
        }

        let hash_changed = module.content_hash != content_hash;
        if writes == 0 && !hash_changed && module.is_ready() {
            return Ok(Some(Refreshed {
                module,
                hash_changed,
                writes,
                missing,
            }));
        }

        let output = OutputRef {
            key,
            len: code.len(),
        };
        let Ok(updated) = self.graph.update(specifier, |m| {
            m.content_hash = content_hash;
            m.output = Some(output);
            m.state = ModuleState::Ready;
        }) else {
            return Ok(None);
        };
        if writes > 0 || hash_changed {
            self.store
                .put_sidecar(&Sidecar::from_module(&updated, externals))?;
        }

        Ok(Some(Refreshed {
            module: updated,
            hash_changed,
            writes,
            missing,
        }))
    }

    /// Dependencies of `specifier` with no record in the graph. Reads graph
    /// state only.
    pub fn missing(&self, specifier: &Specifier) -> Vec<MissingDependency> {
        self.graph
            .dependencies(specifier)
            .into_iter()
            .filter(|edge| !self.graph.contains(&edge.target))
            .map(|edge| MissingDependency {
                importer: specifier.clone(),
                dependency: edge.target,
            })
            .collect()
    }

    fn stored_code(&self, module: &Module) -> Result<Vec<u8>, ArtifactError> {
        let key = module
            .output
            .as_ref()
            .map(|output| output.key.clone())
            .unwrap_or_default();
        match self.store.get(&key)? {
            Some(code) => Ok(code),
            None => Err(ArtifactError::Missing {
                specifier: module.specifier.clone(),
                key,
            }),
        }
    }
}
