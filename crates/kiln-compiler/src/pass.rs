//! Per-pass compile context and its report.
//!
//! A [`CompilePass`] is created for every top-level compile and threaded
//! explicitly through the recursive fan-out. Its tracing set is what keeps
//! each specifier to one transpile per pass and stops cyclic re-entry.

use indexmap::IndexMap;
use kiln_graph::{Module, Specifier, Tracing};
use parking_lot::Mutex;
use rustc_hash::{FxBuildHasher, FxHashMap as HashMap};

use crate::error::{FatalBuildError, MissingDependency, ModuleError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileOptions {
    /// Reload and re-check the requested module even if it is `Ready`.
    /// Applies to the pass roots only; dependencies still hit the cache.
    pub force_refresh: bool,
    /// Record dependencies without compiling them.
    pub ignore_deps: bool,
}

impl CompileOptions {
    pub fn refresh() -> Self {
        Self {
            force_refresh: true,
            ..Self::default()
        }
    }
}

#[derive(Default)]
struct PassState {
    tracing: Tracing,
    touched: Vec<Specifier>,
    staged: HashMap<Specifier, Vec<u8>>,
    errors: HashMap<Specifier, ModuleError>,
    transpiled: usize,
    reused: usize,
}

/// Context shared by every branch of one compile pass.
pub struct CompilePass {
    options: CompileOptions,
    state: Mutex<PassState>,
}

impl CompilePass {
    pub fn new(options: CompileOptions) -> Self {
        Self {
            options,
            state: Mutex::new(PassState::default()),
        }
    }

    pub fn options(&self) -> CompileOptions {
        self.options
    }

    /// Register `specifier` with this pass. Returns false if some branch
    /// already claimed it (a shared dependency or a cycle).
    pub(crate) fn claim(&self, specifier: &Specifier) -> bool {
        let mut state = self.state.lock();
        if !state.tracing.insert(specifier.clone()) {
            return false;
        }
        state.touched.push(specifier.clone());
        true
    }

    pub fn is_claimed(&self, specifier: &Specifier) -> bool {
        self.state.lock().tracing.contains(specifier)
    }

    /// Specifiers in claim order.
    pub(crate) fn touched(&self) -> Vec<Specifier> {
        self.state.lock().touched.clone()
    }

    /// Hold freshly emitted bytes until the settle step persists them.
    pub(crate) fn stage(&self, specifier: &Specifier, code: Vec<u8>) {
        let mut state = self.state.lock();
        state.staged.insert(specifier.clone(), code);
        state.transpiled += 1;
    }

    pub(crate) fn take_staged(&self, specifier: &Specifier) -> Option<Vec<u8>> {
        self.state.lock().staged.remove(specifier)
    }

    pub(crate) fn reused(&self) {
        self.state.lock().reused += 1;
    }

    pub(crate) fn fail(&self, specifier: &Specifier, error: ModuleError) {
        self.state.lock().errors.insert(specifier.clone(), error);
    }

    pub(crate) fn take_error(&self, specifier: &Specifier) -> Option<ModuleError> {
        self.state.lock().errors.remove(specifier)
    }

    pub(crate) fn has_error(&self, specifier: &Specifier) -> bool {
        self.state.lock().errors.contains_key(specifier)
    }

    pub(crate) fn counters(&self) -> (usize, usize) {
        let state = self.state.lock();
        (state.transpiled, state.reused)
    }
}

/// Outcome of one compile pass.
///
/// Per-module failures live in `outcomes` and never abort the pass;
/// [`PassReport::ensure_clean`] turns them into a fatal error for callers
/// that need a consistent build.
#[derive(Debug, Default)]
pub struct PassReport {
    /// Every module the pass touched, in first-touch order.
    pub outcomes: IndexMap<Specifier, Result<Module, ModuleError>, FxBuildHasher>,
    pub missing: Vec<MissingDependency>,
    /// Transpiler invocations.
    pub transpiled: usize,
    /// Modules restored from an unchanged source without transpiling.
    pub reused: usize,
    /// Artifact blobs written.
    pub writes: usize,
    /// Modules whose content hash changed, in settle order, followed by
    /// dependents repaired afterwards.
    pub changed: Vec<Specifier>,
    /// Dependents outside the pass repaired after a forced refresh, nearest
    /// first.
    pub propagated: Vec<Specifier>,
}

impl PassReport {
    pub fn outcome(&self, specifier: &Specifier) -> Option<&Result<Module, ModuleError>> {
        self.outcomes.get(specifier)
    }

    pub fn take(&mut self, specifier: &Specifier) -> Option<Result<Module, ModuleError>> {
        self.outcomes.shift_remove(specifier)
    }

    pub fn errors(&self) -> impl Iterator<Item = (&Specifier, &ModuleError)> {
        self.outcomes
            .iter()
            .filter_map(|(spec, outcome)| outcome.as_ref().err().map(|e| (spec, e)))
    }

    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.outcomes.values().filter_map(|outcome| outcome.as_ref().ok())
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn is_clean(&self) -> bool {
        self.error_count() == 0 && self.missing.is_empty()
    }

    /// First failure as a fatal build error.
    pub fn ensure_clean(&self) -> Result<(), FatalBuildError> {
        if let Some((specifier, error)) = self.errors().next() {
            return Err(FatalBuildError::ErroredModule {
                specifier: specifier.clone(),
                reason: error.to_string(),
            });
        }
        if let Some(missing) = self.missing.first() {
            return Err(FatalBuildError::MissingDependency(missing.clone()));
        }
        Ok(())
    }
}
