//! Test doubles for the compiler's collaborators.
//!
//! Available in this crate's own tests and to downstream crates through the
//! `test-utils` feature.
//!
//! - [`MemoryLoader`]: virtual files keyed by absolute path
//! - [`CountingTranspiler`]: wraps [`ImportScanner`] and counts invocations
//!   per specifier, so tests can assert that a module was or was not
//!   re-transpiled

use async_trait::async_trait;
use kiln_graph::{SourceKind, Specifier};
use parking_lot::RwLock;
use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};

use crate::error::{LoadError, TranspileError};
use crate::loader::{LoadedSource, SourceLoader};
use crate::transpile::{ImportScanner, TranspileOutput, Transpiler};

/// In-memory source tree.
///
/// ```rust
/// use kiln_compiler::test_utils::MemoryLoader;
///
/// let loader = MemoryLoader::new()
///     .with_file("/src/app.ts", "import { lib } from './lib.ts';")
///     .with_file("/src/lib.ts", "export const lib = 1;");
/// assert_eq!(loader.len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct MemoryLoader {
    files: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: &str, source: impl Into<Vec<u8>>) -> Self {
        self.insert(path, source);
        self
    }

    /// Add or overwrite a file.
    pub fn insert(&self, path: &str, source: impl Into<Vec<u8>>) {
        self.files.write().insert(path.to_string(), source.into());
    }

    /// Delete a file. Returns whether it existed.
    pub fn remove(&self, path: &str) -> bool {
        self.files.write().remove(path).is_some()
    }

    pub fn len(&self) -> usize {
        self.files.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.read().is_empty()
    }
}

#[async_trait]
impl SourceLoader for MemoryLoader {
    async fn load(&self, specifier: &Specifier) -> Result<LoadedSource, LoadError> {
        let files = self.files.read();
        match files.get(specifier.as_str()) {
            Some(bytes) => Ok(LoadedSource::new(specifier, bytes.clone())),
            None => Err(LoadError::NotFound(specifier.clone())),
        }
    }
}

/// [`ImportScanner`] that records every call.
#[derive(Debug, Default)]
pub struct CountingTranspiler {
    inner: ImportScanner,
    calls: RwLock<HashMap<Specifier, usize>>,
    failing: RwLock<HashSet<String>>,
}

impl CountingTranspiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invocations for one specifier.
    pub fn count(&self, specifier: &str) -> usize {
        self.calls
            .read()
            .iter()
            .filter(|(spec, _)| spec.as_str() == specifier)
            .map(|(_, count)| *count)
            .sum()
    }

    /// Invocations across all specifiers.
    pub fn total(&self) -> usize {
        self.calls.read().values().sum()
    }

    pub fn reset(&self) {
        self.calls.write().clear();
    }

    /// Make every transpile of `specifier` fail with a syntax error.
    pub fn fail_on(&self, specifier: &str) {
        self.failing.write().insert(specifier.to_string());
    }

    pub fn recover(&self, specifier: &str) {
        self.failing.write().remove(specifier);
    }
}

#[async_trait]
impl Transpiler for CountingTranspiler {
    async fn transpile(
        &self,
        specifier: &Specifier,
        source: &str,
        kind: &SourceKind,
    ) -> Result<TranspileOutput, TranspileError> {
        *self.calls.write().entry(specifier.clone()).or_default() += 1;
        if self.failing.read().contains(specifier.as_str()) {
            return Err(TranspileError::Failed {
                message: "unexpected token".to_string(),
                location: None,
            });
        }
        self.inner.transpile(specifier, source, kind).await
    }
}
