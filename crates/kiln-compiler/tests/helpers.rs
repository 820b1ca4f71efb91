//! Shared fixtures for kiln-compiler integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use kiln_compiler::test_utils::{CountingTranspiler, MemoryLoader};
use kiln_compiler::{ArtifactStore, BuildManifest, Compiler, MemoryStore};
use kiln_graph::{HashChain, Specifier};

/// A compiler over virtual files, with handles to every collaborator.
pub struct Fixture {
    pub loader: Arc<MemoryLoader>,
    pub transpiler: Arc<CountingTranspiler>,
    pub store: Arc<MemoryStore>,
    pub compiler: Arc<Compiler>,
}

impl Fixture {
    pub fn new(files: &[(&str, &str)]) -> Self {
        Self::with_store(files, Arc::new(MemoryStore::new()))
    }

    pub fn with_store(files: &[(&str, &str)], store: Arc<MemoryStore>) -> Self {
        Self::build(files, store, None)
    }

    pub fn with_manifest(
        files: &[(&str, &str)],
        store: Arc<MemoryStore>,
        manifest: BuildManifest,
    ) -> Self {
        Self::build(files, store, Some(manifest))
    }

    fn build(
        files: &[(&str, &str)],
        store: Arc<MemoryStore>,
        manifest: Option<BuildManifest>,
    ) -> Self {
        let loader = Arc::new(MemoryLoader::new());
        for (path, source) in files {
            loader.insert(path, *source);
        }
        let transpiler = Arc::new(CountingTranspiler::new());
        let mut compiler = Compiler::new(
            loader.clone(),
            transpiler.clone(),
            store.clone() as Arc<dyn ArtifactStore>,
        );
        if let Some(manifest) = manifest {
            compiler = compiler.with_manifest(manifest);
        }
        Self {
            loader,
            transpiler,
            store,
            compiler: Arc::new(compiler),
        }
    }

    /// Compiled bytes of `path` as text.
    pub fn artifact(&self, path: &str) -> String {
        let bytes = self
            .compiler
            .artifact(&spec(path))
            .unwrap()
            .unwrap_or_else(|| panic!("no artifact for {path}"));
        String::from_utf8(bytes).unwrap()
    }

    pub fn content_hash(&self, path: &str) -> String {
        self.compiler.graph().module(&spec(path)).unwrap().content_hash
    }

    /// Every stored content hash matches what the graph derives now.
    pub fn assert_all_current(&self) {
        let graph = self.compiler.graph();
        for module in graph.modules() {
            assert!(
                HashChain::is_current(graph, &module),
                "{} has a stale content hash",
                module.specifier
            );
        }
    }
}

pub fn spec(path: &str) -> Specifier {
    Specifier::new(path).unwrap()
}
