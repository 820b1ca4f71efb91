mod traversal_tests;

use crate::{DependencyEdge, HashChain, Module, ModuleGraph, ModuleState, Specifier};

pub(crate) fn spec(path: &str) -> Specifier {
    Specifier::new(path).unwrap()
}

/// Insert a `Ready` module with the given source and static deps.
pub(crate) fn ready(graph: &ModuleGraph, path: &str, source: &str, deps: &[&str]) -> Specifier {
    let specifier = spec(path);
    let mut module = Module::pending(specifier.clone());
    module.source_hash = HashChain::source_hash(source.as_bytes());
    module.deps = deps.iter().map(|d| DependencyEdge::new(spec(d))).collect();
    module.state = ModuleState::Ready;
    graph.insert(module);
    specifier
}
