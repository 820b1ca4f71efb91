//! Entry/shared partitioning of the module graph.
//!
//! Each entry is walked depth-first over static edges. The first entry to
//! reach a module owns it; a later entry that reaches it again promotes it
//! to the shared bundle and stops there without re-enumerating its
//! children. Revisits inside one entry's own walk are cycle or diamond
//! boundaries and never count as sharing. Dynamic edges end the walk and
//! queue their target as an async entry of its own.
//!
//! The per-entry trees live in one arena owned by [`Analysis`]; nodes are
//! addressed by [`NodeId`], which is what lets promotion flag a node that
//! belongs to an earlier entry's tree.

use std::collections::VecDeque;

use indexmap::IndexMap;
use kiln_graph::{DependencyEdge, ModuleGraph, Specifier};
use rustc_hash::{FxBuildHasher, FxHashSet as HashSet};
use serde::{Deserialize, Serialize};

/// A named bundle entry (`vendor`, `common`, one per page).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPoint {
    pub name: String,
    pub modules: Vec<Specifier>,
    /// Modules of this entry are loaded ahead of page code.
    pub preload: bool,
}

impl EntryPoint {
    pub fn new(name: impl Into<String>, modules: Vec<Specifier>) -> Self {
        Self {
            name: name.into(),
            modules,
            preload: false,
        }
    }

    pub fn preload(mut self) -> Self {
        self.preload = true;
        self
    }
}

/// Index of a node in the analysis arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One occurrence of a module in an entry's tree.
///
/// Only the first occurrence of a specifier carries children. Later
/// occurrences are stubs: a loop (`is_loop`), a reference to the shared
/// bundle (`is_shared`), a dynamic import (`is_dynamic`), an external, or a
/// plain revisit within the same entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyGraph {
    pub specifier: Specifier,
    pub external: bool,
    pub is_preload: bool,
    pub is_dynamic: bool,
    pub is_loop: bool,
    pub is_shared: bool,
    /// No module record exists for the specifier.
    pub is_missing: bool,
    pub deps: Vec<NodeId>,
}

impl DependencyGraph {
    fn new(specifier: Specifier, is_preload: bool) -> Self {
        Self {
            specifier,
            external: false,
            is_preload,
            is_dynamic: false,
            is_loop: false,
            is_shared: false,
            is_missing: false,
            deps: Vec::new(),
        }
    }
}

/// How a chunk is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Loaded eagerly with a `<script>` tag.
    Sync,
    /// Loaded on demand through `import()`.
    Async,
}

/// The walked tree of one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryTree {
    pub name: String,
    pub kind: EntryKind,
    pub preload: bool,
    pub roots: Vec<NodeId>,
}

/// Result of one analyzer run. Rebuilt per bundling pass.
#[derive(Debug, Clone, Default)]
pub struct Analysis {
    nodes: Vec<DependencyGraph>,
    entries: Vec<EntryTree>,
    /// First occurrence of every walked module, across all entries.
    primary: IndexMap<Specifier, NodeId, FxBuildHasher>,
    /// Promoted nodes, in promotion order.
    shared: Vec<NodeId>,
}

impl Analysis {
    pub fn node(&self, id: NodeId) -> &DependencyGraph {
        &self.nodes[id.0]
    }

    pub fn nodes(&self) -> &[DependencyGraph] {
        &self.nodes
    }

    pub fn entries(&self) -> &[EntryTree] {
        &self.entries
    }

    pub fn entry(&self, name: &str) -> Option<&EntryTree> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    pub fn async_entries(&self) -> impl Iterator<Item = &EntryTree> {
        self.entries
            .iter()
            .filter(|entry| entry.kind == EntryKind::Async)
    }

    /// Roots of the shared bundle's dependency list.
    pub fn shared(&self) -> &[NodeId] {
        &self.shared
    }

    pub fn is_shared(&self, specifier: &Specifier) -> bool {
        self.primary
            .get(specifier)
            .is_some_and(|id| self.node(*id).is_shared)
    }

    /// Every module bundled into the shared chunk, dependencies first.
    pub fn shared_modules(&self) -> Vec<Specifier> {
        self.collect(&self.shared, &HashSet::default())
    }

    /// Modules private to one entry, dependencies first. Shared modules,
    /// externals and dynamic imports are left out.
    pub fn entry_modules(&self, name: &str) -> Vec<Specifier> {
        let Some(entry) = self.entry(name) else {
            return Vec::new();
        };
        let shared: HashSet<Specifier> = self.shared_modules().into_iter().collect();
        self.collect(&entry.roots, &shared)
    }

    /// Post-order over `roots`, each module once. Iterative like
    /// [`ModuleGraph::walk`].
    fn collect(&self, roots: &[NodeId], exclude: &HashSet<Specifier>) -> Vec<Specifier> {
        let mut seen = HashSet::default();
        let mut out = Vec::new();
        // A module and the dependencies of its first occurrence not yet collected.
        let mut stack: Vec<(Specifier, &[NodeId])> = Vec::new();

        for root in roots {
            self.push_collected(*root, exclude, &mut seen, &mut stack);
            while let Some(top) = stack.last_mut() {
                let pending = top.1;
                match pending.split_first() {
                    Some((&dep, rest)) => {
                        top.1 = rest;
                        self.push_collected(dep, exclude, &mut seen, &mut stack);
                    }
                    None => {
                        if let Some((specifier, _)) = stack.pop() {
                            out.push(specifier);
                        }
                    }
                }
            }
        }
        out
    }

    fn push_collected<'s>(
        &'s self,
        id: NodeId,
        exclude: &HashSet<Specifier>,
        seen: &mut HashSet<Specifier>,
        stack: &mut Vec<(Specifier, &'s [NodeId])>,
    ) {
        let node = self.node(id);
        if node.external || node.is_missing || node.is_dynamic {
            return;
        }
        if exclude.contains(&node.specifier) || !seen.insert(node.specifier.clone()) {
            return;
        }
        // Stubs stand for the module's first occurrence.
        let primary = self.primary.get(&node.specifier).copied().unwrap_or(id);
        stack.push((node.specifier.clone(), self.node(primary).deps.as_slice()));
    }

    /// Nested view of a subtree.
    pub fn tree(&self, id: NodeId) -> TreeView {
        // Each frame holds a node and the views of its children built so far.
        let mut stack: Vec<(NodeId, Vec<TreeView>)> = vec![(id, Vec::new())];
        let mut root = None;

        while let Some((current, built)) = stack.last_mut() {
            let deps = &self.node(*current).deps;
            if built.len() < deps.len() {
                let child = deps[built.len()];
                stack.push((child, Vec::new()));
            } else if let Some((current, built)) = stack.pop() {
                let view = self.view(current, built);
                match stack.last_mut() {
                    Some((_, parent)) => parent.push(view),
                    None => root = Some(view),
                }
            }
        }
        root.unwrap_or_else(|| self.view(id, Vec::new()))
    }

    fn view(&self, id: NodeId, deps: Vec<TreeView>) -> TreeView {
        let node = self.node(id);
        TreeView {
            specifier: node.specifier.to_string(),
            external: node.external,
            preload: node.is_preload,
            dynamic: node.is_dynamic,
            is_loop: node.is_loop,
            shared: node.is_shared,
            missing: node.is_missing,
            deps,
        }
    }

    /// Serializable summary: shared graph, per-entry trees, async entries.
    pub fn report(&self) -> AnalysisReport {
        AnalysisReport {
            shared: SharedReport {
                modules: self.shared_modules().iter().map(ToString::to_string).collect(),
                graph: self.shared.iter().map(|id| self.tree(*id)).collect(),
            },
            entries: self
                .entries
                .iter()
                .map(|entry| EntryReport {
                    name: entry.name.clone(),
                    kind: entry.kind,
                    preload: entry.preload,
                    modules: self
                        .entry_modules(&entry.name)
                        .iter()
                        .map(ToString::to_string)
                        .collect(),
                    graph: entry.roots.iter().map(|id| self.tree(*id)).collect(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeView {
    pub specifier: String,
    pub external: bool,
    pub preload: bool,
    pub dynamic: bool,
    #[serde(rename = "loop")]
    pub is_loop: bool,
    pub shared: bool,
    pub missing: bool,
    pub deps: Vec<TreeView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SharedReport {
    pub modules: Vec<String>,
    pub graph: Vec<TreeView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EntryReport {
    pub name: String,
    pub kind: EntryKind,
    pub preload: bool,
    pub modules: Vec<String>,
    pub graph: Vec<TreeView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub shared: SharedReport,
    pub entries: Vec<EntryReport>,
}

/// Builds an [`Analysis`] from a settled module graph.
pub struct BundleAnalyzer<'a> {
    graph: &'a ModuleGraph,
}

/// Walk state of the entry currently being analyzed.
#[derive(Default)]
struct EntryWalk {
    visited: HashSet<Specifier>,
    path: HashSet<Specifier>,
    preload: bool,
}

/// A first occurrence whose edges are still being walked.
struct VisitFrame {
    id: NodeId,
    specifier: Specifier,
    edges: Vec<DependencyEdge>,
    next: usize,
}

impl<'a> BundleAnalyzer<'a> {
    pub fn new(graph: &'a ModuleGraph) -> Self {
        Self { graph }
    }

    /// Partition the graph for `entries`, walked in order, followed by
    /// every async entry discovered along the way.
    pub fn analyze(&self, entries: &[EntryPoint]) -> Analysis {
        let mut analysis = Analysis::default();
        let mut names: HashSet<String> = entries.iter().map(|e| e.name.clone()).collect();
        let mut roots: HashSet<Specifier> = entries
            .iter()
            .flat_map(|e| e.modules.iter().cloned())
            .collect();

        let mut queue: VecDeque<(EntryPoint, EntryKind)> = entries
            .iter()
            .cloned()
            .map(|entry| (entry, EntryKind::Sync))
            .collect();
        let mut discovered = Vec::new();

        while let Some((entry, kind)) = queue.pop_front() {
            let mut walk = EntryWalk {
                preload: entry.preload,
                ..EntryWalk::default()
            };
            let ids = entry
                .modules
                .iter()
                .map(|module| self.visit(&mut analysis, &mut walk, module, &mut discovered))
                .collect();

            tracing::debug!(
                "analyzed entry '{}' ({} modules walked)",
                entry.name,
                walk.visited.len()
            );
            analysis.entries.push(EntryTree {
                name: entry.name,
                kind,
                preload: entry.preload,
                roots: ids,
            });

            for target in discovered.drain(..) {
                if !roots.insert(target.clone()) {
                    continue;
                }
                let name = unique_name(&mut names, &target);
                queue.push_back((EntryPoint::new(name, vec![target]), EntryKind::Async));
            }
        }

        tracing::debug!(
            "bundle analysis: {} entries, {} shared roots",
            analysis.entries.len(),
            analysis.shared.len()
        );
        analysis
    }

    /// Walk one entry module depth-first and return its node. Iterative,
    /// so deep import chains do not grow the call stack.
    fn visit(
        &self,
        analysis: &mut Analysis,
        walk: &mut EntryWalk,
        specifier: &Specifier,
        discovered: &mut Vec<Specifier>,
    ) -> NodeId {
        let mut stack: Vec<VisitFrame> = Vec::new();
        let root = self.enter(analysis, walk, specifier, &mut stack);

        while let Some(top) = stack.last_mut() {
            if top.next < top.edges.len() {
                let edge = top.edges[top.next].clone();
                top.next += 1;
                let parent = top.id;
                let child = if edge.is_dynamic {
                    let stub_id = NodeId(analysis.nodes.len());
                    let mut stub = DependencyGraph::new(edge.target.clone(), false);
                    stub.is_dynamic = true;
                    analysis.nodes.push(stub);
                    discovered.push(edge.target);
                    stub_id
                } else {
                    self.enter(analysis, walk, &edge.target, &mut stack)
                };
                analysis.nodes[parent.0].deps.push(child);
            } else if let Some(frame) = stack.pop() {
                walk.path.remove(&frame.specifier);
            }
        }
        root
    }

    /// Add the node for one occurrence of `specifier`. A first occurrence
    /// also gets a frame so its edges are walked next.
    fn enter(
        &self,
        analysis: &mut Analysis,
        walk: &mut EntryWalk,
        specifier: &Specifier,
        stack: &mut Vec<VisitFrame>,
    ) -> NodeId {
        let id = NodeId(analysis.nodes.len());
        let mut node = DependencyGraph::new(specifier.clone(), walk.preload);

        let Some(module) = self.graph.module(specifier) else {
            node.is_missing = true;
            analysis.nodes.push(node);
            return id;
        };
        if module.external {
            node.external = true;
            analysis.nodes.push(node);
            return id;
        }
        if walk.path.contains(specifier) {
            node.is_loop = true;
            analysis.nodes.push(node);
            return id;
        }
        if walk.visited.contains(specifier) {
            analysis.nodes.push(node);
            return id;
        }
        if let Some(&owner) = analysis.primary.get(specifier) {
            if !analysis.nodes[owner.0].is_shared {
                tracing::debug!("promoting {} to the shared bundle", specifier);
                analysis.nodes[owner.0].is_shared = true;
                analysis.shared.push(owner);
            }
            node.is_shared = true;
            analysis.nodes.push(node);
            return id;
        }

        analysis.nodes.push(node);
        analysis.primary.insert(specifier.clone(), id);
        walk.visited.insert(specifier.clone());
        walk.path.insert(specifier.clone());
        stack.push(VisitFrame {
            id,
            specifier: specifier.clone(),
            edges: module.deps,
            next: 0,
        });
        id
    }
}

/// Chunk name for an async entry: the file stem, made unique.
fn unique_name(names: &mut HashSet<String>, specifier: &Specifier) -> String {
    let path = specifier.as_str().split(['?', '#']).next().unwrap_or_default();
    let file = path.trim_end_matches('/').rsplit('/').next().unwrap_or_default();
    let stem = file.split('.').next().unwrap_or_default();
    let mut base: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if base.is_empty() {
        base = "chunk".to_string();
    }

    let mut name = base.clone();
    let mut n = 2;
    while !names.insert(name.clone()) {
        name = format!("{base}-{n}");
        n += 1;
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_graph::{Module, ModuleState};

    fn spec(path: &str) -> Specifier {
        Specifier::new(path).unwrap()
    }

    fn add(graph: &ModuleGraph, path: &str, deps: &[&str], dynamic: &[&str]) {
        let mut module = Module::pending(spec(path));
        module.source_hash = path.to_string();
        module.state = ModuleState::Ready;
        module.deps = deps
            .iter()
            .map(|d| DependencyEdge::new(spec(d)))
            .chain(dynamic.iter().map(|d| DependencyEdge::dynamic(spec(d))))
            .collect();
        graph.insert(module);
    }

    fn names(specs: &[Specifier]) -> Vec<&str> {
        specs.iter().map(Specifier::as_str).collect()
    }

    #[test]
    fn shared_module_is_promoted_once() {
        let graph = ModuleGraph::new();
        add(&graph, "/e1.ts", &["/x.ts", "/y.ts"], &[]);
        add(&graph, "/e2.ts", &["/x.ts", "/z.ts"], &[]);
        add(&graph, "/e3.ts", &["/x.ts"], &[]);
        for leaf in ["/x.ts", "/y.ts", "/z.ts"] {
            add(&graph, leaf, &[], &[]);
        }

        let analysis = BundleAnalyzer::new(&graph).analyze(&[
            EntryPoint::new("e1", vec![spec("/e1.ts")]),
            EntryPoint::new("e2", vec![spec("/e2.ts")]),
            EntryPoint::new("e3", vec![spec("/e3.ts")]),
        ]);

        assert_eq!(analysis.shared().len(), 1);
        assert_eq!(names(&analysis.shared_modules()), vec!["/x.ts"]);
        assert_eq!(names(&analysis.entry_modules("e1")), vec!["/y.ts", "/e1.ts"]);
        assert_eq!(names(&analysis.entry_modules("e2")), vec!["/z.ts", "/e2.ts"]);
        assert_eq!(names(&analysis.entry_modules("e3")), vec!["/e3.ts"]);
        assert!(analysis.is_shared(&spec("/x.ts")));
        assert!(!analysis.is_shared(&spec("/y.ts")));
    }

    #[test]
    fn deep_import_chain_is_walked_without_recursion() {
        const DEPTH: usize = 50_000;
        let graph = ModuleGraph::new();
        for i in 0..DEPTH {
            let path = format!("/m{i}.ts");
            let next = format!("/m{}.ts", i + 1);
            if i + 1 < DEPTH {
                add(&graph, &path, &[next.as_str()], &[]);
            } else {
                add(&graph, &path, &[], &[]);
            }
        }

        let analysis =
            BundleAnalyzer::new(&graph).analyze(&[EntryPoint::new("main", vec![spec("/m0.ts")])]);

        let modules = analysis.entry_modules("main");
        assert_eq!(modules.len(), DEPTH);
        assert_eq!(modules[0].as_str(), format!("/m{}.ts", DEPTH - 1));
        assert_eq!(modules[DEPTH - 1].as_str(), "/m0.ts");
    }

    #[test]
    fn tree_view_mirrors_the_arena() {
        let graph = ModuleGraph::new();
        add(&graph, "/app.ts", &["/a.ts", "/b.ts"], &["/lazy.ts"]);
        add(&graph, "/a.ts", &["/b.ts"], &[]);
        add(&graph, "/b.ts", &[], &[]);
        add(&graph, "/lazy.ts", &[], &[]);

        let analysis =
            BundleAnalyzer::new(&graph).analyze(&[EntryPoint::new("app", vec![spec("/app.ts")])]);
        let tree = analysis.tree(analysis.entry("app").unwrap().roots[0]);

        assert_eq!(tree.specifier, "/app.ts");
        let children: Vec<_> = tree.deps.iter().map(|d| d.specifier.as_str()).collect();
        assert_eq!(children, vec!["/a.ts", "/b.ts", "/lazy.ts"]);
        assert_eq!(tree.deps[0].deps[0].specifier, "/b.ts");
        assert!(tree.deps[1].deps.is_empty(), "second occurrence is a stub");
        assert!(tree.deps[2].dynamic);
    }

    #[test]
    fn shared_subtree_is_not_re_enumerated() {
        let graph = ModuleGraph::new();
        add(&graph, "/a.ts", &["/s.ts"], &[]);
        add(&graph, "/b.ts", &["/s.ts"], &[]);
        add(&graph, "/s.ts", &["/deep.ts"], &[]);
        add(&graph, "/deep.ts", &[], &[]);

        let analysis = BundleAnalyzer::new(&graph).analyze(&[
            EntryPoint::new("a", vec![spec("/a.ts")]),
            EntryPoint::new("b", vec![spec("/b.ts")]),
        ]);

        let b = analysis.entry("b").unwrap();
        let stub = analysis.node(analysis.node(b.roots[0]).deps[0]);
        assert!(stub.is_shared);
        assert!(stub.deps.is_empty());
        assert_eq!(names(&analysis.shared_modules()), vec!["/deep.ts", "/s.ts"]);
        assert_eq!(names(&analysis.entry_modules("a")), vec!["/a.ts"]);
    }

    #[test]
    fn cycle_within_an_entry_is_a_loop_not_sharing() {
        let graph = ModuleGraph::new();
        add(&graph, "/a.ts", &["/b.ts"], &[]);
        add(&graph, "/b.ts", &["/a.ts"], &[]);

        let analysis =
            BundleAnalyzer::new(&graph).analyze(&[EntryPoint::new("main", vec![spec("/a.ts")])]);

        let root = analysis.node(analysis.entry("main").unwrap().roots[0]);
        let b = analysis.node(root.deps[0]);
        let back = analysis.node(b.deps[0]);
        assert!(back.is_loop);
        assert!(!back.is_shared);
        assert!(analysis.shared().is_empty());
        assert_eq!(names(&analysis.entry_modules("main")), vec!["/b.ts", "/a.ts"]);
    }

    #[test]
    fn diamond_within_an_entry_is_not_sharing() {
        let graph = ModuleGraph::new();
        add(&graph, "/a.ts", &["/b.ts", "/c.ts"], &[]);
        add(&graph, "/b.ts", &["/d.ts"], &[]);
        add(&graph, "/c.ts", &["/d.ts"], &[]);
        add(&graph, "/d.ts", &[], &[]);

        let analysis =
            BundleAnalyzer::new(&graph).analyze(&[EntryPoint::new("main", vec![spec("/a.ts")])]);

        assert!(analysis.shared().is_empty());
        let revisit = analysis
            .nodes()
            .iter()
            .filter(|n| n.specifier == spec("/d.ts"))
            .count();
        assert_eq!(revisit, 2);
        assert_eq!(
            names(&analysis.entry_modules("main")),
            vec!["/d.ts", "/b.ts", "/c.ts", "/a.ts"]
        );
    }

    #[test]
    fn dynamic_imports_become_async_entries() {
        let graph = ModuleGraph::new();
        add(&graph, "/app.ts", &["/lib.ts"], &["/pages/about.tsx"]);
        add(&graph, "/lib.ts", &[], &[]);
        add(&graph, "/pages/about.tsx", &["/lib.ts", "/about-only.ts"], &[]);
        add(&graph, "/about-only.ts", &[], &[]);

        let analysis =
            BundleAnalyzer::new(&graph).analyze(&[EntryPoint::new("app", vec![spec("/app.ts")])]);

        let asyncs: Vec<_> = analysis.async_entries().collect();
        assert_eq!(asyncs.len(), 1);
        assert_eq!(asyncs[0].name, "about");
        assert_eq!(
            names(&analysis.entry_modules("about")),
            vec!["/about-only.ts", "/pages/about.tsx"]
        );
        assert_eq!(names(&analysis.shared_modules()), vec!["/lib.ts"]);
        assert_eq!(names(&analysis.entry_modules("app")), vec!["/app.ts"]);
    }

    #[test]
    fn externals_terminate_and_never_share() {
        let graph = ModuleGraph::new();
        add(&graph, "/a.ts", &["https://esm.sh/react"], &[]);
        add(&graph, "/b.ts", &["https://esm.sh/react"], &[]);
        graph.insert(Module::external(spec("https://esm.sh/react")));

        let analysis = BundleAnalyzer::new(&graph).analyze(&[
            EntryPoint::new("a", vec![spec("/a.ts")]),
            EntryPoint::new("b", vec![spec("/b.ts")]),
        ]);

        assert!(analysis.shared().is_empty());
        let a = analysis.node(analysis.entry("a").unwrap().roots[0]);
        assert!(analysis.node(a.deps[0]).external);
        assert_eq!(names(&analysis.entry_modules("a")), vec!["/a.ts"]);
    }

    #[test]
    fn preload_entries_flag_their_nodes() {
        let graph = ModuleGraph::new();
        add(&graph, "/vendor.ts", &["/x.ts"], &[]);
        add(&graph, "/x.ts", &[], &[]);
        add(&graph, "/page.ts", &["/x.ts"], &[]);

        let analysis = BundleAnalyzer::new(&graph).analyze(&[
            EntryPoint::new("vendor", vec![spec("/vendor.ts")]).preload(),
            EntryPoint::new("page", vec![spec("/page.ts")]),
        ]);

        let vendor = analysis.node(analysis.entry("vendor").unwrap().roots[0]);
        assert!(vendor.is_preload);
        assert!(analysis.node(vendor.deps[0]).is_shared);
        assert!(analysis.node(vendor.deps[0]).is_preload);
    }

    #[test]
    fn async_names_are_unique() {
        let mut names = HashSet::default();
        names.insert("about".to_string());
        assert_eq!(unique_name(&mut names, &spec("/pages/about.tsx")), "about-2");
        assert_eq!(unique_name(&mut names, &spec("/x/about.ts?raw")), "about-3");
        assert_eq!(unique_name(&mut names, &spec("/a/b/my page.ts")), "my_page");
    }
}
