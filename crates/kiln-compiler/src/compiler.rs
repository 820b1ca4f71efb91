//! Compile orchestration: resolve, load, transpile, record, recurse, settle.
//!
//! A pass runs in two phases. The recursive phase registers each module in
//! the pass's tracing set before its dependencies are requested, so shared
//! and cyclic imports are transpiled at most once and never re-entered.
//! The settle phase then derives every touched module's content hash from
//! final graph state, writes dependency tokens into hash slots and persists
//! the artifacts, giving one deterministic result regardless of the order
//! concurrent branches finished in.

use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, join_all};
use kiln_graph::{
    DependencyEdge, HashChain, Module, ModuleFlags, ModuleGraph, ModuleState, SourceKind,
    Specifier,
};
use rustc_hash::FxHashSet as HashSet;

use crate::emit::{self, ImportTarget, Rewrite};
use crate::error::{
    ArtifactError, FatalBuildError, LoadError, ModuleError, ResolveError, StoreError,
    TranspileError,
};
use crate::loader::SourceLoader;
use crate::manifest::{BuildManifest, ManifestStatus};
use crate::pass::{CompileOptions, CompilePass, PassReport};
use crate::propagate::{ChangePropagator, PropagationReport};
use crate::resolve::Resolver;
use crate::store::{ArtifactStore, Sidecar};
use crate::transpile::Transpiler;

/// Outbound watch event: a module finished recompiling or was repaired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSettled {
    pub specifier: Specifier,
    /// The module's effective content changed; HMR/SSR caches keyed on it
    /// are stale.
    pub hmr_relevant: bool,
    /// Present when the module is now `Errored` or was removed.
    pub error: Option<String>,
}

/// Everything one `source_changed` call did.
#[derive(Debug, Default)]
pub struct ChangeOutcome {
    /// The changed module first, then every other module whose content
    /// hash moved.
    pub settled: Vec<ModuleSettled>,
    pub report: PassReport,
    pub removed: bool,
}

/// Dependencies and output restored without transpiling.
struct Restored {
    kind: Option<SourceKind>,
    deps: Vec<DependencyEdge>,
    flags: ModuleFlags,
    output: Option<kiln_graph::OutputRef>,
    externals: Vec<Specifier>,
}

/// Incremental module compiler.
pub struct Compiler {
    graph: ModuleGraph,
    resolver: Resolver,
    loader: Arc<dyn SourceLoader>,
    transpiler: Arc<dyn Transpiler>,
    store: Arc<dyn ArtifactStore>,
    manifest: Option<BuildManifest>,
}

impl Compiler {
    pub fn new(
        loader: Arc<dyn SourceLoader>,
        transpiler: Arc<dyn Transpiler>,
        store: Arc<dyn ArtifactStore>,
    ) -> Self {
        Self {
            graph: ModuleGraph::new(),
            resolver: Resolver::new(),
            loader,
            transpiler,
            store,
            manifest: None,
        }
    }

    pub fn with_resolver(mut self, resolver: Resolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_manifest(mut self, manifest: BuildManifest) -> Self {
        self.manifest = Some(manifest);
        self
    }

    pub fn with_graph(mut self, graph: ModuleGraph) -> Self {
        self.graph = graph;
        self
    }

    pub fn graph(&self) -> &ModuleGraph {
        &self.graph
    }

    pub fn store(&self) -> &dyn ArtifactStore {
        self.store.as_ref()
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn propagator(&self) -> ChangePropagator<'_> {
        ChangePropagator::new(&self.graph, self.store.as_ref())
    }

    /// Compare the configured build manifest with the stored one and
    /// discard everything on mismatch. Failing to discard is fatal.
    pub fn prepare(&self) -> Result<ManifestStatus, FatalBuildError> {
        let Some(manifest) = &self.manifest else {
            return Ok(ManifestStatus::Fresh);
        };

        let status = manifest.check(self.store.as_ref())?;
        match status {
            ManifestStatus::Matches => return Ok(status),
            ManifestStatus::Mismatch => {
                tracing::info!("build manifest changed, discarding module graph and artifact cache");
                self.reset()?;
            }
            ManifestStatus::Fresh => {}
        }
        manifest.write(self.store.as_ref())?;
        Ok(status)
    }

    /// Discard the whole module graph and artifact store.
    pub fn reset(&self) -> Result<(), StoreError> {
        self.graph.clear();
        self.store.clear()?;
        if let Some(manifest) = &self.manifest {
            manifest.write(self.store.as_ref())?;
        }
        Ok(())
    }

    /// Resolve an entry string (absolute path, URL or import-map alias).
    pub fn resolve_entry(&self, entry: &str) -> Result<Specifier, ResolveError> {
        self.resolver.resolve(None, entry).map(|resolved| resolved.specifier)
    }

    /// Compile one module and everything it depends on.
    pub async fn compile(
        &self,
        specifier: &Specifier,
        options: CompileOptions,
    ) -> Result<Module, ModuleError> {
        let mut report = self.compile_all(std::slice::from_ref(specifier), options).await;
        match report.take(specifier) {
            Some(outcome) => outcome,
            None => self
                .graph
                .module(specifier)
                .ok_or_else(|| LoadError::NotFound(specifier.clone()).into()),
        }
    }

    /// Compile several roots in one pass.
    ///
    /// With `force_refresh`, importers of every root whose content hash
    /// changed are repaired before returning.
    pub async fn compile_all(&self, roots: &[Specifier], options: CompileOptions) -> PassReport {
        let pass = CompilePass::new(options);
        join_all(
            roots
                .iter()
                .map(|root| self.compile_module(&pass, root.clone(), options.force_refresh)),
        )
        .await;

        let mut report = self.settle(&pass);
        if options.force_refresh {
            let propagator = self.propagator();
            for root in roots {
                if report.changed.contains(root) {
                    let propagation = propagator.propagate(root, |_, _| {});
                    self.absorb(&mut report, propagation);
                }
            }
        }
        tracing::info!(
            "compile pass finished: {} modules, {} transpiled, {} reused, {} errors",
            report.outcomes.len(),
            report.transpiled,
            report.reused,
            report.error_count()
        );
        report
    }

    /// Handle a `sourceChanged` event: recompile the module, repair every
    /// dependent, and report what settled.
    pub async fn source_changed(&self, specifier: &Specifier) -> ChangeOutcome {
        let previous = self.graph.module(specifier);
        if previous.is_none() && self.graph.dependents(specifier).is_empty() {
            tracing::debug!("ignoring change to {} (not in the module graph)", specifier);
            return ChangeOutcome::default();
        }
        let previous_hash = previous
            .as_ref()
            .map(|m| m.content_hash.clone())
            .unwrap_or_default();

        let mut report = self
            .compile_all(std::slice::from_ref(specifier), CompileOptions::refresh())
            .await;

        let mut settled = Vec::new();
        let removed = previous.is_some()
            && matches!(report.outcome(specifier), Some(Err(e)) if e.is_not_found());

        if removed {
            tracing::info!("{} was removed", specifier);
            self.remove(specifier);
            settled.push(ModuleSettled {
                specifier: specifier.clone(),
                hmr_relevant: true,
                error: Some("module removed".to_string()),
            });
        } else {
            let current = self.graph.module(specifier);
            settled.push(ModuleSettled {
                specifier: specifier.clone(),
                hmr_relevant: current.as_ref().map(|m| m.content_hash.as_str())
                    != Some(previous_hash.as_str()),
                error: current.as_ref().and_then(|m| m.error().map(str::to_string)),
            });
        }

        // The pass only repairs importers of a root that settled with a new
        // hash; a removed or errored root still needs its importers redone.
        if !report.changed.contains(specifier) {
            let propagation = self.propagator().propagate(specifier, |_, _| {});
            self.absorb(&mut report, propagation);
        }

        // Inside a cycle the changed module's importers are also its
        // dependencies, so they settle within the pass rather than through
        // propagation. Both land in `changed`.
        settled.extend(
            report
                .changed
                .iter()
                .filter(|changed| *changed != specifier)
                .map(|changed| ModuleSettled {
                    specifier: changed.clone(),
                    hmr_relevant: true,
                    error: None,
                }),
        );

        ChangeOutcome {
            settled,
            report,
            removed,
        }
    }

    /// Compiled bytes of a settled module.
    pub fn artifact(&self, specifier: &Specifier) -> Result<Option<Vec<u8>>, ArtifactError> {
        let Some(module) = self.graph.module(specifier) else {
            return Ok(None);
        };
        let Some(output) = &module.output else {
            return Ok(None);
        };
        match self.store.get(&output.key)? {
            Some(code) => Ok(Some(code)),
            None => Err(ArtifactError::Missing {
                specifier: specifier.clone(),
                key: output.key.clone(),
            }),
        }
    }

    /// Fold a dependent-repair run into a pass report. Modules that could
    /// not be repaired are marked errored so a stale hash never ships.
    fn absorb(&self, report: &mut PassReport, propagation: PropagationReport) {
        report.writes += propagation.writes;
        for missing in propagation.missing {
            if !report.missing.contains(&missing) {
                tracing::warn!("{}", missing);
                report.missing.push(missing);
            }
        }
        for specifier in propagation.updated {
            if !report.changed.contains(&specifier) {
                report.changed.push(specifier.clone());
            }
            report.propagated.push(specifier);
        }
        for (specifier, error) in propagation.failures {
            let reason = error.to_string();
            let _ = self.graph.update(&specifier, |m| m.mark_errored(reason));
            report.outcomes.insert(specifier, Err(error.into()));
        }
    }

    /// Drop a deleted module's record, sidecar and artifact. Edges pointing
    /// at it stay so dependents can report the missing dependency.
    fn remove(&self, specifier: &Specifier) {
        let Some(module) = self.graph.remove(specifier) else {
            return;
        };
        let cleanup = self.store.remove_sidecar(specifier).and_then(|()| match &module.output {
            Some(output) => self.store.remove(&output.key),
            None => Ok(()),
        });
        if let Err(e) = cleanup {
            tracing::warn!("failed to drop artifacts of {}: {}", specifier, e);
        }
    }

    fn compile_module<'a>(
        &'a self,
        pass: &'a CompilePass,
        specifier: Specifier,
        force_refresh: bool,
    ) -> BoxFuture<'a, ()> {
        async move {
            if !pass.claim(&specifier) {
                return;
            }

            let (existing, _) = self.graph.get_or_create(&specifier);
            if existing.external || (existing.is_ready() && !force_refresh) {
                return;
            }

            match self.build_module(pass, &specifier, &existing).await {
                Ok(targets) => {
                    if pass.options().ignore_deps {
                        return;
                    }
                    join_all(
                        targets
                            .into_iter()
                            .map(|target| self.compile_module(pass, target, false)),
                    )
                    .await;
                }
                Err(error) => {
                    tracing::warn!("{}", error);
                    let reason = error.to_string();
                    let _ = self.graph.update(&specifier, |m| m.mark_errored(reason));
                    pass.fail(&specifier, error);
                }
            }
        }
        .boxed()
    }

    /// Load and (if needed) transpile one module, record its dependencies
    /// and return the targets to recurse into.
    async fn build_module(
        &self,
        pass: &CompilePass,
        specifier: &Specifier,
        existing: &Module,
    ) -> Result<Vec<Specifier>, ModuleError> {
        let loaded = self.loader.load(specifier).await?;
        if !loaded.kind.is_supported() {
            return Err(ModuleError::UnsupportedKind {
                specifier: specifier.clone(),
                kind: loaded.kind,
            });
        }
        let source_hash = HashChain::source_hash(&loaded.bytes);

        if let Some(restored) = self.restore(specifier, existing, &source_hash)? {
            tracing::debug!("{} unchanged, reusing compiled output", specifier);
            pass.reused();
            for external in &restored.externals {
                self.ensure_external(external);
            }
            let targets = dependency_targets(&restored.deps);
            self.graph
                .update(specifier, |m| {
                    m.kind = restored.kind;
                    m.source_hash = source_hash;
                    m.deps = restored.deps;
                    m.flags = restored.flags;
                    m.output = restored.output;
                    m.state = ModuleState::Pending;
                })
                .map_err(|_| LoadError::NotFound(specifier.clone()))?;
            self.register(&targets);
            return Ok(targets);
        }

        let source = std::str::from_utf8(&loaded.bytes).map_err(|e| ModuleError::Transpile {
            specifier: specifier.clone(),
            source: TranspileError::Failed {
                message: format!("source is not valid UTF-8: {e}"),
                location: None,
            },
        })?;
        let output = self
            .transpiler
            .transpile(specifier, source, &loaded.kind)
            .await
            .map_err(|source| ModuleError::Transpile {
                specifier: specifier.clone(),
                source,
            })?;
        tracing::debug!("transpiled {} ({} imports)", specifier, output.imports.len());

        let mut edges = Vec::with_capacity(output.imports.len());
        let mut rewrites = Vec::new();
        let mut rewritten = Vec::new();
        for import in &output.imports {
            let resolved = self.resolver.resolve(Some(specifier), &import.specifier)?;
            if resolved.external {
                self.ensure_external(&resolved.specifier);
            }
            if let Some(range) = import.range.clone() {
                let target = if resolved.external {
                    ImportTarget::Url(resolved.specifier.to_string())
                } else {
                    ImportTarget::Module {
                        path: emit::output_path(&resolved.specifier),
                        hashed: !import.is_dynamic,
                    }
                };
                rewrites.push(Rewrite { range, target });
                rewritten.push(edges.len());
            }
            edges.push(DependencyEdge {
                target: resolved.specifier,
                is_dynamic: import.is_dynamic,
                hash_slot: None,
            });
        }

        let emitted = emit::emit(&output.code, &rewrites);
        for (edge_index, slot) in rewritten.into_iter().zip(emitted.slots) {
            edges[edge_index].hash_slot = slot;
        }

        let kind = loaded.kind;
        let targets = dependency_targets(&edges);
        self.graph
            .update(specifier, |m| {
                m.flags = ModuleFlags {
                    is_style: kind.is_style(),
                    has_side_effect_hooks: output.side_effects,
                    is_dynamic_entry_only: m.flags.is_dynamic_entry_only,
                };
                m.kind = Some(kind);
                m.source_hash = source_hash;
                m.deps = edges;
                m.state = ModuleState::Pending;
            })
            .map_err(|_| LoadError::NotFound(specifier.clone()))?;
        pass.stage(specifier, emitted.code);
        self.register(&targets);
        Ok(targets)
    }

    /// Previous compile output that is still valid for `source_hash`: the
    /// in-memory record first, then the store's sidecar.
    fn restore(
        &self,
        specifier: &Specifier,
        existing: &Module,
        source_hash: &str,
    ) -> Result<Option<Restored>, StoreError> {
        let current = existing.source_hash == source_hash && existing.error().is_none();
        if let Some(output) = existing.output.as_ref().filter(|_| current) {
            if self.store.contains(&output.key)? {
                return Ok(Some(Restored {
                    kind: existing.kind.clone(),
                    deps: existing.deps.clone(),
                    flags: existing.flags,
                    output: existing.output.clone(),
                    externals: Vec::new(),
                }));
            }
        }

        let Some(sidecar) = self.store.get_sidecar(specifier)? else {
            return Ok(None);
        };
        let Some(output) = sidecar.output.as_ref() else {
            return Ok(None);
        };
        if sidecar.source_hash != source_hash || !self.store.contains(&output.key)? {
            return Ok(None);
        }

        let Sidecar {
            kind,
            deps,
            flags,
            output,
            externals,
            ..
        } = sidecar;
        Ok(Some(Restored {
            kind,
            deps,
            flags,
            output,
            externals,
        }))
    }

    fn ensure_external(&self, specifier: &Specifier) {
        let (module, created) = self.graph.get_or_create(specifier);
        if created || (module.is_pending() && module.source_hash.is_empty()) {
            self.graph.insert(Module::external(specifier.clone()));
        }
    }

    /// Referenced modules exist as `Pending` records from first reference.
    fn register(&self, targets: &[Specifier]) {
        for target in targets {
            self.graph.get_or_create(target);
        }
    }

    fn settle(&self, pass: &CompilePass) -> PassReport {
        let touched = pass.touched();
        let propagator = self.propagator();
        let mut report = PassReport::default();

        for specifier in &touched {
            if pass.has_error(specifier) {
                continue;
            }
            self.update_entry_flags(specifier);

            let staged = pass.take_staged(specifier);
            if staged.is_none() && self.is_settled(specifier) {
                report.missing.extend(propagator.missing(specifier));
                continue;
            }
            match propagator.refresh(specifier, staged) {
                Ok(Some(refreshed)) => {
                    report.writes += refreshed.writes;
                    report.missing.extend(refreshed.missing);
                    if refreshed.hash_changed {
                        report.changed.push(specifier.clone());
                    }
                }
                Ok(None) => {}
                Err(error) => {
                    tracing::warn!("failed to settle {}: {}", specifier, error);
                    let reason = error.to_string();
                    let _ = self.graph.update(specifier, |m| m.mark_errored(reason));
                    pass.fail(specifier, error.into());
                }
            }
        }

        for missing in &report.missing {
            tracing::warn!("{}", missing);
        }

        (report.transpiled, report.reused) = pass.counters();
        for specifier in touched {
            let outcome = match pass.take_error(&specifier) {
                Some(error) => Err(error),
                None => match self.graph.module(&specifier) {
                    Some(module) => Ok(module),
                    None => continue,
                },
            };
            report.outcomes.insert(specifier, outcome);
        }
        report
    }

    /// A `Ready` module whose stored hash still matches the graph. Its
    /// artifact is up to date, so settling it would only re-read the blob.
    fn is_settled(&self, specifier: &Specifier) -> bool {
        self.graph
            .module(specifier)
            .is_some_and(|m| m.is_ready() && HashChain::is_current(&self.graph, &m))
    }

    /// A module every importer reaches only through `import()`.
    fn update_entry_flags(&self, specifier: &Specifier) {
        let importers = self.graph.dependents(specifier);
        let dynamic_only = !importers.is_empty()
            && importers.iter().all(|importer| {
                self.graph
                    .dependencies(importer)
                    .iter()
                    .filter(|edge| &edge.target == specifier)
                    .all(|edge| edge.is_dynamic)
            });

        if self
            .graph
            .module(specifier)
            .is_some_and(|m| m.flags.is_dynamic_entry_only != dynamic_only)
        {
            let _ = self
                .graph
                .update(specifier, |m| m.flags.is_dynamic_entry_only = dynamic_only);
        }
    }
}

/// Distinct dependency targets in source order.
fn dependency_targets(edges: &[DependencyEdge]) -> Vec<Specifier> {
    let mut seen = HashSet::default();
    edges
        .iter()
        .filter(|edge| seen.insert(edge.target.clone()))
        .map(|edge| edge.target.clone())
        .collect()
}
