//! Chunk assembly and output.
//!
//! The bundler turns an [`Analysis`] into physical files: one chunk for the
//! shared bundle and one per entry, each named by a hash of its emitted code
//! plus build metadata. Concatenation and minification belong to the
//! [`ChunkEmitter`]; this module only gathers compiled outputs, writes files
//! and records them in `bundle-manifest.json`.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use kiln_compiler::{ArtifactError, ArtifactStore, FatalBuildError, MissingDependency};
use kiln_graph::{Direction, HashChain, Module, ModuleGraph, Specifier, Tracing, WalkControl};
use path_clean::PathClean;
use serde::{Deserialize, Serialize};

use crate::analyzer::{Analysis, BundleAnalyzer, EntryKind, EntryPoint};
use crate::error::{BundleError, Result};

/// File name of the bundle manifest written next to the chunks.
pub const BUNDLE_MANIFEST: &str = "bundle-manifest.json";

/// Name of the shared chunk.
pub const SHARED_CHUNK: &str = "shared";

const CHUNK_HASH_LEN: usize = 8;

/// Compiled output of one module, in bundle order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkModule {
    pub specifier: Specifier,
    pub code: Vec<u8>,
}

/// Everything the emitter needs for one chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkInput {
    pub name: String,
    pub kind: EntryKind,
    /// Dependencies before dependents.
    pub modules: Vec<ChunkModule>,
}

/// The external bundling tool: turns a chunk's compiled modules into the
/// chunk's final code.
#[async_trait]
pub trait ChunkEmitter: Send + Sync {
    async fn emit(&self, chunk: &ChunkInput) -> Result<String>;
}

/// Joins module outputs in order, each under a `// <specifier>` banner.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConcatEmitter;

#[async_trait]
impl ChunkEmitter for ConcatEmitter {
    async fn emit(&self, chunk: &ChunkInput) -> Result<String> {
        let mut code = String::new();
        for module in &chunk.modules {
            let text = std::str::from_utf8(&module.code).map_err(|e| BundleError::Emit {
                chunk: chunk.name.clone(),
                message: format!("{} is not valid UTF-8: {e}", module.specifier),
            })?;
            code.push_str("// ");
            code.push_str(module.specifier.as_str());
            code.push('\n');
            code.push_str(text);
            if !text.ends_with('\n') {
                code.push('\n');
            }
        }
        Ok(code)
    }
}

/// One written chunk file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub name: String,
    /// File name relative to the output directory.
    pub file: String,
    pub kind: EntryKind,
    pub modules: Vec<String>,
}

/// Contents of `bundle-manifest.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleManifest {
    pub chunks: Vec<Chunk>,
}

impl BundleManifest {
    pub fn chunk(&self, name: &str) -> Option<&Chunk> {
        self.chunks.iter().find(|chunk| chunk.name == name)
    }
}

/// Result of a production bundle.
#[derive(Debug, Clone)]
pub struct BundleOutput {
    pub manifest: BundleManifest,
    pub manifest_path: PathBuf,
    pub analysis: Analysis,
}

/// Production bundler over a settled module graph.
pub struct Bundler {
    graph: ModuleGraph,
    store: Arc<dyn ArtifactStore>,
    emitter: Arc<dyn ChunkEmitter>,
    out_dir: PathBuf,
    metadata: String,
}

impl Bundler {
    pub fn new(graph: ModuleGraph, store: Arc<dyn ArtifactStore>, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            graph,
            store,
            emitter: Arc::new(ConcatEmitter),
            out_dir: out_dir.into(),
            metadata: String::new(),
        }
    }

    pub fn with_emitter(mut self, emitter: Arc<dyn ChunkEmitter>) -> Self {
        self.emitter = emitter;
        self
    }

    /// Build metadata folded into every chunk's file hash (e.g. the build
    /// manifest digest).
    pub fn with_metadata(mut self, metadata: impl Into<String>) -> Self {
        self.metadata = metadata.into();
        self
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Every module reachable (statically or dynamically) from an entry
    /// must be compiled, present and carry a current content hash; anything
    /// else fails the build.
    pub fn check(&self, entries: &[EntryPoint]) -> std::result::Result<(), FatalBuildError> {
        let mut visited = Tracing::default();
        let mut reached: Vec<(Specifier, Option<Module>)> = Vec::new();
        for root in entries.iter().flat_map(|entry| &entry.modules) {
            self.graph.walk(
                root,
                Direction::All,
                &mut visited,
                &mut |specifier: &Specifier, module: Option<&Module>, _depth: usize| {
                    reached.push((specifier.clone(), module.cloned()));
                    WalkControl::Continue
                },
            );
        }

        for (specifier, module) in &reached {
            let Some(module) = module else {
                if entries.iter().any(|entry| entry.modules.contains(specifier)) {
                    return Err(FatalBuildError::ErroredModule {
                        specifier: specifier.clone(),
                        reason: "entry module has not been compiled".to_string(),
                    });
                }
                continue;
            };
            if module.external {
                continue;
            }
            if let Some(reason) = module.error() {
                return Err(FatalBuildError::ErroredModule {
                    specifier: specifier.clone(),
                    reason: reason.to_string(),
                });
            }
            if !module.is_ready() {
                return Err(FatalBuildError::ErroredModule {
                    specifier: specifier.clone(),
                    reason: "module has not been compiled".to_string(),
                });
            }
            if !HashChain::is_current(&self.graph, module) {
                return Err(FatalBuildError::ErroredModule {
                    specifier: specifier.clone(),
                    reason: "content hash is stale, its importers were not repaired".to_string(),
                });
            }
            if let Some(edge) = module.deps.iter().find(|edge| !self.graph.contains(&edge.target)) {
                return Err(MissingDependency {
                    importer: specifier.clone(),
                    dependency: edge.target.clone(),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Analyze, emit and write every chunk, then the bundle manifest.
    pub async fn bundle(&self, entries: &[EntryPoint]) -> Result<BundleOutput> {
        self.check(entries)?;

        let analysis = BundleAnalyzer::new(&self.graph).analyze(entries);
        let mut plan = vec![(SHARED_CHUNK.to_string(), EntryKind::Sync, analysis.shared_modules())];
        for entry in analysis.entries() {
            plan.push((entry.name.clone(), entry.kind, analysis.entry_modules(&entry.name)));
        }

        create_dir(&self.out_dir).await?;
        let mut manifest = BundleManifest::default();
        for (name, kind, modules) in plan {
            if modules.is_empty() {
                tracing::debug!("skipping empty chunk '{}'", name);
                continue;
            }
            let chunk = self.write_chunk(name, kind, modules).await?;
            tracing::debug!("wrote chunk {} ({} modules)", chunk.file, chunk.modules.len());
            manifest.chunks.push(chunk);
        }

        let manifest_path = self.out_dir.join(BUNDLE_MANIFEST);
        let json = serde_json::to_vec_pretty(&manifest)?;
        write_file(&manifest_path, &json).await?;

        tracing::info!(
            "bundled {} chunks into {}",
            manifest.chunks.len(),
            self.out_dir.display()
        );
        Ok(BundleOutput {
            manifest,
            manifest_path,
            analysis,
        })
    }

    async fn write_chunk(
        &self,
        name: String,
        kind: EntryKind,
        modules: Vec<Specifier>,
    ) -> Result<Chunk> {
        let mut input = ChunkInput {
            name,
            kind,
            modules: Vec::with_capacity(modules.len()),
        };
        for specifier in &modules {
            input.modules.push(ChunkModule {
                specifier: specifier.clone(),
                code: self.compiled(specifier)?,
            });
        }

        let code = self.emitter.emit(&input).await?;
        let hash = chunk_hash(&code, &self.metadata);
        let file = format!("{}.{}.js", input.name, hash);
        let path = validate_output_path(&self.out_dir, &file)?;
        write_file(&path, code.as_bytes()).await?;

        Ok(Chunk {
            name: input.name,
            file,
            kind,
            modules: modules.iter().map(ToString::to_string).collect(),
        })
    }

    fn compiled(&self, specifier: &Specifier) -> Result<Vec<u8>> {
        let key = self
            .graph
            .module(specifier)
            .and_then(|module| module.output)
            .map(|output| output.key)
            .unwrap_or_default();
        self.store
            .get(&key)
            .map_err(ArtifactError::from)?
            .ok_or_else(|| {
                ArtifactError::Missing {
                    specifier: specifier.clone(),
                    key,
                }
                .into()
            })
    }
}

fn chunk_hash(code: &str, metadata: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(code.as_bytes());
    hasher.update(metadata.as_bytes());
    hasher.finalize().to_hex().as_str()[..CHUNK_HASH_LEN].to_string()
}

/// Join `file` onto `dir`, refusing anything that escapes it.
fn validate_output_path(dir: &Path, file: &str) -> Result<PathBuf> {
    let relative = Path::new(file);
    if relative.is_absolute()
        || relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        return Err(BundleError::InvalidChunkName(file.to_string()));
    }
    let path = dir.join(relative).clean();
    if !path.starts_with(dir.clean()) {
        return Err(BundleError::InvalidChunkName(file.to_string()));
    }
    Ok(path)
}

async fn create_dir(dir: &Path) -> Result<()> {
    tokio::fs::create_dir_all(dir).await.map_err(|source| {
        BundleError::Fatal(FatalBuildError::BundleWrite {
            path: dir.to_path_buf(),
            source,
        })
    })
}

async fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_dir(parent).await?;
    }
    tokio::fs::write(path, bytes).await.map_err(|source| {
        BundleError::Fatal(FatalBuildError::BundleWrite {
            path: path.to_path_buf(),
            source,
        })
    })
}
