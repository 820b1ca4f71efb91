//! Transitive content hashing.
//!
//! A module's content hash folds its own source hash with the content hash
//! of every static, non-external dependency, in recorded source order:
//!
//! ```text
//! content(M) = source(M)                                   if M has no foldable deps
//! content(M) = H(source(M) ++ content(d1) ++ content(d2) ...) otherwise
//! ```
//!
//! A dependency that is already on the current fold path (an import cycle)
//! contributes its source hash instead of recursing. A cycle member reached
//! a second time off the fold path contributes the hash it folded to earlier
//! in the same walk, so within a cycle the hash folded into an importer can
//! differ from the member's own content hash (the one its importers embed as
//! a token). Both are deterministic for a given graph. Nothing in here ever
//! calls a transpiler: hashes are derived from graph state alone.

use rustc_hash::FxHashMap as HashMap;

use crate::memory::{Direction, Tracing, Visitor, WalkControl};
use crate::{Module, ModuleGraph, Specifier};

/// Width, in hex characters, of the token embedded in compiled import paths.
pub const TOKEN_LEN: usize = 16;

/// Computes and compares content hashes over a [`ModuleGraph`].
#[derive(Debug, Clone, Copy, Default)]
pub struct HashChain;

impl HashChain {
    /// BLAKE3 hex digest of raw source bytes.
    pub fn source_hash(bytes: &[u8]) -> String {
        blake3::hash(bytes).to_hex().to_string()
    }

    /// Fold a source hash with dependency content hashes.
    pub fn fold<'a, I>(source_hash: &str, dep_hashes: I) -> String
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut deps = dep_hashes.into_iter().peekable();
        if deps.peek().is_none() {
            return source_hash.to_string();
        }

        let mut hasher = blake3::Hasher::new();
        hasher.update(source_hash.as_bytes());
        for hash in deps {
            hasher.update(hash.as_bytes());
        }
        hasher.finalize().to_hex().to_string()
    }

    /// The fixed-width token written into importers' compiled output.
    pub fn token(content_hash: &str) -> &str {
        &content_hash[..content_hash.len().min(TOKEN_LEN)]
    }

    /// Compute the content hash of `specifier` from current graph state.
    ///
    /// Returns `None` when the module has no record, is external, or has
    /// never been loaded.
    pub fn content_hash(graph: &ModuleGraph, specifier: &Specifier) -> Option<String> {
        let mut fold = FoldVisitor::default();
        let mut tracing = Tracing::default();
        graph.walk(specifier, Direction::Static, &mut tracing, &mut fold);
        fold.result
    }

    /// Whether the stored content hash of `module` matches what the graph
    /// would derive for it now.
    pub fn is_current(graph: &ModuleGraph, module: &Module) -> bool {
        match Self::content_hash(graph, &module.specifier) {
            Some(hash) => hash == module.content_hash,
            None => module.content_hash.is_empty(),
        }
    }
}

struct Frame {
    source_hash: String,
    dep_hashes: Vec<String>,
    /// External, missing and never-loaded modules take no part in the fold.
    contributes: bool,
}

fn folds(module: &Module) -> bool {
    !module.external && !module.source_hash.is_empty()
}

#[derive(Default)]
struct FoldVisitor {
    frames: Vec<Frame>,
    memo: HashMap<Specifier, String>,
    result: Option<String>,
}

impl Visitor for FoldVisitor {
    fn enter(&mut self, _specifier: &Specifier, module: Option<&Module>, _depth: usize) -> WalkControl {
        match module {
            Some(module) if folds(module) => {
                self.frames.push(Frame {
                    source_hash: module.source_hash.clone(),
                    dep_hashes: Vec::new(),
                    contributes: true,
                });
                WalkControl::Continue
            }
            _ => {
                self.frames.push(Frame {
                    source_hash: String::new(),
                    dep_hashes: Vec::new(),
                    contributes: false,
                });
                WalkControl::SkipChildren
            }
        }
    }

    fn leave(&mut self, specifier: &Specifier, _module: Option<&Module>) {
        let Some(frame) = self.frames.pop() else {
            return;
        };
        if !frame.contributes {
            return;
        }

        let hash = HashChain::fold(&frame.source_hash, frame.dep_hashes.iter().map(String::as_str));
        self.memo.insert(specifier.clone(), hash.clone());
        match self.frames.last_mut() {
            Some(parent) => parent.dep_hashes.push(hash),
            None => self.result = Some(hash),
        }
    }

    fn revisit(&mut self, specifier: &Specifier, module: Option<&Module>, on_path: bool) {
        let Some(parent) = self.frames.last_mut() else {
            return;
        };
        let Some(module) = module.filter(|m| folds(m)) else {
            return;
        };

        if on_path {
            parent.dep_hashes.push(module.source_hash.clone());
        } else if let Some(hash) = self.memo.get(specifier) {
            parent.dep_hashes.push(hash.clone());
        }
    }
}
