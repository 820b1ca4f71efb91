use serde::{Deserialize, Serialize};

use crate::Specifier;

/// Source language of a module as declared by the source loader.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    JavaScript,
    TypeScript,
    Jsx,
    Tsx,
    Css,
    Json,
    /// Anything the compiler has no transpiler for (e.g. `.wasm`, `.md`).
    Other(String),
}

impl SourceKind {
    /// Infer the kind from a file extension.
    pub fn from_extension(ext: &str) -> Self {
        match ext {
            "js" | "mjs" | "cjs" => Self::JavaScript,
            "ts" | "mts" | "cts" => Self::TypeScript,
            "jsx" => Self::Jsx,
            "tsx" => Self::Tsx,
            "css" => Self::Css,
            "json" => Self::Json,
            other => Self::Other(other.to_string()),
        }
    }

    /// Infer the kind from a specifier.
    ///
    /// Remote modules are served as JavaScript unless their extension says
    /// otherwise (`https://esm.sh/react@18.2.0` has no real extension).
    pub fn from_specifier(specifier: &Specifier) -> Self {
        match specifier.extension().map(Self::from_extension) {
            Some(Self::Other(_)) | None if specifier.is_remote() => Self::JavaScript,
            Some(kind) => kind,
            None => Self::JavaScript,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Other(_))
    }

    pub fn is_style(&self) -> bool {
        matches!(self, Self::Css)
    }
}

/// Byte range inside compiled output holding a dependency's hash token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HashSlot {
    pub offset: usize,
    pub len: usize,
}

impl HashSlot {
    pub fn new(offset: usize, len: usize) -> Self {
        Self { offset, len }
    }

    pub fn end(&self) -> usize {
        self.offset + self.len
    }
}

/// Edge from an importing module to one of its dependencies, in source order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub target: Specifier,
    /// Lazily imported (`import()`); excluded from hash folding and from
    /// "must bundle together" decisions.
    pub is_dynamic: bool,
    /// Where the target's hash token is embedded in the importer's output.
    pub hash_slot: Option<HashSlot>,
}

impl DependencyEdge {
    pub fn new(target: Specifier) -> Self {
        Self {
            target,
            is_dynamic: false,
            hash_slot: None,
        }
    }

    pub fn dynamic(target: Specifier) -> Self {
        Self {
            target,
            is_dynamic: true,
            hash_slot: None,
        }
    }

    pub fn with_slot(mut self, slot: HashSlot) -> Self {
        self.hash_slot = Some(slot);
        self
    }
}

/// Booleans consumed by the renderer; the graph only carries them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleFlags {
    pub is_style: bool,
    pub has_side_effect_hooks: bool,
    pub is_dynamic_entry_only: bool,
}

/// Compilation lifecycle of a module record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModuleState {
    #[default]
    Pending,
    Ready,
    Errored(String),
}

/// Handle to compiled output bytes in the artifact store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRef {
    /// Store key (the content hash the bytes were written under).
    pub key: String,
    pub len: usize,
}

/// One compilation unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub specifier: Specifier,
    pub kind: Option<SourceKind>,
    /// Hash of this module's own source bytes; empty until first load.
    pub source_hash: String,
    /// Transitive hash folding in every static dependency's content hash.
    pub content_hash: String,
    pub deps: Vec<DependencyEdge>,
    pub output: Option<OutputRef>,
    pub external: bool,
    pub flags: ModuleFlags,
    pub state: ModuleState,
}

impl Module {
    /// A freshly referenced module awaiting compilation.
    pub fn pending(specifier: Specifier) -> Self {
        Self {
            specifier,
            kind: None,
            source_hash: String::new(),
            content_hash: String::new(),
            deps: Vec::new(),
            output: None,
            external: false,
            flags: ModuleFlags::default(),
            state: ModuleState::Pending,
        }
    }

    /// A module a resolve listener marked as not-to-be-compiled.
    ///
    /// External modules are leaves: no deps, no output.
    pub fn external(specifier: Specifier) -> Self {
        Self {
            external: true,
            state: ModuleState::Ready,
            ..Self::pending(specifier)
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, ModuleState::Ready)
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, ModuleState::Pending)
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            ModuleState::Errored(reason) => Some(reason),
            _ => None,
        }
    }

    /// Statically imported dependencies, in source order.
    pub fn static_deps(&self) -> impl Iterator<Item = &DependencyEdge> {
        self.deps.iter().filter(|edge| !edge.is_dynamic)
    }

    /// Lazily imported dependencies, in source order.
    pub fn dynamic_deps(&self) -> impl Iterator<Item = &DependencyEdge> {
        self.deps.iter().filter(|edge| edge.is_dynamic)
    }

    /// Mark the module errored, dropping anything derived from a previous
    /// successful compile.
    pub fn mark_errored(&mut self, reason: impl Into<String>) {
        self.state = ModuleState::Errored(reason.into());
        self.deps.clear();
        self.output = None;
        self.content_hash.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_from_extension() {
        assert_eq!(SourceKind::from_extension("tsx"), SourceKind::Tsx);
        assert_eq!(SourceKind::from_extension("mjs"), SourceKind::JavaScript);
        assert!(!SourceKind::from_extension("wasm").is_supported());
        assert!(SourceKind::Css.is_style());
    }

    #[test]
    fn extensionless_remote_defaults_to_javascript() {
        let spec = Specifier::new("https://esm.sh/react").unwrap();
        assert_eq!(SourceKind::from_specifier(&spec), SourceKind::JavaScript);
    }

    #[test]
    fn versioned_remote_without_extension_is_javascript() {
        let spec = Specifier::new("https://esm.sh/react@18.2.0").unwrap();
        assert_eq!(SourceKind::from_specifier(&spec), SourceKind::JavaScript);

        let local = Specifier::new("/assets/logo.svg").unwrap();
        assert!(!SourceKind::from_specifier(&local).is_supported());
    }

    #[test]
    fn external_modules_are_ready_leaves() {
        let module = Module::external(Specifier::new("https://cdn.dev/x.js").unwrap());
        assert!(module.is_ready());
        assert!(module.external);
        assert!(module.deps.is_empty());
        assert!(module.output.is_none());
    }

    #[test]
    fn mark_errored_clears_derived_state() {
        let spec = Specifier::new("/a.ts").unwrap();
        let mut module = Module::pending(spec.clone());
        module.deps.push(DependencyEdge::new(spec));
        module.content_hash = "abc".into();
        module.mark_errored("boom");

        assert_eq!(module.error(), Some("boom"));
        assert!(module.deps.is_empty());
        assert!(module.content_hash.is_empty());
    }
}
