//! Error types for kiln-compiler.
//!
//! Two outcome levels exist. Per-module failures ([`ModuleError`]) mark a
//! single record `Errored` and are collected into a pass report while the
//! rest of the pass continues. [`FatalBuildError`] is only produced when a
//! caller asks for a full, consistent build and something reachable is
//! broken.

use std::fmt;
use std::path::PathBuf;

use kiln_graph::{SourceKind, Specifier};

/// Result type alias for per-module compile outcomes.
pub type Result<T> = std::result::Result<T, ModuleError>;

/// Failure to turn an import string into a specifier.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("cannot resolve '{specifier}'{}", importer_suffix(.importer))]
    Unresolved {
        specifier: String,
        importer: Option<Specifier>,
    },

    #[error("resolve listener rewrote '{specifier}' to invalid target '{target}'")]
    InvalidTarget { specifier: String, target: String },

    #[error("invalid resolve pattern: {0}")]
    Pattern(#[from] regex::Error),
}

fn importer_suffix(importer: &Option<Specifier>) -> String {
    importer
        .as_ref()
        .map(|i| format!(" imported from {i}"))
        .unwrap_or_default()
}

/// Source loader failures.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("module not found: {0}")]
    NotFound(Specifier),

    #[error("failed to fetch {specifier}: {reason}")]
    FetchFailed { specifier: Specifier, reason: String },

    #[error("failed to read {specifier}: {source}")]
    Io {
        specifier: Specifier,
        #[source]
        source: std::io::Error,
    },
}

/// Line/column inside the transpiled source, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Transpiler failures.
#[derive(Debug, thiserror::Error)]
pub enum TranspileError {
    #[error("unsupported syntax for {kind:?} source")]
    UnsupportedSyntax { kind: SourceKind },

    #[error("{message}{}", .location.map(|l| format!(" at {l}")).unwrap_or_default())]
    Failed {
        message: String,
        location: Option<SourceLocation>,
    },
}

/// Artifact store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("artifact store database error: {0}")]
    Database(String),

    #[error("sidecar serialization error: {0}")]
    Serialization(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<redb::Error> for StoreError {
    fn from(err: redb::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

impl From<redb::DatabaseError> for StoreError {
    fn from(err: redb::DatabaseError) -> Self {
        StoreError::Database(err.to_string())
    }
}

impl From<redb::TableError> for StoreError {
    fn from(err: redb::TableError) -> Self {
        StoreError::Database(err.to_string())
    }
}

impl From<redb::TransactionError> for StoreError {
    fn from(err: redb::TransactionError) -> Self {
        StoreError::Database(err.to_string())
    }
}

impl From<redb::StorageError> for StoreError {
    fn from(err: redb::StorageError) -> Self {
        StoreError::Database(err.to_string())
    }
}

impl From<redb::CommitError> for StoreError {
    fn from(err: redb::CommitError) -> Self {
        StoreError::Database(err.to_string())
    }
}

impl From<bincode::Error> for StoreError {
    fn from(err: bincode::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Reading or patching a module's compiled output failed.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("compiled output of {specifier} is missing from the store (key {key})")]
    Missing { specifier: Specifier, key: String },

    #[error("hash slot {offset}..{end} is out of range for {specifier} ({size} bytes)")]
    SlotOutOfRange {
        specifier: Specifier,
        offset: usize,
        end: usize,
        size: usize,
    },
}

/// Per-module compile failure. The module is marked `Errored`; siblings and
/// dependents keep compiling.
#[derive(Debug, thiserror::Error)]
pub enum ModuleError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("{specifier}: {source}")]
    Transpile {
        specifier: Specifier,
        #[source]
        source: TranspileError,
    },

    #[error("{specifier}: no transpiler for source kind {kind:?}")]
    UnsupportedKind { specifier: Specifier, kind: SourceKind },

    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

impl From<StoreError> for ModuleError {
    fn from(err: StoreError) -> Self {
        ModuleError::Artifact(ArtifactError::Store(err))
    }
}

impl ModuleError {
    /// Whether the source file is gone (as opposed to broken).
    pub fn is_not_found(&self) -> bool {
        matches!(self, ModuleError::Load(LoadError::NotFound(_)))
    }
}

/// An edge points at a specifier that has no module record after the
/// recursive compile finished. Non-fatal for the graph.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{importer} imports {dependency}, which is not in the module graph")]
pub struct MissingDependency {
    pub importer: Specifier,
    pub dependency: Specifier,
}

/// Errors that abort a full build invocation.
#[derive(Debug, thiserror::Error)]
pub enum FatalBuildError {
    #[error("module {specifier} failed to compile: {reason}")]
    ErroredModule { specifier: Specifier, reason: String },

    #[error(transparent)]
    MissingDependency(#[from] MissingDependency),

    #[error("artifact store: {0}")]
    Store(#[from] StoreError),

    #[error("failed to write bundle {}: {source}", .path.display())]
    BundleWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
