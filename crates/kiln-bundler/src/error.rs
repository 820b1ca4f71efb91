//! Error types for kiln-bundler.

use kiln_compiler::{ArtifactError, FatalBuildError};

/// Result type alias for bundling operations.
pub type Result<T> = std::result::Result<T, BundleError>;

#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    /// The build cannot produce a consistent bundle (errored or missing
    /// module, failed write).
    #[error(transparent)]
    Fatal(#[from] FatalBuildError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    /// The chunk emitter rejected a chunk.
    #[error("failed to emit chunk '{chunk}': {message}")]
    Emit { chunk: String, message: String },

    /// A chunk name would place output outside the output directory.
    #[error("invalid chunk name '{0}'")]
    InvalidChunkName(String),

    #[error("failed to serialize bundle manifest: {0}")]
    Manifest(#[from] serde_json::Error),
}
