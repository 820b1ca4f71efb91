//! Source loading.

use std::io::ErrorKind;

use async_trait::async_trait;
use kiln_graph::{SourceKind, Specifier};

use crate::error::LoadError;

/// Raw source of one module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedSource {
    pub bytes: Vec<u8>,
    pub kind: SourceKind,
}

impl LoadedSource {
    /// Source whose kind is inferred from the specifier's extension.
    pub fn new(specifier: &Specifier, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            kind: SourceKind::from_specifier(specifier),
        }
    }
}

/// Fetches module source. Caching and network retries are the loader's
/// business, not the compiler's.
#[async_trait]
pub trait SourceLoader: Send + Sync {
    async fn load(&self, specifier: &Specifier) -> Result<LoadedSource, LoadError>;
}

/// Reads local specifiers from the filesystem.
///
/// Remote specifiers fail with [`LoadError::FetchFailed`]; plug in a
/// network-capable loader to compile them.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLoader;

impl FsLoader {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SourceLoader for FsLoader {
    async fn load(&self, specifier: &Specifier) -> Result<LoadedSource, LoadError> {
        if specifier.is_remote() {
            return Err(LoadError::FetchFailed {
                specifier: specifier.clone(),
                reason: "remote fetching is not supported by the filesystem loader".to_string(),
            });
        }
        if !specifier.as_str().starts_with('/') {
            return Err(LoadError::NotFound(specifier.clone()));
        }

        let path = specifier
            .as_str()
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string();
        let read = tokio::task::spawn_blocking(move || std::fs::read(path))
            .await
            .map_err(|e| LoadError::Io {
                specifier: specifier.clone(),
                source: std::io::Error::other(e.to_string()),
            })?;

        match read {
            Ok(bytes) => Ok(LoadedSource::new(specifier, bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(LoadError::NotFound(specifier.clone())),
            Err(e) => Err(LoadError::Io {
                specifier: specifier.clone(),
                source: e,
            }),
        }
    }
}
