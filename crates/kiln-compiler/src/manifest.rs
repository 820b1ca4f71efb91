//! Build manifest: the one global cache-busting mechanism.
//!
//! Persisted in the artifact store's metadata table. When the stored
//! manifest differs from the current one, every module record and every
//! artifact is discarded before the next pass.

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::store::ArtifactStore;

/// Metadata key the manifest is stored under.
pub const MANIFEST_KEY: &str = "build-manifest";

/// Kiln compiler version baked into every manifest.
pub const COMPILER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildManifest {
    pub compiler_version: String,
    pub import_map_digest: String,
    pub plugin_list_digest: String,
}

/// Result of comparing the current manifest with the stored one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestStatus {
    /// Nothing stored yet.
    Fresh,
    Matches,
    /// Stored manifest differs or cannot be read; caches are stale.
    Mismatch,
}

impl BuildManifest {
    pub fn new(import_map_digest: impl Into<String>, plugin_list_digest: impl Into<String>) -> Self {
        Self {
            compiler_version: COMPILER_VERSION.to_string(),
            import_map_digest: import_map_digest.into(),
            plugin_list_digest: plugin_list_digest.into(),
        }
    }

    /// BLAKE3 digest of an ordered list of strings.
    pub fn digest<'a, I>(parts: I) -> String
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut hasher = blake3::Hasher::new();
        for part in parts {
            hasher.update(&(part.len() as u64).to_le_bytes());
            hasher.update(part.as_bytes());
        }
        hasher.finalize().to_hex().to_string()
    }

    /// Read the stored manifest. The inner `Err` carries a parse failure.
    pub fn load(store: &dyn ArtifactStore) -> Result<Option<Result<Self, String>>, StoreError> {
        Ok(store
            .get_metadata(MANIFEST_KEY)?
            .map(|raw| serde_json::from_str(&raw).map_err(|e| e.to_string())))
    }

    pub fn write(&self, store: &dyn ArtifactStore) -> Result<(), StoreError> {
        let raw =
            serde_json::to_string(self).map_err(|e| StoreError::Serialization(e.to_string()))?;
        store.set_metadata(MANIFEST_KEY, &raw)
    }

    pub fn check(&self, store: &dyn ArtifactStore) -> Result<ManifestStatus, StoreError> {
        Ok(match Self::load(store)? {
            None => ManifestStatus::Fresh,
            Some(Ok(stored)) if &stored == self => ManifestStatus::Matches,
            Some(Ok(_)) | Some(Err(_)) => ManifestStatus::Mismatch,
        })
    }
}
