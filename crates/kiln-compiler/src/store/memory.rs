use std::sync::atomic::{AtomicUsize, Ordering};

use kiln_graph::Specifier;
use parking_lot::Mutex;
use rustc_hash::FxHashMap as HashMap;

use super::{ArtifactStore, Sidecar};
use crate::error::StoreError;

#[derive(Debug, Default)]
struct Tables {
    blobs: HashMap<String, Vec<u8>>,
    sidecars: HashMap<Specifier, Sidecar>,
    metadata: HashMap<String, String>,
}

/// In-process store. Counts blob traffic so callers can assert that a
/// no-op rebuild wrote (or read) nothing.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    blob_writes: AtomicUsize,
    blob_reads: AtomicUsize,
    sidecar_writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `put` calls since creation.
    pub fn blob_writes(&self) -> usize {
        self.blob_writes.load(Ordering::SeqCst)
    }

    /// Number of `get` and `contains` calls since creation.
    pub fn blob_reads(&self) -> usize {
        self.blob_reads.load(Ordering::SeqCst)
    }

    /// Number of `put_sidecar` calls since creation.
    pub fn sidecar_writes(&self) -> usize {
        self.sidecar_writes.load(Ordering::SeqCst)
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.tables.lock().blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ArtifactStore for MemoryStore {
    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        self.blob_writes.fetch_add(1, Ordering::SeqCst);
        self.tables.lock().blobs.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.blob_reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.tables.lock().blobs.get(key).cloned())
    }

    fn contains(&self, key: &str) -> Result<bool, StoreError> {
        self.blob_reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.tables.lock().blobs.contains_key(key))
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.tables.lock().blobs.remove(key);
        Ok(())
    }

    fn put_sidecar(&self, sidecar: &Sidecar) -> Result<(), StoreError> {
        self.sidecar_writes.fetch_add(1, Ordering::SeqCst);
        self.tables
            .lock()
            .sidecars
            .insert(sidecar.specifier.clone(), sidecar.clone());
        Ok(())
    }

    fn get_sidecar(&self, specifier: &Specifier) -> Result<Option<Sidecar>, StoreError> {
        Ok(self.tables.lock().sidecars.get(specifier).cloned())
    }

    fn remove_sidecar(&self, specifier: &Specifier) -> Result<(), StoreError> {
        self.tables.lock().sidecars.remove(specifier);
        Ok(())
    }

    fn set_metadata(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.tables
            .lock()
            .metadata
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get_metadata(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.tables.lock().metadata.get(key).cloned())
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut tables = self.tables.lock();
        tables.blobs.clear();
        tables.sidecars.clear();
        tables.metadata.clear();
        Ok(())
    }
}
