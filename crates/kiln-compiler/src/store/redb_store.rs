//! redb-backed artifact store.
//!
//! A single `kiln.redb` file with ACID transactions. Sidecars are
//! bincode-encoded.

use std::path::{Path, PathBuf};

use kiln_graph::Specifier;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};

use super::{ArtifactStore, Sidecar};
use crate::error::StoreError;

/// Compiled bytes keyed by artifact key.
const BLOB_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("blobs");

/// Bincode-encoded sidecars keyed by specifier.
const SIDECAR_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("sidecars");

/// Store-wide metadata (the build manifest lives here).
const METADATA_TABLE: TableDefinition<&str, &str> = TableDefinition::new("metadata");

/// Persistent artifact store.
pub struct RedbStore {
    db: Database,
    path: PathBuf,
}

impl RedbStore {
    /// Open or create the store at `<cache_dir>/kiln.redb`.
    pub fn open(cache_dir: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(cache_dir)?;
        let path = cache_dir.join("kiln.redb");
        let db = Database::create(&path)?;

        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(BLOB_TABLE)?;
            let _ = write_txn.open_table(SIDECAR_TABLE)?;
            let _ = write_txn.open_table(METADATA_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self { db, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of stored blobs.
    pub fn len(&self) -> Result<usize, StoreError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(BLOB_TABLE)?;
        Ok(table.iter()?.count())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore").field("path", &self.path).finish()
    }
}

impl ArtifactStore for RedbStore {
    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(BLOB_TABLE)?;
            table.insert(key, bytes)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(BLOB_TABLE)?;
        Ok(table.get(key)?.map(|value| value.value().to_vec()))
    }

    fn contains(&self, key: &str) -> Result<bool, StoreError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(BLOB_TABLE)?;
        Ok(table.get(key)?.is_some())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(BLOB_TABLE)?;
            table.remove(key)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn put_sidecar(&self, sidecar: &Sidecar) -> Result<(), StoreError> {
        let bytes = bincode::serialize(sidecar)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(SIDECAR_TABLE)?;
            table.insert(sidecar.specifier.as_str(), bytes.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn get_sidecar(&self, specifier: &Specifier) -> Result<Option<Sidecar>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SIDECAR_TABLE)?;
        let Some(value) = table.get(specifier.as_str())? else {
            return Ok(None);
        };
        Ok(Some(bincode::deserialize(value.value())?))
    }

    fn remove_sidecar(&self, specifier: &Specifier) -> Result<(), StoreError> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(SIDECAR_TABLE)?;
            table.remove(specifier.as_str())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn set_metadata(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(METADATA_TABLE)?;
            table.insert(key, value)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn get_metadata(&self, key: &str) -> Result<Option<String>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(METADATA_TABLE)?;
        Ok(table.get(key)?.map(|v| v.value().to_string()))
    }

    fn clear(&self) -> Result<(), StoreError> {
        let write_txn = self.db.begin_write()?;
        {
            // Drop and recreate the tables to clear them
            write_txn.delete_table(BLOB_TABLE)?;
            write_txn.delete_table(SIDECAR_TABLE)?;
            write_txn.delete_table(METADATA_TABLE)?;
            let _ = write_txn.open_table(BLOB_TABLE)?;
            let _ = write_txn.open_table(SIDECAR_TABLE)?;
            let _ = write_txn.open_table(METADATA_TABLE)?;
        }
        write_txn.commit()?;
        Ok(())
    }
}
