//! # Durable tester store.
//!
//! [`Storage`] is the narrow interface the controller needs. [`FileStorage`]
//! keeps a JSON object `{ id → StoredResource }` on disk; every operation runs
//! on the blocking pool behind one async lock, so file access never stalls
//! the runtime and never has two writers. [`MemoryStorage`] is the volatile
//! variant.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Mutex as AsyncMutex;

use super::credentials::{ResourceId, StoredResource};
use super::error::StorageError;

type Records = BTreeMap<ResourceId, StoredResource>;

/// Key-value store of known testers.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Every stored record.
    async fn get_all(&self) -> Result<Vec<StoredResource>, StorageError>;

    /// True if a record with `id` exists.
    async fn is_registered(&self, id: &ResourceId) -> Result<bool, StorageError>;

    /// Inserts or replaces the record keyed by `record.id`.
    async fn save(&self, record: StoredResource) -> Result<(), StorageError>;

    /// Removes the record with `id`; missing ids are ignored.
    async fn delete(&self, id: &ResourceId) -> Result<(), StorageError>;
}

/// JSON-file backed store.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    lock: AsyncMutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: AsyncMutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn run<T, F>(&self, op: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&Path) -> Result<T, StorageError> + Send + 'static,
    {
        let _guard = self.lock.lock().await;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || op(&path))
            .await
            .map_err(|e| StorageError::Worker(e.to_string()))?
    }
}

fn read_records(path: &Path) -> Result<Records, StorageError> {
    match std::fs::read(path) {
        Ok(bytes) if bytes.is_empty() => Ok(Records::new()),
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Records::new()),
        Err(err) => Err(err.into()),
    }
}

fn write_records(path: &Path, records: &Records) -> Result<(), StorageError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, serde_json::to_vec_pretty(records)?)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

#[async_trait]
impl Storage for FileStorage {
    async fn get_all(&self) -> Result<Vec<StoredResource>, StorageError> {
        self.run(|path| Ok(read_records(path)?.into_values().collect()))
            .await
    }

    async fn is_registered(&self, id: &ResourceId) -> Result<bool, StorageError> {
        let id = id.clone();
        self.run(move |path| Ok(read_records(path)?.contains_key(&id)))
            .await
    }

    async fn save(&self, record: StoredResource) -> Result<(), StorageError> {
        self.run(move |path| {
            let mut records = read_records(path)?;
            records.insert(record.id.clone(), record);
            write_records(path, &records)
        })
        .await
    }

    async fn delete(&self, id: &ResourceId) -> Result<(), StorageError> {
        let id = id.clone();
        self.run(move |path| {
            let mut records = read_records(path)?;
            if records.remove(&id).is_some() {
                write_records(path, &records)?;
            }
            Ok(())
        })
        .await
    }
}

/// Volatile store.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    records: Mutex<Records>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get_all(&self) -> Result<Vec<StoredResource>, StorageError> {
        Ok(self.records.lock().values().cloned().collect())
    }

    async fn is_registered(&self, id: &ResourceId) -> Result<bool, StorageError> {
        Ok(self.records.lock().contains_key(id))
    }

    async fn save(&self, record: StoredResource) -> Result<(), StorageError> {
        self.records.lock().insert(record.id.clone(), record);
        Ok(())
    }

    async fn delete(&self, id: &ResourceId) -> Result<(), StorageError> {
        self.records.lock().remove(id);
        Ok(())
    }
}
