//! In-memory [`Store`] and [`LegacySource`] implementations for testing
//! and WASM targets.
//!
//! Both partitions are `HashMap`s behind one `std::sync::RwLock`, so a
//! batch is applied under a single write guard and is atomic by
//! construction.

use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::{FileRecord, Paper, PaperMeta};

use super::{LegacySource, Partition, Store, WriteBatch, WriteOp};

#[derive(Default)]
struct Partitions {
    papers: HashMap<String, PaperMeta>,
    files: HashMap<String, Vec<u8>>,
}

/// In-memory engine for testing and WASM environments.
#[derive(Default)]
pub struct InMemoryStore {
    inner: RwLock<Partitions>,
    fail_commits: RwLock<bool>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent [`Store::commit`] fail with [`StoreError::Io`].
    pub fn fail_commits(&self, fail: bool) {
        *self.fail_commits.write().unwrap() = fail;
    }

    /// Number of records currently held in `partition`.
    pub fn len(&self, partition: Partition) -> usize {
        let inner = self.inner.read().unwrap();
        match partition {
            Partition::Papers => inner.papers.len(),
            Partition::Files => inner.files.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len(Partition::Papers) == 0 && self.len(Partition::Files) == 0
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn get_meta(&self, id: &str) -> Result<Option<PaperMeta>, StoreError> {
        Ok(self.inner.read().unwrap().papers.get(id).cloned())
    }

    async fn all_meta(&self) -> Result<Vec<PaperMeta>, StoreError> {
        Ok(self.inner.read().unwrap().papers.values().cloned().collect())
    }

    async fn get_file(&self, id: &str) -> Result<Option<FileRecord>, StoreError> {
        Ok(self
            .inner
            .read()
            .unwrap()
            .files
            .get(id)
            .map(|data| FileRecord {
                id: id.to_string(),
                data: data.clone(),
            }))
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        if *self.fail_commits.read().unwrap() {
            return Err(StoreError::Io("commit rejected".to_string()));
        }
        let mut inner = self.inner.write().unwrap();
        for op in batch.into_ops() {
            match op {
                WriteOp::PutMeta(meta) => {
                    inner.papers.insert(meta.id.clone(), meta);
                }
                WriteOp::PutFile(file) => {
                    inner.files.insert(file.id, file.data);
                }
                WriteOp::Delete(Partition::Papers, id) => {
                    inner.papers.remove(&id);
                }
                WriteOp::Delete(Partition::Files, id) => {
                    inner.files.remove(&id);
                }
            }
        }
        Ok(())
    }
}

/// Legacy collection held in memory.
#[derive(Default)]
pub struct MemoryLegacy {
    papers: Mutex<Option<Vec<Paper>>>,
}

impl MemoryLegacy {
    pub fn new(papers: Vec<Paper>) -> Self {
        Self {
            papers: Mutex::new(Some(papers)),
        }
    }

    pub fn is_present(&self) -> bool {
        self.papers.lock().unwrap().is_some()
    }
}

impl LegacySource for MemoryLegacy {
    fn load(&self) -> Result<Option<Vec<Paper>>, StoreError> {
        Ok(self.papers.lock().unwrap().clone())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.papers.lock().unwrap() = None;
        Ok(())
    }
}
