//! Paper lifecycle over a [`Store`] engine.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::models::{Paper, PaperMeta};

use super::{LegacySource, Partition, Store, WriteBatch};

/// Result of [`PaperStore::migrate_legacy`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Papers written into the partitioned engine.
    pub migrated: usize,
    /// True when the migration already ran on this handle and was skipped.
    pub skipped: bool,
}

/// Durable CRUD over [`Paper`]s with the PDF bytes kept out of the
/// metadata partition.
///
/// Every operation takes the target id or record explicitly. A handle
/// represents one session: [`migrate_legacy`](PaperStore::migrate_legacy)
/// scans the legacy source at most once per handle.
pub struct PaperStore<S> {
    engine: S,
    migrated: AtomicBool,
}

impl<S: Store> PaperStore<S> {
    pub fn new(engine: S) -> Self {
        Self {
            engine,
            migrated: AtomicBool::new(false),
        }
    }

    pub fn engine(&self) -> &S {
        &self.engine
    }

    /// Create or overwrite a paper.
    ///
    /// With a payload, the binary record and the stripped metadata record
    /// (`hasFile = true`) are committed in one batch. Without one, the
    /// metadata record is written and any stale binary record for the id
    /// is removed in the same batch.
    pub async fn put(&self, paper: &Paper) -> Result<(), StoreError> {
        let id = paper.id.clone();
        let (meta, file) = paper.clone().into_records();
        let mut batch = WriteBatch::new();
        match file {
            Some(file) => {
                batch.put_file(file).put_meta(meta);
            }
            None => {
                batch.put_meta(meta).delete(Partition::Files, id.as_str());
            }
        }
        self.engine.commit(batch).await?;
        debug!(id = %id, has_file = paper.has_file(), "paper saved");
        Ok(())
    }

    /// Load one paper with its payload reattached.
    pub async fn get(&self, id: &str) -> Result<Paper, StoreError> {
        let meta = self
            .engine
            .get_meta(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        self.join(meta).await
    }

    /// Load every paper, unordered. Sorting is up to the caller
    /// (see [`crate::library::sort_by_date`]).
    pub async fn get_all(&self) -> Result<Vec<Paper>, StoreError> {
        let metas = self.engine.all_meta().await?;
        let mut papers = Vec::with_capacity(metas.len());
        for meta in metas {
            papers.push(self.join(meta).await?);
        }
        Ok(papers)
    }

    /// Remove a paper from both partitions. Unknown ids are a no-op.
    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut batch = WriteBatch::new();
        batch
            .delete(Partition::Files, id)
            .delete(Partition::Papers, id);
        self.engine.commit(batch).await?;
        debug!(id = %id, "paper deleted");
        Ok(())
    }

    /// Load a paper, apply `change`, and save it back.
    ///
    /// Used for partial field merges such as replacing the summary while
    /// leaving sections and payload untouched. Returns the saved paper.
    pub async fn update<F>(&self, id: &str, change: F) -> Result<Paper, StoreError>
    where
        F: FnOnce(&mut Paper),
    {
        let mut paper = self.get(id).await?;
        change(&mut paper);
        paper.id = id.to_string();
        self.put(&paper).await?;
        Ok(paper)
    }

    /// Move papers from the legacy flat collection into the partitioned
    /// engine, then clear the legacy collection.
    ///
    /// Each legacy paper goes through [`put`](PaperStore::put). The source
    /// is cleared only after every paper was written, so an interrupted
    /// run is simply repeated on the next start. Runs at most once per
    /// handle; later calls report `skipped`.
    pub async fn migrate_legacy(
        &self,
        legacy: &dyn LegacySource,
    ) -> Result<MigrationReport, StoreError> {
        if self.migrated.load(Ordering::Acquire) {
            return Ok(MigrationReport {
                migrated: 0,
                skipped: true,
            });
        }

        let mut report = MigrationReport::default();
        if let Some(papers) = legacy.load()? {
            for paper in &papers {
                self.put(paper).await?;
                report.migrated += 1;
            }
            legacy.clear()?;
            info!(migrated = report.migrated, "legacy papers migrated");
        }

        self.migrated.store(true, Ordering::Release);
        Ok(report)
    }

    async fn join(&self, meta: PaperMeta) -> Result<Paper, StoreError> {
        if !meta.has_file {
            return Ok(Paper::from_records(meta, None));
        }
        let file = self.engine.get_file(&meta.id).await?;
        if file.is_none() {
            warn!(id = %meta.id, "metadata claims a file but none is stored; treating as no file");
        }
        Ok(Paper::from_records(meta, file))
    }
}
