//! Storage abstraction for Paper Digest.
//!
//! The [`Store`] trait is the key-value engine underneath the paper
//! store: two named partitions (`papers` for metadata records, `files` for
//! PDF bytes), each a mapping from string id to record. Writes go through
//! a [`WriteBatch`] that the engine must apply atomically, so a metadata
//! record never claims a file that was not written.
//!
//! [`PaperStore`] layers the paper lifecycle (split write, joined read,
//! delete, legacy migration) on top of any engine. Backends:
//!
//! | Engine | Crate |
//! |--------|-------|
//! | [`memory::InMemoryStore`] | this crate (tests, WASM) |
//! | `SqliteStore` | `paper-digest` (native CLI) |
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;
mod paper;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::{FileRecord, Paper, PaperMeta};

pub use paper::{MigrationReport, PaperStore};

/// Named partition of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Partition {
    /// Paper metadata records.
    Papers,
    /// Original PDF bytes, keyed by paper id.
    Files,
}

impl Partition {
    pub fn name(&self) -> &'static str {
        match self {
            Partition::Papers => "papers",
            Partition::Files => "files",
        }
    }
}

/// A single write inside a [`WriteBatch`].
#[derive(Debug, Clone)]
pub enum WriteOp {
    PutMeta(PaperMeta),
    PutFile(FileRecord),
    Delete(Partition, String),
}

/// Writes that must land together or not at all.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_meta(&mut self, meta: PaperMeta) -> &mut Self {
        self.ops.push(WriteOp::PutMeta(meta));
        self
    }

    pub fn put_file(&mut self, file: FileRecord) -> &mut Self {
        self.ops.push(WriteOp::PutFile(file));
        self
    }

    pub fn delete(&mut self, partition: Partition, id: impl Into<String>) -> &mut Self {
        self.ops.push(WriteOp::Delete(partition, id.into()));
        self
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Abstract key-value engine with a metadata and a binary partition.
///
/// All operations are async (via `async-trait`) so the same trait fits a
/// native SQLite pool and a browser database. In-memory implementations
/// return immediately-ready futures.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`get_meta`](Store::get_meta) | Read one metadata record |
/// | [`all_meta`](Store::all_meta) | Read every metadata record (unordered) |
/// | [`get_file`](Store::get_file) | Read one binary record |
/// | [`commit`](Store::commit) | Apply a batch of writes atomically |
#[async_trait]
pub trait Store: Send + Sync {
    /// Read the metadata record for `id`, if any.
    async fn get_meta(&self, id: &str) -> Result<Option<PaperMeta>, StoreError>;

    /// Read every metadata record. Order is unspecified.
    async fn all_meta(&self) -> Result<Vec<PaperMeta>, StoreError>;

    /// Read the binary record for `id`, if any.
    async fn get_file(&self, id: &str) -> Result<Option<FileRecord>, StoreError>;

    /// Apply every write in `batch`, or none of them.
    ///
    /// Deleting an id that does not exist is not an error.
    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError>;
}

/// Source of papers saved by the older single-key format.
///
/// The legacy format kept every paper, PDF bytes included, in one flat
/// collection. [`PaperStore::migrate_legacy`] drains it into the
/// partitioned engine and then calls [`clear`](LegacySource::clear).
pub trait LegacySource: Send + Sync {
    /// Load the collection, or `None` when there is no legacy data.
    fn load(&self) -> Result<Option<Vec<Paper>>, StoreError>;

    /// Remove the collection. Called only after every paper was written.
    fn clear(&self) -> Result<(), StoreError>;
}
