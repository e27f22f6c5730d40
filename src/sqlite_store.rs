//! SQLite-backed [`Store`] engine.
//!
//! The metadata partition is the `papers` table (one JSON record per row),
//! the binary partition is the `files` table. A [`WriteBatch`] is applied
//! inside a single transaction.

use anyhow::Result;
use async_trait::async_trait;
use paper_digest_core::models::{FileRecord, PaperMeta};
use paper_digest_core::store::{Store, WriteBatch, WriteOp};
use paper_digest_core::store::MigrationReport;
use paper_digest_core::{PaperStore, StoreError};
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::config::Config;
use crate::legacy::JsonFileLegacy;
use crate::{db, migrate};

fn io_err(e: sqlx::Error) -> StoreError {
    StoreError::Io(e.to_string())
}

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn get_meta(&self, id: &str) -> Result<Option<PaperMeta>, StoreError> {
        let row = sqlx::query("SELECT record_json FROM papers WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(io_err)?;

        match row {
            Some(row) => {
                let json: String = row.get("record_json");
                Ok(Some(serde_json::from_str(&json)?))
            }
            None => Ok(None),
        }
    }

    async fn all_meta(&self) -> Result<Vec<PaperMeta>, StoreError> {
        let rows = sqlx::query("SELECT record_json FROM papers")
            .fetch_all(&self.pool)
            .await
            .map_err(io_err)?;

        rows.iter()
            .map(|row| {
                let json: String = row.get("record_json");
                serde_json::from_str(&json).map_err(StoreError::from)
            })
            .collect()
    }

    async fn get_file(&self, id: &str) -> Result<Option<FileRecord>, StoreError> {
        let row = sqlx::query("SELECT id, data FROM files WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(io_err)?;

        Ok(row.map(|row| FileRecord {
            id: row.get("id"),
            data: row.get("data"),
        }))
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        if batch.is_empty() {
            return Ok(());
        }
        let ops = batch.into_ops();
        let count = ops.len();
        let mut tx = self.pool.begin().await.map_err(io_err)?;

        for op in ops {
            match op {
                WriteOp::PutMeta(meta) => {
                    let json = serde_json::to_string(&meta)?;
                    sqlx::query(
                        "INSERT INTO papers (id, record_json) VALUES (?, ?)
                         ON CONFLICT(id) DO UPDATE SET record_json = excluded.record_json",
                    )
                    .bind(&meta.id)
                    .bind(&json)
                    .execute(&mut *tx)
                    .await
                    .map_err(io_err)?;
                }
                WriteOp::PutFile(file) => {
                    sqlx::query(
                        "INSERT INTO files (id, data) VALUES (?, ?)
                         ON CONFLICT(id) DO UPDATE SET data = excluded.data",
                    )
                    .bind(&file.id)
                    .bind(&file.data)
                    .execute(&mut *tx)
                    .await
                    .map_err(io_err)?;
                }
                WriteOp::Delete(partition, id) => {
                    let sql = format!("DELETE FROM {} WHERE id = ?", partition.name());
                    sqlx::query(&sql)
                        .bind(&id)
                        .execute(&mut *tx)
                        .await
                        .map_err(io_err)?;
                }
            }
        }

        tx.commit().await.map_err(io_err)?;
        debug!(ops = count, "batch committed");
        Ok(())
    }
}

/// Open the configured database with its schema in place.
pub async fn connect_store(config: &Config) -> Result<PaperStore<SqliteStore>> {
    let pool = db::connect(config).await?;
    migrate::migrate_pool(&pool).await?;
    Ok(PaperStore::new(SqliteStore::new(pool)))
}

/// Drain the configured legacy collection, if any, into `store`.
pub async fn migrate_configured_legacy(
    store: &PaperStore<SqliteStore>,
    config: &Config,
) -> Result<MigrationReport> {
    match &config.legacy.path {
        Some(path) => Ok(store.migrate_legacy(&JsonFileLegacy::new(path)).await?),
        None => Ok(MigrationReport::default()),
    }
}

/// Open the configured database as a [`PaperStore`].
///
/// Runs the schema migration, then the legacy migration, so every later
/// store operation sees migrated data.
pub async fn open(config: &Config) -> Result<PaperStore<SqliteStore>> {
    let store = connect_store(config).await?;
    migrate_configured_legacy(&store, config).await?;
    Ok(store)
}
