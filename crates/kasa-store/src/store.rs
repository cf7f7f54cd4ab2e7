//! # Store
//!
//! The single-file JSON database behind every repository.
//!
//! ## Design
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              Store                                      │
//! │                                                                         │
//! │   open(path) ──▶ read file ──▶ Database (in memory, RwLock)             │
//! │                                                                         │
//! │   every mutation:                                                       │
//! │     1. acquire write lock                                               │
//! │     2. check-then-mutate (no partial writes on failure)                 │
//! │     3. serialize whole Database                                         │
//! │     4. write <path>.tmp, rename over <path>                             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The rename in step 4 is atomic on POSIX filesystems, so a crash mid-flush
//! leaves the previous file intact.
//!
//! Mutation closures MUST validate before touching the database: a closure
//! that mutates and then fails leaves the in-memory state ahead of disk.
//! Every repository in this crate follows that contract.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use kasa_core::{
    AutomationRule, Customer, CustomerNote, CustomerReminder, MessageHistoryEntry,
    MessageTemplate, Product, Sale, SaleItem, Settings,
};

use crate::error::{StoreError, StoreResult};

// =============================================================================
// Database Document
// =============================================================================

/// The entire on-disk document. Every collection defaults to empty so older
/// files (or a brand-new install) load without ceremony.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Database {
    pub products: Vec<Product>,
    pub customers: Vec<Customer>,
    pub sales: Vec<Sale>,
    pub sale_items: Vec<SaleItem>,
    pub customer_notes: Vec<CustomerNote>,
    pub customer_reminders: Vec<CustomerReminder>,
    pub message_templates: Vec<MessageTemplate>,
    pub message_history: Vec<MessageHistoryEntry>,
    pub automation_rules: Vec<AutomationRule>,
    pub settings: Settings,
}

// =============================================================================
// Store
// =============================================================================

#[derive(Debug)]
struct StoreInner {
    path: PathBuf,
    db: RwLock<Database>,
}

/// Handle to the database. Cheap to clone; all clones share the same
/// in-memory state and file.
#[derive(Debug, Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

impl Store {
    /// Opens the database at `path`, creating an empty one if the file does
    /// not exist yet. A file that exists but fails to parse is an error -
    /// silently replacing it would destroy data.
    pub async fn open(path: impl Into<PathBuf>) -> StoreResult<Store> {
        let path = path.into();

        let db = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "database file not found, starting empty");
                Database::default()
            }
            Err(err) => return Err(err.into()),
        };

        info!(
            path = %path.display(),
            products = db.products.len(),
            customers = db.customers.len(),
            sales = db.sales.len(),
            "database opened"
        );

        Ok(Store {
            inner: Arc::new(StoreInner {
                path,
                db: RwLock::new(db),
            }),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Runs a read-only closure against the database.
    pub(crate) async fn read<R>(&self, f: impl FnOnce(&Database) -> R) -> R {
        let db = self.inner.db.read().await;
        f(&db)
    }

    /// Runs a mutation closure and, if it succeeds, flushes the whole
    /// database to disk before releasing the write lock.
    pub(crate) async fn mutate<R>(
        &self,
        f: impl FnOnce(&mut Database) -> StoreResult<R>,
    ) -> StoreResult<R> {
        let mut db = self.inner.db.write().await;
        let result = f(&mut db)?;
        self.flush(&db).await?;
        Ok(result)
    }

    /// Serializes `db` and writes it via temp-file + rename.
    async fn flush(&self, db: &Database) -> StoreResult<()> {
        let bytes = serde_json::to_vec_pretty(db)?;
        write_atomic(&self.inner.path, &bytes).await?;
        debug!(path = %self.inner.path.display(), bytes = bytes.len(), "database flushed");
        Ok(())
    }

    /// Serializes the current database state (used by backups).
    pub(crate) async fn snapshot_bytes(&self) -> StoreResult<Vec<u8>> {
        let db = self.inner.db.read().await;
        Ok(serde_json::to_vec_pretty(&*db)?)
    }

    /// Replaces the entire database with `db` and flushes (used by restore).
    pub(crate) async fn replace(&self, new_db: Database) -> StoreResult<()> {
        let mut db = self.inner.db.write().await;
        *db = new_db;
        self.flush(&db).await
    }
}

/// Writes `bytes` to `path` through a sibling temp file and an atomic rename.
pub(crate) async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), std::io::Error> {
    let tmp = tmp_path(path);
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Generates a fresh UUID v4 string, the ID format for every record.
pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Shared helper for lookup-by-id misses.
pub(crate) fn not_found(entity: &'static str, id: &str) -> StoreError {
    StoreError::not_found(entity, id)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn db_path(dir: &tempfile::TempDir) -> PathBuf {
        dir.path().join("kasa.json")
    }

    #[tokio::test]
    async fn open_missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(db_path(&dir)).await.unwrap();
        let count = store.read(|db| db.products.len()).await;
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn open_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = db_path(&dir);
        std::fs::write(&path, b"{not json").unwrap();
        let err = Store::open(&path).await.unwrap_err();
        assert!(matches!(err, StoreError::Json(_)));
    }

    #[tokio::test]
    async fn mutation_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = db_path(&dir);

        let store = Store::open(&path).await.unwrap();
        store
            .mutate(|db| {
                db.settings.store_name = "Şok Market".to_string();
                Ok(())
            })
            .await
            .unwrap();
        drop(store);

        let reopened = Store::open(&path).await.unwrap();
        let name = reopened.read(|db| db.settings.store_name.clone()).await;
        assert_eq!(name, "Şok Market");
    }

    #[tokio::test]
    async fn failed_mutation_does_not_flush() {
        let dir = tempfile::tempdir().unwrap();
        let path = db_path(&dir);

        let store = Store::open(&path).await.unwrap();
        store.mutate(|_| Ok(())).await.unwrap();
        let before = std::fs::read(&path).unwrap();

        let result: StoreResult<()> = store
            .mutate(|_| Err(StoreError::not_found("product", "missing")))
            .await;
        assert!(result.is_err());

        let after = std::fs::read(&path).unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn no_temp_file_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = db_path(&dir);

        let store = Store::open(&path).await.unwrap();
        store.mutate(|_| Ok(())).await.unwrap();

        assert!(path.exists());
        assert!(!tmp_path(&path).exists());
    }
}
