//! Backup snapshots.
//!
//! A backup is the full database serialized to
//! `backup-YYYYMMDD-HHMMSS.json` inside a backup directory. Creating one
//! prunes the directory down to the newest [`BACKUP_RETENTION`] files.
//! Restore parses the named file first and only then replaces the live
//! database, so a corrupt backup never destroys current data.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{StoreError, StoreResult};
use crate::store::{write_atomic, Database, Store};

/// How many snapshot files to keep; older ones are deleted on creation.
pub const BACKUP_RETENTION: usize = 10;

const BACKUP_PREFIX: &str = "backup-";
const BACKUP_SUFFIX: &str = ".json";

/// Metadata for one snapshot file.
#[derive(Debug, Clone, Serialize)]
pub struct BackupInfo {
    /// File name, e.g. `backup-20250314-181500.json`.
    pub file_name: String,
    /// Size on disk in bytes.
    pub size_bytes: u64,
}

impl Store {
    /// Writes a snapshot of the current database into `dir` and prunes old
    /// snapshots beyond the retention count. Returns the new file's info.
    pub async fn create_backup(&self, dir: &Path) -> StoreResult<BackupInfo> {
        tokio::fs::create_dir_all(dir).await?;

        let bytes = self.snapshot_bytes().await?;
        let file_name = format!(
            "{BACKUP_PREFIX}{}{BACKUP_SUFFIX}",
            Utc::now().format("%Y%m%d-%H%M%S")
        );
        let path = dir.join(&file_name);
        write_atomic(&path, &bytes).await?;
        info!(file = %file_name, bytes = bytes.len(), "backup created");

        prune_old_backups(dir).await?;

        Ok(BackupInfo {
            file_name,
            size_bytes: bytes.len() as u64,
        })
    }

    /// Lists snapshot files in `dir`, newest first. A missing directory is
    /// just an empty list.
    pub async fn list_backups(&self, dir: &Path) -> StoreResult<Vec<BackupInfo>> {
        let mut backups = Vec::new();
        for (name, path) in backup_files(dir).await? {
            let meta = tokio::fs::metadata(&path).await?;
            backups.push(BackupInfo {
                file_name: name,
                size_bytes: meta.len(),
            });
        }
        Ok(backups)
    }

    /// Replaces the live database with the named snapshot.
    pub async fn restore_backup(&self, dir: &Path, file_name: &str) -> StoreResult<()> {
        let path = resolve_backup(dir, file_name)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::BackupNotFound(file_name.to_string()));
            }
            Err(err) => return Err(err.into()),
        };

        // Parse before touching anything live.
        let db: Database = serde_json::from_slice(&bytes)?;
        self.replace(db).await?;
        warn!(file = file_name, "database restored from backup");
        Ok(())
    }

    /// Deletes one snapshot file.
    pub async fn delete_backup(&self, dir: &Path, file_name: &str) -> StoreResult<()> {
        let path = resolve_backup(dir, file_name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                info!(file = file_name, "backup deleted");
                Ok(())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::BackupNotFound(file_name.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// Rejects names that are not plain snapshot file names (path traversal).
fn resolve_backup(dir: &Path, file_name: &str) -> StoreResult<PathBuf> {
    let is_plain = !file_name.contains('/') && !file_name.contains('\\');
    if is_plain && file_name.starts_with(BACKUP_PREFIX) && file_name.ends_with(BACKUP_SUFFIX) {
        Ok(dir.join(file_name))
    } else {
        Err(StoreError::BackupNotFound(file_name.to_string()))
    }
}

/// Snapshot files in `dir` sorted newest first (the timestamped names sort
/// lexicographically).
async fn backup_files(dir: &Path) -> StoreResult<Vec<(String, PathBuf)>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err.into()),
    };

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if let Ok(name) = entry.file_name().into_string() {
            if name.starts_with(BACKUP_PREFIX) && name.ends_with(BACKUP_SUFFIX) {
                files.push((name, entry.path()));
            }
        }
    }
    files.sort_by(|a, b| b.0.cmp(&a.0));
    Ok(files)
}

async fn prune_old_backups(dir: &Path) -> StoreResult<()> {
    let files = backup_files(dir).await?;
    for (name, path) in files.into_iter().skip(BACKUP_RETENTION) {
        tokio::fs::remove_file(&path).await?;
        info!(file = %name, "old backup pruned");
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
