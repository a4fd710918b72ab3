// # File Store
//
// File-based implementation of Store with crash recovery.
//
// ## Purpose
//
// Persists zones, records, forward zones and the change log across restarts
// as a single JSON snapshot.
//
// ## Crash Recovery
//
// - Atomic writes: Uses write-then-rename for atomicity
// - Corruption detection: Validates JSON on load
// - Automatic backup: Keeps .backup of last known good state
// - Recovery: Falls back to backup if corruption detected
//
// ## File Format
//
// ```json
// {
//   "version": "1.0",
//   "data": {
//     "zones": { "1": { "name": "example.com", ... } },
//     "records": { ... },
//     "forward_zones": { ... },
//     "change_logs": [ ... ],
//     "sequences": { "zone": 1, "record": 0, "forward_zone": 0, "change_log": 1 }
//   }
// }
// ```

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, RwLock};

use super::dataset::Dataset;
use crate::error::{Error, Result};
use crate::model::{
    ChangeLog, ChangeLogQuery, ForwardZone, ForwardZoneSpec, NewChangeLog, Record, RecordQuery,
    RecordSpec, Zone, ZoneSpec,
};
use crate::traits::Store;

/// State file format version
/// Used for future migration if format changes
const STATE_FILE_VERSION: &str = "1.0";

/// File-based store with crash recovery
///
/// Every mutation is written through to disk before the call returns, and
/// becomes visible to readers only once it is on disk.
///
/// # Example
///
/// ```rust,no_run
/// use dnsync_core::state::FileStore;
/// use dnsync_core::traits::Store;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileStore::open("/var/lib/dnsync/state.json").await?;
///     let zones = store.list_zones().await?;
///     println!("{} zone(s)", zones.len());
///     store.close().await?;
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    /// Last snapshot successfully written to disk
    state: Arc<RwLock<Dataset>>,
    /// Held across apply-write-publish so writers never interleave
    writer: Mutex<()>,
}

/// Serializable state file format
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct StateFileFormat {
    version: String,
    data: Dataset,
}

impl FileStore {
    /// Create or load a file store
    ///
    /// This will:
    /// 1. Create parent directories if needed
    /// 2. Try to load the existing state file
    /// 3. If corruption is detected, try to load from backup
    /// 4. If both fail, start with empty state
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::config(format!(
                    "Failed to create state directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let data = Self::load_state_with_recovery(&path).await?;

        Ok(Self {
            path,
            state: Arc::new(RwLock::new(data)),
            writer: Mutex::new(()),
        })
    }

    /// Load state from file with automatic recovery
    ///
    /// Only parse failures trigger recovery; I/O errors are returned.
    async fn load_state_with_recovery(path: &Path) -> Result<Dataset> {
        let err = match Self::load_state(path).await {
            Ok(data) => {
                tracing::debug!("Loaded state from file: {} rows", data.len());
                return Ok(data);
            }
            Err(err @ Error::Json(_)) => err,
            Err(err) => return Err(err),
        };

        tracing::warn!(
            "State file appears corrupted: {}. Attempting recovery from backup.",
            err
        );

        let backup_path = Self::backup_path(path);
        if !backup_path.exists() {
            tracing::warn!("No backup file found. Starting with empty state.");
            return Ok(Dataset::default());
        }

        match Self::load_state(&backup_path).await {
            Ok(data) => {
                tracing::info!("Recovered state from backup: {} rows", data.len());

                if let Err(restore_err) = Self::restore_from_backup(path, &backup_path).await {
                    tracing::error!("Failed to restore state file from backup: {}", restore_err);
                }

                Ok(data)
            }
            Err(backup_err) => {
                tracing::error!(
                    "Backup also corrupted: {}. Starting with empty state.",
                    backup_err
                );
                Ok(Dataset::default())
            }
        }
    }

    /// Load state from file
    async fn load_state(path: &Path) -> Result<Dataset> {
        if !path.exists() {
            tracing::debug!("State file does not exist: {}", path.display());
            return Ok(Dataset::default());
        }

        let content = fs::read_to_string(path).await.map_err(|e| {
            Error::store(format!("Failed to read state file {}: {}", path.display(), e))
        })?;

        let state_file: StateFileFormat = serde_json::from_str(&content)?;

        if state_file.version != STATE_FILE_VERSION {
            tracing::warn!(
                "State file version mismatch: expected {}, got {}. \
                Attempting to load anyway.",
                STATE_FILE_VERSION,
                state_file.version
            );
        }

        Ok(state_file.data)
    }

    /// Write a snapshot to the state file atomically
    ///
    /// Callers hold the writer lock, so the temp path is never shared.
    async fn write_state(&self, data: &Dataset) -> Result<()> {
        let state_file = StateFileFormat {
            version: STATE_FILE_VERSION.to_string(),
            data: data.clone(),
        };
        let json = serde_json::to_string_pretty(&state_file)?;

        let temp_path = self.temp_path();
        {
            let mut file = fs::File::create(&temp_path).await.map_err(|e| {
                Error::store(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.write_all(json.as_bytes()).await.map_err(|e| {
                Error::store(format!(
                    "Failed to write to temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.flush().await.map_err(|e| {
                Error::store(format!(
                    "Failed to flush temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        if self.path.exists() {
            let backup_path = Self::backup_path(&self.path);
            if let Err(e) = fs::copy(&self.path, &backup_path).await {
                tracing::warn!("Failed to create backup: {}", e);
            }
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::store(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::trace!("State written to file: {}", self.path.display());
        Ok(())
    }

    /// Apply a mutation to a copy of the dataset, write it, then publish it
    ///
    /// Writers are serialized for the whole cycle. A failed write leaves
    /// both the file and the in-memory state untouched.
    async fn mutate<T>(&self, f: impl FnOnce(&mut Dataset) -> Result<T>) -> Result<T> {
        let _writer = self.writer.lock().await;

        let mut next = self.state.read().await.clone();
        let value = f(&mut next)?;

        self.write_state(&next).await?;
        *self.state.write().await = next;
        Ok(value)
    }

    async fn read<T>(&self, f: impl FnOnce(&Dataset) -> T) -> T {
        let state_guard = self.state.read().await;
        f(&state_guard)
    }

    /// Restore state file from backup
    async fn restore_from_backup(path: &Path, backup_path: &Path) -> Result<()> {
        fs::copy(backup_path, path).await.map_err(|e| {
            Error::store(format!(
                "Failed to restore from backup {} to {}: {}",
                backup_path.display(),
                path.display(),
                e
            ))
        })?;

        tracing::info!("Restored state file from backup");
        Ok(())
    }

    /// Get path to temporary file for atomic writes
    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }

    /// Get path to backup file
    fn backup_path(path: &Path) -> PathBuf {
        let mut backup = path.to_path_buf();
        backup.set_extension("backup");
        backup
    }

    /// Path of the state file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Store for FileStore {
    async fn insert_zone(&self, spec: ZoneSpec) -> Result<Zone> {
        self.mutate(|data| data.insert_zone(spec)).await
    }

    async fn update_zone(&self, zone: &Zone) -> Result<()> {
        self.mutate(|data| data.update_zone(zone)).await
    }

    async fn delete_zone(&self, id: u64) -> Result<()> {
        self.mutate(|data| data.delete_zone(id)).await
    }

    async fn get_zone(&self, id: u64) -> Result<Option<Zone>> {
        Ok(self.read(|data| data.get_zone(id)).await)
    }

    async fn find_zone_by_name(&self, name: &str) -> Result<Option<Zone>> {
        Ok(self.read(|data| data.find_zone_by_name(name)).await)
    }

    async fn list_zones(&self) -> Result<Vec<Zone>> {
        Ok(self.read(Dataset::list_zones).await)
    }

    async fn count_zone_records(&self, zone_id: u64) -> Result<usize> {
        Ok(self.read(|data| data.count_zone_records(zone_id)).await)
    }

    async fn insert_record(&self, spec: RecordSpec) -> Result<Record> {
        self.mutate(|data| data.insert_record(spec)).await
    }

    async fn update_record(&self, record: &Record, expected_version: u64) -> Result<Record> {
        self.mutate(|data| data.update_record(record, expected_version))
            .await
    }

    async fn delete_record(&self, id: u64) -> Result<()> {
        self.mutate(|data| data.delete_record(id)).await
    }

    async fn get_record(&self, id: u64) -> Result<Option<Record>> {
        Ok(self.read(|data| data.get_record(id)).await)
    }

    async fn list_records(&self, query: &RecordQuery) -> Result<Vec<Record>> {
        Ok(self.read(|data| data.list_records(query)).await)
    }

    async fn insert_forward_zone(&self, spec: ForwardZoneSpec) -> Result<ForwardZone> {
        self.mutate(|data| data.insert_forward_zone(spec)).await
    }

    async fn update_forward_zone(&self, zone: &ForwardZone) -> Result<()> {
        self.mutate(|data| data.update_forward_zone(zone)).await
    }

    async fn delete_forward_zone(&self, id: u64) -> Result<()> {
        self.mutate(|data| data.delete_forward_zone(id)).await
    }

    async fn get_forward_zone(&self, id: u64) -> Result<Option<ForwardZone>> {
        Ok(self.read(|data| data.get_forward_zone(id)).await)
    }

    async fn find_forward_zone_by_name(&self, name: &str) -> Result<Option<ForwardZone>> {
        Ok(self.read(|data| data.find_forward_zone_by_name(name)).await)
    }

    async fn list_forward_zones(&self) -> Result<Vec<ForwardZone>> {
        Ok(self.read(Dataset::list_forward_zones).await)
    }

    async fn append_change_log(&self, entry: NewChangeLog) -> Result<ChangeLog> {
        self.mutate(|data| Ok(data.append_change_log(entry))).await
    }

    async fn list_change_logs(&self, query: &ChangeLogQuery) -> Result<Vec<ChangeLog>> {
        Ok(self.read(|data| data.list_change_logs(query)).await)
    }

    /// Every mutation is written through; this only waits for an in-flight write
    async fn flush(&self) -> Result<()> {
        let _writer = self.writer.lock().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RecordRequest, ZoneRequest};
    use tempfile::tempdir;

    fn zone_spec(name: &str) -> ZoneSpec {
        ZoneRequest::new(name, "10.0.0.53", 53).validate().unwrap()
    }

    #[tokio::test]
    async fn test_file_store_persists_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");

        let store = FileStore::open(&path).await.unwrap();
        assert!(store.list_zones().await.unwrap().is_empty());

        let zone = store.insert_zone(zone_spec("example.com")).await.unwrap();
        let record = store
            .insert_record(RecordRequest::new(zone.id, "www", "A", "10.0.0.1").validate().unwrap())
            .await
            .unwrap();
        store.close().await.unwrap();

        assert!(path.exists());

        let reopened = FileStore::open(&path).await.unwrap();
        assert_eq!(reopened.get_zone(zone.id).await.unwrap(), Some(zone));
        assert_eq!(reopened.get_record(record.id).await.unwrap(), Some(record));

        // Sequences survive the reopen, so ids are never reused
        let second = reopened.insert_zone(zone_spec("example.net")).await.unwrap();
        assert_eq!(second.id, 2);
    }

    #[tokio::test]
    async fn test_file_store_corruption_recovery() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");

        let store = FileStore::open(&path).await.unwrap();
        store.insert_zone(zone_spec("example.com")).await.unwrap();
        // Second write makes the backup hold the first snapshot
        store.insert_zone(zone_spec("example.net")).await.unwrap();

        let backup_path = FileStore::backup_path(&path);
        assert!(backup_path.exists(), "Backup file should exist after write");

        fs::write(&path, b"corrupted json data").await.unwrap();

        let recovered = FileStore::open(&path).await.unwrap();
        let zones = recovered.list_zones().await.unwrap();
        assert_eq!(zones.len(), 1, "Backup should contain previous state, not latest");
        assert_eq!(zones[0].name, "example.com");
    }

    #[tokio::test]
    async fn test_file_store_keeps_tsig_secret_on_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");

        let store = FileStore::open(&path).await.unwrap();
        let spec = ZoneRequest::new("example.com", "10.0.0.53", 53)
            .with_tsig("hmac-sha256", "ddns-key", "c2VjcmV0")
            .validate()
            .unwrap();
        let zone = store.insert_zone(spec).await.unwrap();

        let reopened = FileStore::open(&path).await.unwrap();
        let stored = reopened.get_zone(zone.id).await.unwrap().unwrap();
        assert_eq!(stored.tsig_secret, "c2VjcmV0");
    }

    #[tokio::test]
    async fn test_concurrent_writers_all_persist() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        let store = Arc::new(FileStore::open(&path).await.unwrap());

        let mut handles = Vec::new();
        for i in 0..32 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.insert_zone(zone_spec(&format!("zone{}.example.com", i))).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.list_zones().await.unwrap().len(), 32);
        let reopened = FileStore::open(&path).await.unwrap();
        assert_eq!(reopened.list_zones().await.unwrap().len(), 32);
    }

    #[tokio::test]
    async fn test_failed_write_leaves_state_untouched() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        let store = FileStore::open(&path).await.unwrap();
        store.insert_zone(zone_spec("example.com")).await.unwrap();

        // A directory squatting on the temp path makes the next write fail
        fs::create_dir(store.temp_path()).await.unwrap();

        let err = store.insert_zone(zone_spec("example.net")).await.unwrap_err();
        assert!(matches!(err, Error::Store(_)));
        let zones = store.list_zones().await.unwrap();
        assert_eq!(zones.len(), 1);
        assert!(store.find_zone_by_name("example.net").await.unwrap().is_none());

        fs::remove_dir(store.temp_path()).await.unwrap();
        let retried = store.insert_zone(zone_spec("example.net")).await.unwrap();
        assert_eq!(retried.id, 2, "the failed insert did not consume an id");
    }
}
