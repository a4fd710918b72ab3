// # Memory Store
//
// In-memory implementation of Store.
//
// ## Purpose
//
// Provides a simple, fast store that doesn't persist across restarts.
// Useful for testing and for dry-run walkthroughs.
//
// ## Crash Behavior
//
// - All zones, records and change-log rows are lost on restart/crash
// - No recovery possible (state is in-memory only)

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::dataset::Dataset;
use crate::error::Result;
use crate::model::{
    ChangeLog, ChangeLogQuery, ForwardZone, ForwardZoneSpec, NewChangeLog, Record, RecordQuery,
    RecordSpec, Zone, ZoneSpec,
};
use crate::traits::Store;

/// In-memory store implementation
///
/// This implementation keeps all tables in a [`Dataset`] protected by a RwLock.
/// Clones share the same tables.
///
/// # Example
///
/// ```rust,no_run
/// use dnsync_core::model::ZoneRequest;
/// use dnsync_core::state::MemoryStore;
/// use dnsync_core::traits::Store;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryStore::new();
///
///     let spec = ZoneRequest::new("example.com", "10.0.0.53", 53).validate()?;
///     let zone = store.insert_zone(spec).await?;
///
///     assert!(store.get_zone(zone.id).await?.is_some());
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Dataset>>,
}

impl MemoryStore {
    /// Create a new empty memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of rows across all tables
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_zone(&self, spec: ZoneSpec) -> Result<Zone> {
        self.inner.write().await.insert_zone(spec)
    }

    async fn update_zone(&self, zone: &Zone) -> Result<()> {
        self.inner.write().await.update_zone(zone)
    }

    async fn delete_zone(&self, id: u64) -> Result<()> {
        self.inner.write().await.delete_zone(id)
    }

    async fn get_zone(&self, id: u64) -> Result<Option<Zone>> {
        Ok(self.inner.read().await.get_zone(id))
    }

    async fn find_zone_by_name(&self, name: &str) -> Result<Option<Zone>> {
        Ok(self.inner.read().await.find_zone_by_name(name))
    }

    async fn list_zones(&self) -> Result<Vec<Zone>> {
        Ok(self.inner.read().await.list_zones())
    }

    async fn count_zone_records(&self, zone_id: u64) -> Result<usize> {
        Ok(self.inner.read().await.count_zone_records(zone_id))
    }

    async fn insert_record(&self, spec: RecordSpec) -> Result<Record> {
        self.inner.write().await.insert_record(spec)
    }

    async fn update_record(&self, record: &Record, expected_version: u64) -> Result<Record> {
        self.inner.write().await.update_record(record, expected_version)
    }

    async fn delete_record(&self, id: u64) -> Result<()> {
        self.inner.write().await.delete_record(id)
    }

    async fn get_record(&self, id: u64) -> Result<Option<Record>> {
        Ok(self.inner.read().await.get_record(id))
    }

    async fn list_records(&self, query: &RecordQuery) -> Result<Vec<Record>> {
        Ok(self.inner.read().await.list_records(query))
    }

    async fn insert_forward_zone(&self, spec: ForwardZoneSpec) -> Result<ForwardZone> {
        self.inner.write().await.insert_forward_zone(spec)
    }

    async fn update_forward_zone(&self, zone: &ForwardZone) -> Result<()> {
        self.inner.write().await.update_forward_zone(zone)
    }

    async fn delete_forward_zone(&self, id: u64) -> Result<()> {
        self.inner.write().await.delete_forward_zone(id)
    }

    async fn get_forward_zone(&self, id: u64) -> Result<Option<ForwardZone>> {
        Ok(self.inner.read().await.get_forward_zone(id))
    }

    async fn find_forward_zone_by_name(&self, name: &str) -> Result<Option<ForwardZone>> {
        Ok(self.inner.read().await.find_forward_zone_by_name(name))
    }

    async fn list_forward_zones(&self) -> Result<Vec<ForwardZone>> {
        Ok(self.inner.read().await.list_forward_zones())
    }

    async fn append_change_log(&self, entry: NewChangeLog) -> Result<ChangeLog> {
        Ok(self.inner.write().await.append_change_log(entry))
    }

    async fn list_change_logs(&self, query: &ChangeLogQuery) -> Result<Vec<ChangeLog>> {
        Ok(self.inner.read().await.list_change_logs(query))
    }

    async fn flush(&self) -> Result<()> {
        // No-op for memory store (everything is already "persisted")
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ForwardZoneRequest, RecordRequest, ZoneRequest};

    #[tokio::test]
    async fn test_memory_store_basic() {
        let store = MemoryStore::new();
        assert!(store.is_empty().await);

        let zone = store
            .insert_zone(ZoneRequest::new("example.com", "10.0.0.53", 53).validate().unwrap())
            .await
            .unwrap();
        let record = store
            .insert_record(RecordRequest::new(zone.id, "www", "A", "10.0.0.1").validate().unwrap())
            .await
            .unwrap();

        assert_eq!(store.len().await, 2);
        assert_eq!(store.count_zone_records(zone.id).await.unwrap(), 1);
        assert_eq!(store.get_record(record.id).await.unwrap(), Some(record.clone()));

        store.delete_record(record.id).await.unwrap();
        assert_eq!(store.count_zone_records(zone.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let store = MemoryStore::new();
        let other = store.clone();

        store
            .insert_forward_zone(
                ForwardZoneRequest::new("corp.internal", ["10.1.0.1"])
                    .validate()
                    .unwrap(),
            )
            .await
            .unwrap();

        let found = other.find_forward_zone_by_name("corp.internal").await.unwrap();
        assert!(found.is_some());
    }
}
