// # Store Trait
//
// Defines the interface for the persisted control-plane state: zones,
// records, forward zones and the change log.
//
// ## Purpose
//
// The store is the source of truth for *intended* state. The engine writes
// intended state first, then attempts the protocol operation, then writes
// the sync outcome back.
//
// ## Implementations
//
// - In-memory: `state::MemoryStore`
// - JSON file with atomic writes and backup: `state::FileStore`
//
// ## Lifecycle
//
// Stores are injected into the engine explicitly. Open them with their
// constructor, call `flush()` whenever durability matters, and `close()`
// before dropping.

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{
    ChangeLog, ChangeLogQuery, ForwardZone, ForwardZoneSpec, NewChangeLog, Record, RecordQuery,
    RecordSpec, Zone, ZoneSpec,
};

/// Trait for store implementations
///
/// All methods must be safe to call concurrently from multiple tasks.
///
/// # Integrity
///
/// Implementations enforce the relational constraints themselves:
/// - zone and forward-zone names are unique (`Error::Conflict`)
/// - a record's zone must exist (`Error::NotFound`)
/// - a zone with records cannot be deleted (`Error::Conflict`)
/// - record updates are conditional on the expected version (`Error::Conflict`)
/// - change-log rows are append-only
#[async_trait]
pub trait Store: Send + Sync {
    /// Insert a zone; the store assigns id and timestamps
    async fn insert_zone(&self, spec: ZoneSpec) -> Result<Zone>;

    /// Replace a stored zone row
    async fn update_zone(&self, zone: &Zone) -> Result<()>;

    /// Delete a zone that has no records
    async fn delete_zone(&self, id: u64) -> Result<()>;

    async fn get_zone(&self, id: u64) -> Result<Option<Zone>>;

    async fn find_zone_by_name(&self, name: &str) -> Result<Option<Zone>>;

    async fn list_zones(&self) -> Result<Vec<Zone>>;

    /// Number of records referencing a zone
    async fn count_zone_records(&self, zone_id: u64) -> Result<usize>;

    /// Insert a record; the store assigns id, timestamps and version 1
    async fn insert_record(&self, spec: RecordSpec) -> Result<Record>;

    /// Replace a stored record row if its version still equals `expected_version`
    ///
    /// Returns the stored row with its version incremented.
    async fn update_record(&self, record: &Record, expected_version: u64) -> Result<Record>;

    async fn delete_record(&self, id: u64) -> Result<()>;

    async fn get_record(&self, id: u64) -> Result<Option<Record>>;

    async fn list_records(&self, query: &RecordQuery) -> Result<Vec<Record>>;

    async fn insert_forward_zone(&self, spec: ForwardZoneSpec) -> Result<ForwardZone>;

    async fn update_forward_zone(&self, zone: &ForwardZone) -> Result<()>;

    async fn delete_forward_zone(&self, id: u64) -> Result<()>;

    async fn get_forward_zone(&self, id: u64) -> Result<Option<ForwardZone>>;

    async fn find_forward_zone_by_name(&self, name: &str) -> Result<Option<ForwardZone>>;

    async fn list_forward_zones(&self) -> Result<Vec<ForwardZone>>;

    /// Append one change-log row
    async fn append_change_log(&self, entry: NewChangeLog) -> Result<ChangeLog>;

    /// Newest first, filtered and limited by the query
    async fn list_change_logs(&self, query: &ChangeLogQuery) -> Result<Vec<ChangeLog>>;

    /// Persist any pending changes
    async fn flush(&self) -> Result<()>;

    /// Flush and release the store
    async fn close(&self) -> Result<()> {
        self.flush().await
    }
}
