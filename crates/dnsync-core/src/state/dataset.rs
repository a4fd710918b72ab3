// # Dataset
//
// The relational state shared by every store implementation: four tables
// plus id sequences. All integrity rules live here so that the memory and
// file stores behave identically.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::model::{
    ChangeLog, ChangeLogQuery, ForwardZone, ForwardZoneSpec, NewChangeLog, Record, RecordQuery,
    RecordSpec, Zone, ZoneSpec,
};

/// Change-log rows kept per store; older rows are pruned on append
pub const CHANGE_LOG_RETENTION: usize = 10_000;

/// In-memory tables, serializable as one snapshot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    zones: BTreeMap<u64, Zone>,
    #[serde(default)]
    records: BTreeMap<u64, Record>,
    #[serde(default)]
    forward_zones: BTreeMap<u64, ForwardZone>,
    #[serde(default)]
    change_logs: Vec<ChangeLog>,
    #[serde(default)]
    sequences: Sequences,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Sequences {
    zone: u64,
    record: u64,
    forward_zone: u64,
    change_log: u64,
}

fn next(seq: &mut u64) -> u64 {
    *seq += 1;
    *seq
}

impl Dataset {
    pub fn insert_zone(&mut self, spec: ZoneSpec) -> Result<Zone> {
        if self.zones.values().any(|z| z.name == spec.name) {
            return Err(Error::conflict(format!("Zone '{}' already exists", spec.name)));
        }
        let zone = Zone::from_spec(next(&mut self.sequences.zone), spec, Utc::now());
        self.zones.insert(zone.id, zone.clone());
        Ok(zone)
    }

    pub fn update_zone(&mut self, zone: &Zone) -> Result<()> {
        if !self.zones.contains_key(&zone.id) {
            return Err(Error::not_found(format!("Zone {} not found", zone.id)));
        }
        if self
            .zones
            .values()
            .any(|z| z.id != zone.id && z.name == zone.name)
        {
            return Err(Error::conflict(format!("Zone '{}' already exists", zone.name)));
        }
        self.zones.insert(zone.id, zone.clone());
        Ok(())
    }

    pub fn delete_zone(&mut self, id: u64) -> Result<()> {
        let referencing = self.count_zone_records(id);
        if referencing > 0 {
            return Err(Error::conflict(format!(
                "Zone {} still has {} record(s)",
                id, referencing
            )));
        }
        self.zones
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| Error::not_found(format!("Zone {} not found", id)))
    }

    pub fn get_zone(&self, id: u64) -> Option<Zone> {
        self.zones.get(&id).cloned()
    }

    pub fn find_zone_by_name(&self, name: &str) -> Option<Zone> {
        self.zones.values().find(|z| z.name == name).cloned()
    }

    pub fn list_zones(&self) -> Vec<Zone> {
        self.zones.values().cloned().collect()
    }

    pub fn count_zone_records(&self, zone_id: u64) -> usize {
        self.records.values().filter(|r| r.zone_id == zone_id).count()
    }

    pub fn insert_record(&mut self, spec: RecordSpec) -> Result<Record> {
        if !self.zones.contains_key(&spec.zone_id) {
            return Err(Error::not_found(format!("Zone {} not found", spec.zone_id)));
        }
        let record = Record::from_spec(next(&mut self.sequences.record), spec, Utc::now());
        self.records.insert(record.id, record.clone());
        Ok(record)
    }

    pub fn update_record(&mut self, record: &Record, expected_version: u64) -> Result<Record> {
        let stored = self
            .records
            .get_mut(&record.id)
            .ok_or_else(|| Error::not_found(format!("Record {} not found", record.id)))?;

        if stored.version != expected_version {
            return Err(Error::conflict(format!(
                "Record {} was modified concurrently (expected version {}, found {})",
                record.id, expected_version, stored.version
            )));
        }

        let mut updated = record.clone();
        updated.version = expected_version + 1;
        *stored = updated.clone();
        Ok(updated)
    }

    pub fn delete_record(&mut self, id: u64) -> Result<()> {
        self.records
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| Error::not_found(format!("Record {} not found", id)))
    }

    pub fn get_record(&self, id: u64) -> Option<Record> {
        self.records.get(&id).cloned()
    }

    pub fn list_records(&self, query: &RecordQuery) -> Vec<Record> {
        self.records
            .values()
            .filter(|r| query.zone_id.is_none_or(|id| r.zone_id == id))
            .filter(|r| query.include_inactive || r.is_active())
            .cloned()
            .collect()
    }

    pub fn insert_forward_zone(&mut self, spec: ForwardZoneSpec) -> Result<ForwardZone> {
        if self.forward_zones.values().any(|z| z.name == spec.name) {
            return Err(Error::conflict(format!(
                "Forward zone '{}' already exists",
                spec.name
            )));
        }
        let zone = ForwardZone::from_spec(next(&mut self.sequences.forward_zone), spec, Utc::now());
        self.forward_zones.insert(zone.id, zone.clone());
        Ok(zone)
    }

    pub fn update_forward_zone(&mut self, zone: &ForwardZone) -> Result<()> {
        if !self.forward_zones.contains_key(&zone.id) {
            return Err(Error::not_found(format!("Forward zone {} not found", zone.id)));
        }
        if self
            .forward_zones
            .values()
            .any(|z| z.id != zone.id && z.name == zone.name)
        {
            return Err(Error::conflict(format!(
                "Forward zone '{}' already exists",
                zone.name
            )));
        }
        self.forward_zones.insert(zone.id, zone.clone());
        Ok(())
    }

    pub fn delete_forward_zone(&mut self, id: u64) -> Result<()> {
        self.forward_zones
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| Error::not_found(format!("Forward zone {} not found", id)))
    }

    pub fn get_forward_zone(&self, id: u64) -> Option<ForwardZone> {
        self.forward_zones.get(&id).cloned()
    }

    pub fn find_forward_zone_by_name(&self, name: &str) -> Option<ForwardZone> {
        self.forward_zones.values().find(|z| z.name == name).cloned()
    }

    pub fn list_forward_zones(&self) -> Vec<ForwardZone> {
        self.forward_zones.values().cloned().collect()
    }

    pub fn append_change_log(&mut self, entry: NewChangeLog) -> ChangeLog {
        let entry = entry.into_entry(next(&mut self.sequences.change_log), Utc::now());
        self.change_logs.push(entry.clone());
        self.prune_change_logs(CHANGE_LOG_RETENTION);
        entry
    }

    /// Drop the oldest change-log rows beyond `keep`
    fn prune_change_logs(&mut self, keep: usize) {
        let excess = self.change_logs.len().saturating_sub(keep);
        if excess > 0 {
            self.change_logs.drain(..excess);
        }
    }

    pub fn list_change_logs(&self, query: &ChangeLogQuery) -> Vec<ChangeLog> {
        self.change_logs
            .iter()
            .rev()
            .filter(|entry| query.matches(entry))
            .take(query.effective_limit())
            .cloned()
            .collect()
    }

    /// Total number of rows across all tables
    pub fn len(&self) -> usize {
        self.zones.len() + self.records.len() + self.forward_zones.len() + self.change_logs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
