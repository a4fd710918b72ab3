//! Record entity, its enums and inbound request types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use super::names::{reject_control_chars, validate_domain_name, validate_record_name};
use crate::error::{Error, Result};
use crate::protocol::RecordTuple;

/// Lowest accepted record TTL, in seconds
pub const MIN_TTL: u32 = 30;

/// Highest accepted record TTL, in seconds
pub const MAX_TTL: u32 = 86_400;

/// Longest accepted TXT value, in bytes
pub const MAX_TXT_LEN: usize = 4_000;

/// TTL used when a request omits one
pub const DEFAULT_TTL: u32 = 300;

/// Supported record types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordType {
    A,
    #[serde(rename = "AAAA")]
    Aaaa,
    #[serde(rename = "CNAME")]
    Cname,
    #[serde(rename = "TXT")]
    Txt,
    #[serde(rename = "MX")]
    Mx,
}

impl RecordType {
    /// Presentation-format mnemonic
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
            RecordType::Cname => "CNAME",
            RecordType::Txt => "TXT",
            RecordType::Mx => "MX",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(RecordType::A),
            "AAAA" => Ok(RecordType::Aaaa),
            "CNAME" => Ok(RecordType::Cname),
            "TXT" => Ok(RecordType::Txt),
            "MX" => Ok(RecordType::Mx),
            _ => Err(Error::validation(format!(
                "Record type '{}' is not supported. Supported types: A, AAAA, CNAME, TXT, MX",
                s
            ))),
        }
    }
}

/// Whether a record should be published on the nameserver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Active,
    Inactive,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Active => "active",
            RecordStatus::Inactive => "inactive",
        }
    }
}

impl FromStr for RecordStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(RecordStatus::Active),
            "inactive" => Ok(RecordStatus::Inactive),
            _ => Err(Error::validation(format!(
                "Record status '{}' is not valid. Valid statuses: active, inactive",
                s
            ))),
        }
    }
}

/// Outcome of the most recent attempt to propagate a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Pending,
    Success,
    Failed,
    Skipped,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Pending => "pending",
            SyncStatus::Success => "success",
            SyncStatus::Failed => "failed",
            SyncStatus::Skipped => "skipped",
        }
    }
}

/// Result of one sync branch, written back onto the record row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncOutcome {
    pub status: SyncStatus,
    pub message: String,
    #[serde(default)]
    pub stdout: String,
    #[serde(default)]
    pub stderr: String,
}

impl SyncOutcome {
    pub fn skipped(message: impl Into<String>) -> Self {
        Self {
            status: SyncStatus::Skipped,
            message: message.into(),
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    /// Persisted but not attempted; picked up by the next pending re-sync
    pub fn pending(message: impl Into<String>) -> Self {
        Self {
            status: SyncStatus::Pending,
            message: message.into(),
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.status == SyncStatus::Failed
    }
}

/// A DNS resource record scoped to a zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: u64,
    pub zone_id: u64,
    /// Owner name relative to the zone; `@` is the apex
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: RecordType,
    pub ttl: u32,
    pub value: String,
    /// Present iff the record is MX
    pub priority: Option<u16>,
    pub status: RecordStatus,
    pub last_sync_status: SyncStatus,
    pub last_sync_message: String,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Incremented on every write; guards against lost updates
    pub version: u64,
    /// Tuple last confirmed on the nameserver; `None` when nothing is known to be published
    #[serde(default)]
    pub published: Option<RecordTuple>,
}

impl Record {
    /// Build a new row from a validated spec, sync still pending
    pub fn from_spec(id: u64, spec: RecordSpec, now: DateTime<Utc>) -> Self {
        Self {
            id,
            zone_id: spec.zone_id,
            name: spec.name,
            record_type: spec.record_type,
            ttl: spec.ttl,
            value: spec.value,
            priority: spec.priority,
            status: spec.status,
            last_sync_status: SyncStatus::Pending,
            last_sync_message: String::new(),
            last_synced_at: None,
            created_at: now,
            updated_at: now,
            version: 1,
            published: None,
        }
    }

    /// The intended (name, type, ttl, rdata) tuple
    pub fn tuple(&self) -> RecordTuple {
        RecordTuple {
            name: self.name.clone(),
            record_type: self.record_type,
            ttl: self.ttl,
            value: self.value.clone(),
            priority: self.priority,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == RecordStatus::Active
    }

    /// Overwrite the mutable fields with a validated spec
    pub fn apply(&mut self, spec: RecordSpec, now: DateTime<Utc>) {
        self.name = spec.name;
        self.record_type = spec.record_type;
        self.ttl = spec.ttl;
        self.value = spec.value;
        self.priority = spec.priority;
        self.status = spec.status;
        self.last_sync_status = SyncStatus::Pending;
        self.updated_at = now;
    }

    /// Record the outcome of a sync attempt on this row
    ///
    /// `last_synced_at` only moves when the nameserver was actually contacted.
    pub fn record_outcome(&mut self, outcome: &SyncOutcome, now: DateTime<Utc>) {
        self.last_sync_status = outcome.status;
        self.last_sync_message = outcome.message.clone();
        if matches!(outcome.status, SyncStatus::Success | SyncStatus::Failed) {
            self.last_synced_at = Some(now);
        }
        self.updated_at = now;
    }
}

/// Inbound record payload, as received from callers
///
/// Loosely typed on purpose: [`RecordRequest::validate`] turns it into a
/// [`RecordSpec`] before any domain logic sees it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordRequest {
    pub zone_id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    #[serde(default)]
    pub ttl: Option<i64>,
    pub value: String,
    #[serde(default)]
    pub priority: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
}

impl RecordRequest {
    /// Create a request for an active record with the default TTL
    pub fn new(
        zone_id: u64,
        name: impl Into<String>,
        record_type: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            zone_id,
            name: name.into(),
            record_type: record_type.into(),
            value: value.into(),
            ..Self::default()
        }
    }

    pub fn with_ttl(mut self, ttl: i64) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Validate into a typed record spec
    pub fn validate(self) -> Result<RecordSpec> {
        let name = self.name.trim().to_string();
        validate_record_name(&name)?;

        let record_type: RecordType = self.record_type.parse()?;

        let ttl = match self.ttl {
            None => DEFAULT_TTL,
            Some(ttl) => u32::try_from(ttl)
                .ok()
                .filter(|t| (MIN_TTL..=MAX_TTL).contains(t))
                .ok_or_else(|| {
                    Error::validation(format!(
                        "Record TTL must be between {} and {}. Got: {}",
                        MIN_TTL, MAX_TTL, ttl
                    ))
                })?,
        };

        let priority = match (record_type, self.priority) {
            (RecordType::Mx, None) => {
                return Err(Error::validation("MX records require a priority"));
            }
            (RecordType::Mx, Some(priority)) => Some(u16::try_from(priority).map_err(|_| {
                Error::validation(format!(
                    "MX priority must be between 0 and 65535. Got: {}",
                    priority
                ))
            })?),
            (_, Some(_)) => {
                return Err(Error::validation(format!(
                    "Priority is only allowed on MX records, not {}",
                    record_type
                )));
            }
            (_, None) => None,
        };

        let status = match self.status {
            None => RecordStatus::Active,
            Some(status) => status.parse()?,
        };

        let value = validate_value(record_type, self.value)?;

        Ok(RecordSpec {
            zone_id: self.zone_id,
            name,
            record_type,
            ttl,
            value,
            priority,
            status,
        })
    }
}

fn validate_value(record_type: RecordType, value: String) -> Result<String> {
    reject_control_chars("Record value", &value)?;

    let value = match record_type {
        // TXT content is taken as-is, leading and trailing spaces included
        RecordType::Txt => value,
        _ => value.trim().to_string(),
    };

    if value.is_empty() {
        return Err(Error::validation("Record value cannot be empty"));
    }

    match record_type {
        RecordType::A => {
            value.parse::<Ipv4Addr>().map_err(|_| {
                Error::validation(format!("A record value must be an IPv4 address. Got: {}", value))
            })?;
        }
        RecordType::Aaaa => {
            value.parse::<Ipv6Addr>().map_err(|_| {
                Error::validation(format!(
                    "AAAA record value must be an IPv6 address. Got: {}",
                    value
                ))
            })?;
        }
        RecordType::Cname | RecordType::Mx => validate_domain_name(&value)?,
        RecordType::Txt => {
            if value.len() > MAX_TXT_LEN {
                return Err(Error::validation(format!(
                    "TXT record value cannot exceed {} bytes. Got: {}",
                    MAX_TXT_LEN,
                    value.len()
                )));
            }
        }
    }

    Ok(value)
}

/// Partial record update; omitted fields keep their stored value
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub record_type: Option<String>,
    #[serde(default)]
    pub ttl: Option<i64>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub priority: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
}

impl RecordPatch {
    pub fn value(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn status(status: impl Into<String>) -> Self {
        Self {
            status: Some(status.into()),
            ..Self::default()
        }
    }

    /// Merge this patch over a stored record into a full request
    ///
    /// When the type changes and the patch says nothing about priority, the
    /// stored priority is only inherited by MX.
    pub fn merge(self, record: &Record) -> RecordRequest {
        let record_type = self
            .record_type
            .unwrap_or_else(|| record.record_type.as_str().to_string());

        let type_changed = !record_type
            .trim()
            .eq_ignore_ascii_case(record.record_type.as_str());
        let priority = match self.priority {
            Some(priority) => Some(priority),
            None if type_changed && !record_type.trim().eq_ignore_ascii_case("MX") => None,
            None => record.priority.map(i64::from),
        };

        RecordRequest {
            zone_id: record.zone_id,
            name: self.name.unwrap_or_else(|| record.name.clone()),
            record_type,
            ttl: Some(self.ttl.unwrap_or(i64::from(record.ttl))),
            value: self.value.unwrap_or_else(|| record.value.clone()),
            priority,
            status: Some(
                self.status
                    .unwrap_or_else(|| record.status.as_str().to_string()),
            ),
        }
    }
}

/// A validated record, ready to persist or sync
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSpec {
    pub zone_id: u64,
    pub name: String,
    pub record_type: RecordType,
    pub ttl: u32,
    pub value: String,
    pub priority: Option<u16>,
    pub status: RecordStatus,
}

impl RecordSpec {
    pub fn tuple(&self) -> RecordTuple {
        RecordTuple {
            name: self.name.clone(),
            record_type: self.record_type,
            ttl: self.ttl,
            value: self.value.clone(),
            priority: self.priority,
        }
    }
}

/// Filter for listing records
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordQuery {
    #[serde(default)]
    pub zone_id: Option<u64>,
    #[serde(default)]
    pub include_inactive: bool,
}
