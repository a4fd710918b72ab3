//! Append-only audit entries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::record::SyncStatus;

/// Default number of change-log rows returned by a listing
pub const DEFAULT_CHANGE_LOG_LIMIT: usize = 100;

/// Hard cap on the number of change-log rows returned by a listing
pub const MAX_CHANGE_LOG_LIMIT: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    Create,
    Update,
    Delete,
    Sync,
}

impl ChangeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeAction::Create => "create",
            ChangeAction::Update => "update",
            ChangeAction::Delete => "delete",
            ChangeAction::Sync => "sync",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeStatus {
    Success,
    Failed,
    Skipped,
}

impl From<SyncStatus> for ChangeStatus {
    fn from(status: SyncStatus) -> Self {
        match status {
            SyncStatus::Success => ChangeStatus::Success,
            SyncStatus::Failed => ChangeStatus::Failed,
            // A row left pending was never attempted
            SyncStatus::Skipped | SyncStatus::Pending => ChangeStatus::Skipped,
        }
    }
}

/// How the operator behind a change was authenticated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperatorType {
    Cookie,
    #[serde(rename = "apikey")]
    ApiKey,
    System,
}

/// Structured before/after snapshot of a change
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<serde_json::Value>,
    /// Raw output of the update client or reload command, when one ran
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<serde_json::Value>,
}

/// A persisted change-log row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeLog {
    pub id: u64,
    pub zone_id: Option<u64>,
    pub record_id: Option<u64>,
    pub action: ChangeAction,
    pub status: ChangeStatus,
    pub payload: ChangePayload,
    pub message: String,
    pub operator_type: OperatorType,
    pub operator_name: String,
    pub created_at: DateTime<Utc>,
}

/// A change-log row before the store assigns its id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewChangeLog {
    pub zone_id: Option<u64>,
    pub record_id: Option<u64>,
    pub action: ChangeAction,
    pub status: ChangeStatus,
    pub payload: ChangePayload,
    pub message: String,
    pub operator_type: OperatorType,
    pub operator_name: String,
}

impl NewChangeLog {
    pub fn into_entry(self, id: u64, now: DateTime<Utc>) -> ChangeLog {
        ChangeLog {
            id,
            zone_id: self.zone_id,
            record_id: self.record_id,
            action: self.action,
            status: self.status,
            payload: self.payload,
            message: self.message,
            operator_type: self.operator_type,
            operator_name: self.operator_name,
            created_at: now,
        }
    }
}

/// Filter for listing change-log rows
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChangeLogQuery {
    #[serde(default)]
    pub zone_id: Option<u64>,
    #[serde(default)]
    pub record_id: Option<u64>,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl ChangeLogQuery {
    /// Requested limit clamped to [1, MAX_CHANGE_LOG_LIMIT]
    pub fn effective_limit(&self) -> usize {
        self.limit
            .unwrap_or(DEFAULT_CHANGE_LOG_LIMIT)
            .clamp(1, MAX_CHANGE_LOG_LIMIT)
    }

    pub fn matches(&self, entry: &ChangeLog) -> bool {
        self.zone_id.is_none_or(|id| entry.zone_id == Some(id))
            && self.record_id.is_none_or(|id| entry.record_id == Some(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_is_capped() {
        let query = ChangeLogQuery {
            limit: Some(10_000),
            ..ChangeLogQuery::default()
        };
        assert_eq!(query.effective_limit(), MAX_CHANGE_LOG_LIMIT);
        assert_eq!(ChangeLogQuery::default().effective_limit(), DEFAULT_CHANGE_LOG_LIMIT);
    }

    #[test]
    fn test_operator_type_wire_names() {
        assert_eq!(serde_json::to_string(&OperatorType::ApiKey).unwrap(), "\"apikey\"");
        assert_eq!(serde_json::to_string(&OperatorType::Cookie).unwrap(), "\"cookie\"");
    }
}
