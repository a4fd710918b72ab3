//! Best-effort change-log writer
//!
//! The change log is a secondary audit channel, not the source of truth.
//! A failed append is logged and swallowed: the outcome of the mutation it
//! describes never depends on whether its entry persisted.

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::auth::AuthContext;
use crate::model::{ChangeAction, ChangePayload, ChangeStatus, NewChangeLog};
use crate::traits::Store;

/// Builder for one change-log entry
#[derive(Debug, Clone)]
pub struct ChangeEntry {
    action: ChangeAction,
    status: ChangeStatus,
    zone_id: Option<u64>,
    record_id: Option<u64>,
    payload: ChangePayload,
    message: String,
}

impl ChangeEntry {
    pub fn new(action: ChangeAction, status: ChangeStatus, message: impl Into<String>) -> Self {
        Self {
            action,
            status,
            zone_id: None,
            record_id: None,
            payload: ChangePayload::default(),
            message: message.into(),
        }
    }

    pub fn zone(mut self, zone_id: u64) -> Self {
        self.zone_id = Some(zone_id);
        self
    }

    pub fn record(mut self, record_id: u64) -> Self {
        self.record_id = Some(record_id);
        self
    }

    pub fn before(mut self, value: &impl Serialize) -> Self {
        self.payload.before = to_json(value);
        self
    }

    pub fn after(mut self, value: &impl Serialize) -> Self {
        self.payload.after = to_json(value);
        self
    }

    /// Attach raw process output; empty output is omitted
    pub fn output(mut self, stdout: &str, stderr: &str) -> Self {
        if !stdout.is_empty() || !stderr.is_empty() {
            self.payload.output = Some(serde_json::json!({
                "stdout": stdout,
                "stderr": stderr,
            }));
        }
        self
    }
}

fn to_json(value: &impl Serialize) -> Option<serde_json::Value> {
    match serde_json::to_value(value) {
        Ok(json) => Some(json),
        Err(e) => {
            warn!("Failed to serialize change-log payload: {}", e);
            None
        }
    }
}

/// Appends change-log rows on behalf of the engine
#[derive(Clone)]
pub struct ChangeLogWriter {
    store: Arc<dyn Store>,
}

impl ChangeLogWriter {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Append one entry attributed to `auth`
    ///
    /// Never fails; returns whether the entry persisted.
    pub async fn append(&self, auth: &AuthContext, entry: ChangeEntry) -> bool {
        let action = entry.action;
        let row = NewChangeLog {
            zone_id: entry.zone_id,
            record_id: entry.record_id,
            action: entry.action,
            status: entry.status,
            payload: entry.payload,
            message: entry.message,
            operator_type: auth.operator_type(),
            operator_name: auth.operator_name().to_string(),
        };

        match self.store.append_change_log(row).await {
            Ok(logged) => {
                debug!(
                    "Change log #{}: {} {:?} by {}",
                    logged.id,
                    action.as_str(),
                    logged.status,
                    logged.operator_name
                );
                true
            }
            Err(e) => {
                warn!("Failed to write change log for {}: {}", action.as_str(), e);
                false
            }
        }
    }
}
