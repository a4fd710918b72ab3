//! Sync orchestrator
//!
//! The SyncEngine is responsible for:
//! - Validating and persisting zone, record and forward-zone mutations
//! - Choosing the protocol action for each record transition
//! - Driving the update client and writing the outcome back
//! - Appending one change-log entry per accepted mutation
//!
//! ## Architecture
//!
//! ```text
//!                  ┌──────────────┐
//!   AuthContext ──▶│  SyncEngine  │
//!                  └──────────────┘
//!                         │
//!     ┌───────────────────┼────────────────────┬──────────────────┐
//!     │                   │                    │                  │
//!     ▼                   ▼                    ▼                  ▼
//! ┌─────────┐     ┌──────────────┐    ┌─────────────────┐  ┌─────────────┐
//! │  Store  │     │ UpdateClient │    │ForwardConfigSink│  │ ChangeLog   │
//! │ (rows)  │     │ (nsupdate)   │    │ (named.conf)    │  │ (audit)     │
//! └─────────┘     └──────────────┘    └─────────────────┘  └─────────────┘
//! ```
//!
//! ## Record Flow
//!
//! 1. Validate the request and check permissions
//! 2. Persist the intended state with sync status `pending`
//! 3. Run the planned protocol operation, if any
//! 4. Persist the outcome onto the row
//! 5. Append the change-log entry (best effort)

mod forward;
mod logs;
pub mod plan;
mod records;
mod zones;

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::changelog::ChangeLogWriter;
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::model::{Record, SyncOutcome, SyncStatus, Zone};
use crate::protocol::{UpdateOperation, UpdateScript, fqdn};
use crate::traits::{ExecOutcome, ForwardConfigSink, Store, UpdateClient};

pub use forward::ForwardZoneChange;
pub use plan::{SkipReason, SyncAction, SyncMode};

/// A record together with the outcome of the sync that accompanied its mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordChange {
    /// The row as persisted after the operation (for deletes, the last state)
    pub record: Record,
    pub outcome: SyncOutcome,
}

/// Core sync engine
///
/// The engine is stateless between calls; every operation reads what it
/// needs from the store. Concurrent updates of the same record are
/// serialized by the store's version check, so the engine is safe to share
/// behind an `Arc`.
pub struct SyncEngine {
    /// Source of truth for zones, records, forward zones and the change log
    store: Arc<dyn Store>,

    /// Delivers update scripts to the nameserver
    client: Arc<dyn UpdateClient>,

    /// Publishes the rendered forwarding configuration
    forward_sink: Arc<dyn ForwardConfigSink>,

    changelog: ChangeLogWriter,

    /// Extra attempts after a transient failure
    max_retries: usize,

    /// Delay between retries
    retry_delay: Duration,
}

impl SyncEngine {
    /// Create a new sync engine
    ///
    /// # Parameters
    ///
    /// - `store`: Store implementation
    /// - `client`: Update client implementation
    /// - `forward_sink`: Forwarding configuration sink
    /// - `config`: Engine settings (retry policy)
    pub fn new(
        store: Arc<dyn Store>,
        client: Arc<dyn UpdateClient>,
        forward_sink: Arc<dyn ForwardConfigSink>,
        config: &EngineConfig,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            changelog: ChangeLogWriter::new(store.clone()),
            store,
            client,
            forward_sink,
            max_retries: config.max_retries,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        })
    }

    /// The underlying store
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Flush the store before shutdown
    pub async fn shutdown(&self) -> Result<()> {
        self.store.close().await?;
        info!("Store flushed, engine stopped");
        Ok(())
    }

    async fn load_zone(&self, id: u64) -> Result<Zone> {
        self.store
            .get_zone(id)
            .await?
            .ok_or_else(|| Error::not_found(format!("Zone {} not found", id)))
    }

    async fn load_record(&self, id: u64) -> Result<Record> {
        self.store
            .get_record(id)
            .await?
            .ok_or_else(|| Error::not_found(format!("Record {} not found", id)))
    }

    /// Carry out a planned action against the zone's nameserver
    async fn execute(&self, zone: &Zone, action: &SyncAction) -> SyncOutcome {
        let operation = match action {
            SyncAction::Skip(SkipReason::Deferred) => {
                debug!("Sync deferred in zone {}; row left pending", zone.name);
                return SyncOutcome::pending(SkipReason::Deferred.message());
            }
            SyncAction::Skip(reason) => {
                debug!("Skipping sync in zone {}: {}", zone.name, reason.message());
                return SyncOutcome::skipped(reason.message());
            }
            SyncAction::Run(operation) => operation,
        };

        let script = UpdateScript::build(&zone.endpoint(), operation);
        let exec = self.submit_with_retry(&script).await;
        let target = operation.target();
        let owner = fqdn(&target.name, &zone.name);

        if exec.success {
            let message = format!(
                "{} {} {} via {}",
                past_tense(operation),
                owner,
                target.record_type,
                script.server
            );
            info!("{}", message);
            SyncOutcome {
                status: SyncStatus::Success,
                message,
                stdout: exec.stdout,
                stderr: exec.stderr,
            }
        } else {
            let message = format!(
                "Failed to {} {} {}: {}",
                operation.verb(),
                owner,
                target.record_type,
                exec.summary()
            );
            warn!("{}", message);
            SyncOutcome {
                status: SyncStatus::Failed,
                message,
                stdout: exec.stdout,
                stderr: exec.stderr,
            }
        }
    }

    /// Submit a script, retrying transient failures
    ///
    /// Rejections are returned on the first attempt.
    async fn submit_with_retry(&self, script: &UpdateScript) -> ExecOutcome {
        let mut attempt = 0;
        loop {
            let exec = self.client.submit(script).await;
            if exec.success || !exec.is_transient() || attempt >= self.max_retries {
                return exec;
            }

            attempt += 1;
            warn!(
                "Update attempt {} for zone {} via {} failed: {}; retrying",
                attempt,
                script.zone,
                self.client.client_name(),
                exec.summary()
            );
            if !self.retry_delay.is_zero() {
                tokio::time::sleep(self.retry_delay).await;
            }
        }
    }
}

fn past_tense(operation: &UpdateOperation) -> &'static str {
    match operation {
        UpdateOperation::Add(_) => "Added",
        UpdateOperation::Delete(_) => "Deleted",
        UpdateOperation::Replace { .. } => "Replaced",
    }
}
