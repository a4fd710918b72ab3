//! Record operations

use chrono::Utc;
use tracing::{debug, error, info, warn};

use super::plan::{RecordState, plan, plan_resync};
use super::{RecordChange, SyncAction, SyncEngine, SyncMode};
use crate::auth::{AuthContext, Permission};
use crate::changelog::ChangeEntry;
use crate::error::{Error, Result};
use crate::model::{
    ChangeAction, ChangeStatus, Record, RecordPatch, RecordQuery, RecordRequest, SyncOutcome,
    SyncStatus,
};

impl SyncEngine {
    /// Create a record and publish it
    ///
    /// The row and its change-log entry are persisted even when the first
    /// sync fails; that failure is then reported as `Error::Protocol`
    /// carrying the new record id.
    pub async fn create_record(
        &self,
        auth: &AuthContext,
        request: RecordRequest,
        mode: SyncMode,
    ) -> Result<RecordChange> {
        auth.require(Permission::Write)?;
        let spec = request.validate()?;
        let zone = self.load_zone(spec.zone_id).await?;

        let action = plan(None, Some(&RecordState::from(&spec)), zone.active, mode);
        let pending = self.store.insert_record(spec).await?;
        debug!("Record {} stored as pending in zone {}", pending.id, zone.name);

        let outcome = self.execute(&zone, &action).await;
        let saved = self.save_outcome(pending.clone(), &action, &outcome).await;

        let snapshot = saved.as_ref().unwrap_or(&pending);
        self.changelog
            .append(
                auth,
                ChangeEntry::new(ChangeAction::Create, outcome.status.into(), &outcome.message)
                    .zone(zone.id)
                    .record(snapshot.id)
                    .after(snapshot)
                    .output(&outcome.stdout, &outcome.stderr),
            )
            .await;

        let record = saved?;
        if outcome.is_failed() {
            return Err(Error::Protocol {
                record_id: record.id,
                message: outcome.message,
                stderr: outcome.stderr,
            });
        }

        info!("Created record {} ({} {})", record.id, record.name, record.record_type);
        Ok(RecordChange { record, outcome })
    }

    /// Apply a partial update to a record and publish the difference
    ///
    /// A sync failure does not fail the call; it is reported through the
    /// returned outcome and the row's sync status.
    pub async fn update_record(
        &self,
        auth: &AuthContext,
        id: u64,
        patch: RecordPatch,
        mode: SyncMode,
    ) -> Result<RecordChange> {
        auth.require(Permission::Write)?;
        let current = self.load_record(id).await?;
        let spec = patch.merge(&current).validate()?;
        let zone = self.load_zone(current.zone_id).await?;

        let action = plan(
            Some(&RecordState::last_published(&current)),
            Some(&RecordState::from(&spec)),
            zone.active,
            mode,
        );

        let mut intended = current.clone();
        intended.apply(spec, Utc::now());
        let pending = self.store.update_record(&intended, current.version).await?;

        let outcome = self.execute(&zone, &action).await;
        let saved = self.save_outcome(pending.clone(), &action, &outcome).await;

        let snapshot = saved.as_ref().unwrap_or(&pending);
        self.changelog
            .append(
                auth,
                ChangeEntry::new(ChangeAction::Update, outcome.status.into(), &outcome.message)
                    .zone(zone.id)
                    .record(id)
                    .before(&current)
                    .after(snapshot)
                    .output(&outcome.stdout, &outcome.stderr),
            )
            .await;

        Ok(RecordChange {
            record: saved?,
            outcome,
        })
    }

    /// Delete a record
    ///
    /// The row is removed whatever the sync outcome. A delete is sent to the
    /// nameserver only for an active record in an active zone.
    pub async fn delete_record(
        &self,
        auth: &AuthContext,
        id: u64,
        mode: SyncMode,
    ) -> Result<RecordChange> {
        auth.require(Permission::Write)?;
        let current = self.load_record(id).await?;
        let zone = self.load_zone(current.zone_id).await?;

        let action = plan(Some(&RecordState::last_published(&current)), None, zone.active, mode);
        let outcome = self.execute(&zone, &action).await;

        if let Err(e) = self.store.delete_record(id).await {
            error!("Failed to delete record {} after sync: {}", id, e);
            let message = format!("{}; record row not deleted: {}", outcome.message, e);
            self.changelog
                .append(
                    auth,
                    ChangeEntry::new(ChangeAction::Delete, ChangeStatus::Failed, message)
                        .zone(zone.id)
                        .record(id)
                        .before(&current)
                        .output(&outcome.stdout, &outcome.stderr),
                )
                .await;
            return Err(e);
        }
        if outcome.is_failed() {
            warn!(
                "Record {} deleted but the nameserver may still hold it: {}",
                id, outcome.message
            );
        } else {
            info!("Deleted record {} ({} {})", id, current.name, current.record_type);
        }

        self.changelog
            .append(
                auth,
                ChangeEntry::new(ChangeAction::Delete, outcome.status.into(), &outcome.message)
                    .zone(zone.id)
                    .record(id)
                    .before(&current)
                    .output(&outcome.stdout, &outcome.stderr),
            )
            .await;

        let mut record = current;
        record.record_outcome(&outcome, Utc::now());
        Ok(RecordChange { record, outcome })
    }

    /// Re-publish a stored record as it stands
    ///
    /// Active records are added, inactive ones deleted. Useful after a
    /// failed or deferred sync.
    pub async fn resync_record(&self, auth: &AuthContext, id: u64) -> Result<RecordChange> {
        auth.require(Permission::Write)?;
        let current = self.load_record(id).await?;
        let zone = self.load_zone(current.zone_id).await?;

        let action = plan_resync(&current, zone.active);
        let outcome = self.execute(&zone, &action).await;
        let saved = self.save_outcome(current.clone(), &action, &outcome).await;

        let snapshot = saved.as_ref().unwrap_or(&current);
        self.changelog
            .append(
                auth,
                ChangeEntry::new(ChangeAction::Sync, outcome.status.into(), &outcome.message)
                    .zone(zone.id)
                    .record(id)
                    .after(snapshot)
                    .output(&outcome.stdout, &outcome.stderr),
            )
            .await;

        Ok(RecordChange {
            record: saved?,
            outcome,
        })
    }

    /// Re-sync every record whose last sync is pending (including deferred) or failed
    ///
    /// A record that cannot be re-synced (for example because it was deleted
    /// concurrently) is logged and skipped.
    pub async fn resync_pending(&self, auth: &AuthContext) -> Result<Vec<RecordChange>> {
        self.resync_where(auth, |record| {
            matches!(record.last_sync_status, SyncStatus::Pending | SyncStatus::Failed)
        })
        .await
    }

    /// Re-sync every record regardless of its last outcome
    pub async fn resync_all(&self, auth: &AuthContext) -> Result<Vec<RecordChange>> {
        self.resync_where(auth, |_| true).await
    }

    async fn resync_where(
        &self,
        auth: &AuthContext,
        select: impl Fn(&Record) -> bool,
    ) -> Result<Vec<RecordChange>> {
        auth.require(Permission::Write)?;
        let query = RecordQuery {
            zone_id: None,
            include_inactive: true,
        };
        let candidates: Vec<Record> = self
            .store
            .list_records(&query)
            .await?
            .into_iter()
            .filter(|record| select(record))
            .collect();

        info!("Re-syncing {} record(s)", candidates.len());

        let mut changes = Vec::with_capacity(candidates.len());
        for record in candidates {
            match self.resync_record(auth, record.id).await {
                Ok(change) => changes.push(change),
                Err(e) => error!("Failed to re-sync record {}: {}", record.id, e),
            }
        }
        Ok(changes)
    }

    pub async fn get_record(&self, auth: &AuthContext, id: u64) -> Result<Record> {
        auth.require(Permission::Read)?;
        self.load_record(id).await
    }

    /// List records, optionally restricted to one zone
    pub async fn list_records(&self, auth: &AuthContext, query: &RecordQuery) -> Result<Vec<Record>> {
        auth.require(Permission::Read)?;
        if let Some(zone_id) = query.zone_id {
            self.load_zone(zone_id).await?;
        }
        self.store.list_records(query).await
    }

    /// Write a sync outcome onto a row
    ///
    /// A successful operation also moves the row's published tuple.
    async fn save_outcome(
        &self,
        mut record: Record,
        action: &SyncAction,
        outcome: &SyncOutcome,
    ) -> Result<Record> {
        let expected = record.version;
        record.record_outcome(outcome, Utc::now());
        if outcome.status == SyncStatus::Success
            && let SyncAction::Run(operation) = action
        {
            record.published = operation.published_after().cloned();
        }
        self.store
            .update_record(&record, expected)
            .await
            .inspect_err(|e| {
                error!("Failed to persist sync outcome for record {}: {}", record.id, e)
            })
    }
}
