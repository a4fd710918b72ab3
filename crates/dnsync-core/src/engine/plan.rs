//! Sync action selection
//!
//! Pure decision logic: given a record's previous and requested state, the
//! zone's active flag and the caller's sync mode, pick exactly one action.
//!
//! | Previous | Requested | Changed | Zone active | Action |
//! |---|---|---|---|---|
//! | (new) | active | — | yes | Add |
//! | active | inactive | — | yes | Delete |
//! | inactive | active | — | yes | Add |
//! | active | active | yes | yes | Replace |
//! | active | active | no | yes | Skip (no-op) |
//! | any | any | any | no | Skip (zone disabled) |
//! | any | any | any | deferred | Skip (deferred) |

use serde::{Deserialize, Serialize};

use crate::model::{Record, RecordSpec, RecordStatus};
use crate::protocol::{RecordTuple, UpdateOperation};

/// Whether the caller wants the nameserver updated within this call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    #[default]
    Immediate,
    /// Persist only; the row stays `pending` until a re-sync publishes it
    Deferred,
}

/// Why no protocol operation was issued
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    ZoneDisabled,
    Deferred,
    NoChange,
    /// The record is inactive before and after
    NotPublished,
}

impl SkipReason {
    pub fn message(&self) -> &'static str {
        match self {
            SkipReason::ZoneDisabled => "Zone is disabled; record not synced",
            SkipReason::Deferred => "Sync deferred by caller",
            SkipReason::NoChange => "No changes to sync",
            SkipReason::NotPublished => "Record is inactive; nothing to sync",
        }
    }
}

/// The single action chosen for a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncAction {
    Run(UpdateOperation),
    Skip(SkipReason),
}

/// The part of a record that matters for synchronization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordState {
    pub tuple: RecordTuple,
    pub status: RecordStatus,
}

impl RecordState {
    fn is_active(&self) -> bool {
        self.status == RecordStatus::Active
    }

    /// What the nameserver is believed to hold for a stored row
    ///
    /// A confirmed publication wins over the row, which may carry an edit
    /// whose sync failed or was deferred. Without one the row is the best
    /// guess; deleting a tuple the server lacks is harmless.
    pub fn last_published(record: &Record) -> Self {
        match &record.published {
            Some(tuple) => Self {
                tuple: tuple.clone(),
                status: RecordStatus::Active,
            },
            None => Self {
                tuple: record.tuple(),
                status: record.status,
            },
        }
    }
}

impl From<&RecordSpec> for RecordState {
    fn from(spec: &RecordSpec) -> Self {
        Self {
            tuple: spec.tuple(),
            status: spec.status,
        }
    }
}

/// Select the action for a record transition
///
/// `previous` is `None` for a new row; `requested` is `None` for a deletion.
pub fn plan(
    previous: Option<&RecordState>,
    requested: Option<&RecordState>,
    zone_active: bool,
    mode: SyncMode,
) -> SyncAction {
    if mode == SyncMode::Deferred {
        return SyncAction::Skip(SkipReason::Deferred);
    }
    if !zone_active {
        return SyncAction::Skip(SkipReason::ZoneDisabled);
    }

    let operation = match (previous, requested) {
        (None, Some(new)) if new.is_active() => UpdateOperation::Add(new.tuple.clone()),
        (Some(old), None) if old.is_active() => UpdateOperation::Delete(old.tuple.clone()),
        (Some(old), Some(new)) => match (old.is_active(), new.is_active()) {
            (true, false) => UpdateOperation::Delete(old.tuple.clone()),
            (false, true) => UpdateOperation::Add(new.tuple.clone()),
            (true, true) if old.tuple != new.tuple => UpdateOperation::Replace {
                from: old.tuple.clone(),
                to: new.tuple.clone(),
            },
            (true, true) => return SyncAction::Skip(SkipReason::NoChange),
            (false, false) => return SyncAction::Skip(SkipReason::NotPublished),
        },
        (None, None) => return SyncAction::Skip(SkipReason::NoChange),
        _ => return SyncAction::Skip(SkipReason::NotPublished),
    };

    SyncAction::Run(operation)
}

/// Select the action that brings the nameserver in line with a stored record
///
/// A tuple still published from before a failed or deferred edit is replaced
/// or deleted; otherwise the row is re-added (active) or deleted (inactive).
pub fn plan_resync(record: &Record, zone_active: bool) -> SyncAction {
    if !zone_active {
        return SyncAction::Skip(SkipReason::ZoneDisabled);
    }

    let current = record.tuple();
    let operation = match (record.is_active(), &record.published) {
        (true, Some(stale)) if *stale != current => UpdateOperation::Replace {
            from: stale.clone(),
            to: current,
        },
        (true, _) => UpdateOperation::Add(current),
        (false, Some(stale)) => UpdateOperation::Delete(stale.clone()),
        (false, None) => UpdateOperation::Delete(current),
    };
    SyncAction::Run(operation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RecordRequest, RecordType};
    use chrono::Utc;

    fn state(value: &str, status: RecordStatus) -> RecordState {
        RecordState {
            tuple: RecordTuple {
                name: "www".to_string(),
                record_type: RecordType::A,
                ttl: 300,
                value: value.to_string(),
                priority: None,
            },
            status,
        }
    }

    const ON: RecordStatus = RecordStatus::Active;
    const OFF: RecordStatus = RecordStatus::Inactive;

    #[test]
    fn test_new_active_row_is_added() {
        let new = state("10.0.0.1", ON);
        assert_eq!(
            plan(None, Some(&new), true, SyncMode::Immediate),
            SyncAction::Run(UpdateOperation::Add(new.tuple.clone()))
        );
    }

    #[test]
    fn test_disabled_zone_skips_everything() {
        let old = state("10.0.0.1", ON);
        let new = state("10.0.0.2", ON);
        for (prev, req) in [(None, Some(&new)), (Some(&old), Some(&new)), (Some(&old), None)] {
            assert_eq!(
                plan(prev, req, false, SyncMode::Immediate),
                SyncAction::Skip(SkipReason::ZoneDisabled)
            );
        }
    }

    #[test]
    fn test_deferred_skips_everything() {
        let new = state("10.0.0.1", ON);
        assert_eq!(
            plan(None, Some(&new), true, SyncMode::Deferred),
            SyncAction::Skip(SkipReason::Deferred)
        );
    }

    #[test]
    fn test_status_toggles() {
        let on = state("10.0.0.1", ON);
        let off = state("10.0.0.1", OFF);
        assert_eq!(
            plan(Some(&on), Some(&off), true, SyncMode::Immediate),
            SyncAction::Run(UpdateOperation::Delete(on.tuple.clone()))
        );
        assert_eq!(
            plan(Some(&off), Some(&on), true, SyncMode::Immediate),
            SyncAction::Run(UpdateOperation::Add(on.tuple.clone()))
        );
        assert_eq!(
            plan(Some(&off), Some(&off), true, SyncMode::Immediate),
            SyncAction::Skip(SkipReason::NotPublished)
        );
    }

    #[test]
    fn test_changed_active_record_is_replaced() {
        let old = state("10.0.0.1", ON);
        let new = state("10.0.0.2", ON);
        assert_eq!(
            plan(Some(&old), Some(&new), true, SyncMode::Immediate),
            SyncAction::Run(UpdateOperation::Replace {
                from: old.tuple.clone(),
                to: new.tuple.clone(),
            })
        );
    }

    #[test]
    fn test_unchanged_active_record_is_noop() {
        let old = state("10.0.0.1", ON);
        assert_eq!(
            plan(Some(&old), Some(&old.clone()), true, SyncMode::Immediate),
            SyncAction::Skip(SkipReason::NoChange)
        );
    }

    #[test]
    fn test_deletion() {
        let on = state("10.0.0.1", ON);
        let off = state("10.0.0.1", OFF);
        assert_eq!(
            plan(Some(&on), None, true, SyncMode::Immediate),
            SyncAction::Run(UpdateOperation::Delete(on.tuple.clone()))
        );
        assert_eq!(
            plan(Some(&off), None, true, SyncMode::Immediate),
            SyncAction::Skip(SkipReason::NotPublished)
        );
    }

    fn stored(value: &str, status: &str) -> Record {
        let spec = RecordRequest::new(1, "www", "A", value)
            .with_ttl(300)
            .with_status(status)
            .validate()
            .unwrap();
        Record::from_spec(1, spec, Utc::now())
    }

    #[test]
    fn test_resync_replaces_stale_published_tuple() {
        let mut record = stored("10.0.0.2", "active");
        record.published = Some(state("10.0.0.1", ON).tuple);

        assert_eq!(
            plan_resync(&record, true),
            SyncAction::Run(UpdateOperation::Replace {
                from: state("10.0.0.1", ON).tuple,
                to: record.tuple(),
            })
        );
    }

    #[test]
    fn test_resync_readds_when_published_matches_or_unknown() {
        let mut record = stored("10.0.0.1", "active");
        assert_eq!(
            plan_resync(&record, true),
            SyncAction::Run(UpdateOperation::Add(record.tuple()))
        );

        record.published = Some(record.tuple());
        assert_eq!(
            plan_resync(&record, true),
            SyncAction::Run(UpdateOperation::Add(record.tuple()))
        );
    }

    #[test]
    fn test_resync_of_inactive_deletes_what_was_published() {
        let mut record = stored("10.0.0.2", "inactive");
        record.published = Some(state("10.0.0.1", ON).tuple);

        assert_eq!(
            plan_resync(&record, true),
            SyncAction::Run(UpdateOperation::Delete(state("10.0.0.1", ON).tuple))
        );
        assert_eq!(
            plan_resync(&record, false),
            SyncAction::Skip(SkipReason::ZoneDisabled)
        );
    }

    #[test]
    fn test_update_after_failed_replace_starts_from_published() {
        let mut record = stored("10.0.0.2", "active");
        record.published = Some(state("10.0.0.1", ON).tuple);
        let requested = state("10.0.0.3", ON);

        assert_eq!(
            plan(
                Some(&RecordState::last_published(&record)),
                Some(&requested),
                true,
                SyncMode::Immediate
            ),
            SyncAction::Run(UpdateOperation::Replace {
                from: state("10.0.0.1", ON).tuple,
                to: requested.tuple.clone(),
            })
        );
    }
}
