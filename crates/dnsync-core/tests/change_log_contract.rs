//! Contract Test: Change Log
//!
//! The change log is a best-effort audit channel.
//!
//! Constraints verified:
//! - Every accepted mutation appends exactly one entry
//! - Rejected requests append nothing
//! - Entries carry the operator identity and the sync outcome
//! - A failing log write never changes the mutation's outcome
//! - Queries filter by zone and record, newest first, with a capped limit

mod common;

use common::*;
use dnsync_core::model::{
    ChangeAction, ChangeLogQuery, ChangeStatus, OperatorType, RecordPatch, RecordRequest,
    SyncStatus,
};
use dnsync_core::{AuthContext, Permission, SyncMode};
use std::sync::Arc;

#[tokio::test]
async fn one_entry_per_accepted_mutation() {
    let h = Harness::new();
    let zone = h.zone(true).await;
    let record = h.a_record(&zone, "www", "10.0.0.1").await;
    h.engine
        .update_record(&h.auth, record.id, RecordPatch::value("10.0.0.2"), SyncMode::Immediate)
        .await
        .unwrap();
    h.engine.resync_record(&h.auth, record.id).await.unwrap();
    h.engine
        .delete_record(&h.auth, record.id, SyncMode::Immediate)
        .await
        .unwrap();

    let actions: Vec<ChangeAction> = h.change_logs().await.iter().map(|l| l.action).collect();
    assert_eq!(
        actions,
        vec![
            ChangeAction::Delete,
            ChangeAction::Sync,
            ChangeAction::Update,
            ChangeAction::Create,
            ChangeAction::Create,
        ]
    );
}

#[tokio::test]
async fn rejected_requests_are_not_logged() {
    let h = Harness::new();
    let zone = h.zone(true).await;
    let before = h.change_logs().await.len();

    // Validation
    assert!(
        h.engine
            .create_record(
                &h.auth,
                RecordRequest::new(zone.id, "www", "A", "not-an-ip"),
                SyncMode::Immediate,
            )
            .await
            .is_err()
    );
    // Not found
    assert!(
        h.engine
            .update_record(&h.auth, 999, RecordPatch::value("10.0.0.1"), SyncMode::Immediate)
            .await
            .is_err()
    );
    // Forbidden
    let reader = AuthContext::api_key("monitoring", &[Permission::Read]);
    assert!(
        h.engine
            .create_record(
                &reader,
                RecordRequest::new(zone.id, "www", "A", "10.0.0.1"),
                SyncMode::Immediate,
            )
            .await
            .is_err()
    );

    assert_eq!(h.change_logs().await.len(), before);
}

#[tokio::test]
async fn entries_carry_operator_and_outcome() {
    let h = Harness::new();
    let zone = h.zone(true).await;
    let bot = AuthContext::api_key("provisioner", &[Permission::Read, Permission::Write]);

    let change = h
        .engine
        .create_record(
            &bot,
            RecordRequest::new(zone.id, "www", "A", "10.0.0.1"),
            SyncMode::Immediate,
        )
        .await
        .unwrap();

    let logs = h.change_logs().await;
    let entry = &logs[0];
    assert_eq!(entry.action, ChangeAction::Create);
    assert_eq!(entry.status, ChangeStatus::Success);
    assert_eq!(entry.operator_type, OperatorType::ApiKey);
    assert_eq!(entry.operator_name, "provisioner");
    assert_eq!(entry.zone_id, Some(zone.id));
    assert_eq!(entry.record_id, Some(change.record.id));
    assert_eq!(entry.message, change.outcome.message);

    let after = entry.payload.after.as_ref().unwrap();
    assert_eq!(after["value"], "10.0.0.1");
    assert_eq!(after["type"], "A");
    let output = entry.payload.output.as_ref().unwrap();
    assert!(output["stdout"].as_str().unwrap().contains("update add"));
}

#[tokio::test]
async fn skipped_sync_is_logged_as_skipped() {
    let h = Harness::new();
    let zone = h.zone(false).await;

    h.engine
        .create_record(
            &h.auth,
            RecordRequest::new(zone.id, "www", "A", "10.0.0.1"),
            SyncMode::Immediate,
        )
        .await
        .unwrap();

    let logs = h.change_logs().await;
    assert_eq!(logs[0].status, ChangeStatus::Skipped);
    assert!(logs[0].payload.output.is_none());
}

#[tokio::test]
async fn update_entry_has_before_and_after() {
    let h = Harness::new();
    let zone = h.zone(true).await;
    let record = h.a_record(&zone, "www", "10.0.0.1").await;

    h.engine
        .update_record(&h.auth, record.id, RecordPatch::value("10.0.0.2"), SyncMode::Immediate)
        .await
        .unwrap();

    let logs = h.change_logs().await;
    let payload = &logs[0].payload;
    assert_eq!(payload.before.as_ref().unwrap()["value"], "10.0.0.1");
    assert_eq!(payload.after.as_ref().unwrap()["value"], "10.0.0.2");
}

#[tokio::test]
async fn log_failure_does_not_affect_mutation() {
    let h = Harness::with_store(Arc::new(FaultyStore::failing_change_logs()));
    let zone = h.zone(true).await;

    let change = h
        .engine
        .create_record(
            &h.auth,
            RecordRequest::new(zone.id, "www", "A", "10.0.0.1"),
            SyncMode::Immediate,
        )
        .await
        .unwrap();

    assert_eq!(change.record.last_sync_status, SyncStatus::Success);
    assert!(h.store.get_record(change.record.id).await.unwrap().is_some());
    assert!(h.change_logs().await.is_empty());
}

#[tokio::test]
async fn queries_filter_and_limit() {
    let h = Harness::new();
    let zone = h.zone(true).await;
    let www = h.a_record(&zone, "www", "10.0.0.1").await;
    let api = h.a_record(&zone, "api", "10.0.0.2").await;
    for value in ["10.0.0.3", "10.0.0.4", "10.0.0.5"] {
        h.engine
            .update_record(&h.auth, www.id, RecordPatch::value(value), SyncMode::Immediate)
            .await
            .unwrap();
    }

    let by_record = h
        .engine
        .list_change_logs(
            &h.auth,
            &ChangeLogQuery {
                record_id: Some(www.id),
                ..ChangeLogQuery::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(by_record.len(), 4);
    assert!(by_record.windows(2).all(|w| w[0].id > w[1].id));

    let by_zone = h
        .engine
        .list_change_logs(
            &h.auth,
            &ChangeLogQuery {
                zone_id: Some(zone.id),
                limit: Some(2),
                ..ChangeLogQuery::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(by_zone.len(), 2);

    let api_only = h
        .engine
        .list_change_logs(
            &h.auth,
            &ChangeLogQuery {
                record_id: Some(api.id),
                ..ChangeLogQuery::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(api_only.len(), 1);
}

#[tokio::test]
async fn system_operations_are_attributed_to_system() {
    let h = Harness::new();
    let zone = h.zone(true).await;
    let record = h.a_record(&zone, "www", "10.0.0.1").await;

    h.engine
        .resync_record(&AuthContext::system(), record.id)
        .await
        .unwrap();

    let logs = h.change_logs().await;
    assert_eq!(logs[0].operator_type, OperatorType::System);
    assert_eq!(logs[0].operator_name, "system");
}
