//! Contract Test: Forward Zones
//!
//! Constraints verified:
//! - Every accepted mutation regenerates the whole forwarding config
//! - Inactive forward zones are left out of the rendered config
//! - A failed reload is reported but the row change stands
//! - Forward zone names are unique
//! - Forward zones never trigger dynamic updates

mod common;

use common::*;
use dnsync_core::model::{
    ChangeAction, ChangeStatus, ForwardZonePatch, ForwardZoneRequest, SyncStatus,
};
use dnsync_core::{AuthContext, Error, Permission};

#[tokio::test]
async fn create_regenerates_config() {
    let h = Harness::new();

    let change = h
        .engine
        .create_forward_zone(
            &h.auth,
            ForwardZoneRequest::new("Corp.Internal.", ["10.1.0.1", "10.1.0.2"]),
        )
        .await
        .unwrap();

    assert_eq!(change.forward_zone.name, "corp.internal");
    assert_eq!(change.outcome.status, SyncStatus::Success);
    assert_eq!(
        change.outcome.message,
        "Forwarding config regenerated with 1 zone(s)"
    );

    let rendered = h.sink.last().unwrap();
    assert!(rendered.contains("zone \"corp.internal\" {"));
    assert!(rendered.contains("forwarders { 10.1.0.1; 10.1.0.2; };"));
    assert_eq!(h.client.call_count(), 0, "no dynamic update");
}

#[tokio::test]
async fn config_contains_every_active_zone() {
    let h = Harness::new();
    h.engine
        .create_forward_zone(&h.auth, ForwardZoneRequest::new("corp.internal", ["10.1.0.1"]))
        .await
        .unwrap();
    h.engine
        .create_forward_zone(
            &h.auth,
            ForwardZoneRequest::new("lab.internal", ["10.2.0.1"]).with_policy("first"),
        )
        .await
        .unwrap();

    let rendered = h.sink.last().unwrap();
    assert!(rendered.contains("zone \"corp.internal\""));
    assert!(rendered.contains("zone \"lab.internal\""));
    assert!(rendered.contains("forward first;"));
    assert_eq!(h.sink.rendered().len(), 2);
}

#[tokio::test]
async fn deactivated_zone_is_omitted() {
    let h = Harness::new();
    let change = h
        .engine
        .create_forward_zone(&h.auth, ForwardZoneRequest::new("corp.internal", ["10.1.0.1"]))
        .await
        .unwrap();

    let patch = ForwardZonePatch {
        active: Some(false),
        ..ForwardZonePatch::default()
    };
    let updated = h
        .engine
        .update_forward_zone(&h.auth, change.forward_zone.id, patch)
        .await
        .unwrap();

    assert!(!updated.forward_zone.active);
    assert_eq!(
        updated.outcome.message,
        "Forwarding config regenerated with 0 zone(s)"
    );
    assert!(!h.sink.last().unwrap().contains("corp.internal"));
}

#[tokio::test]
async fn delete_regenerates_config() {
    let h = Harness::new();
    let change = h
        .engine
        .create_forward_zone(&h.auth, ForwardZoneRequest::new("corp.internal", ["10.1.0.1"]))
        .await
        .unwrap();

    h.engine
        .delete_forward_zone(&h.auth, change.forward_zone.id)
        .await
        .unwrap();

    assert!(!h.sink.last().unwrap().contains("corp.internal"));
    let err = h
        .engine
        .get_forward_zone(&h.auth, change.forward_zone.id)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn failed_reload_keeps_the_row() {
    let h = Harness::new();
    h.sink.fail(true);

    let change = h
        .engine
        .create_forward_zone(&h.auth, ForwardZoneRequest::new("corp.internal", ["10.1.0.1"]))
        .await
        .unwrap();

    assert_eq!(change.outcome.status, SyncStatus::Failed);
    assert!(
        change
            .outcome
            .message
            .starts_with("Failed to regenerate forwarding config")
    );
    assert!(change.outcome.stderr.contains("connection refused"));
    assert_eq!(h.engine.list_forward_zones(&h.auth).await.unwrap().len(), 1);

    let logs = h.change_logs().await;
    assert_eq!(logs[0].action, ChangeAction::Create);
    assert_eq!(logs[0].status, ChangeStatus::Failed);
}

#[tokio::test]
async fn resync_recovers_after_failed_reload() {
    let h = Harness::new();
    h.sink.fail(true);
    h.engine
        .create_forward_zone(&h.auth, ForwardZoneRequest::new("corp.internal", ["10.1.0.1"]))
        .await
        .unwrap();
    h.sink.fail(false);

    let outcome = h.engine.resync_forward_zones(&h.auth).await.unwrap();

    assert_eq!(outcome.status, SyncStatus::Success);
    assert!(h.sink.last().unwrap().contains("corp.internal"));
    let logs = h.change_logs().await;
    assert_eq!(logs[0].action, ChangeAction::Sync);
    assert_eq!(logs[0].status, ChangeStatus::Success);
}

#[tokio::test]
async fn duplicate_name_is_a_conflict() {
    let h = Harness::new();
    h.engine
        .create_forward_zone(&h.auth, ForwardZoneRequest::new("corp.internal", ["10.1.0.1"]))
        .await
        .unwrap();

    let err = h
        .engine
        .create_forward_zone(&h.auth, ForwardZoneRequest::new("corp.internal.", ["10.9.0.1"]))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Conflict(_)));
    assert_eq!(h.sink.rendered().len(), 1);
}

#[tokio::test]
async fn invalid_forwarders_are_rejected() {
    let h = Harness::new();

    for request in [
        ForwardZoneRequest::new("corp.internal", Vec::<String>::new()),
        ForwardZoneRequest::new("corp.internal", ["fd00::1"]),
        ForwardZoneRequest::new("corp.internal", ["10.1.0.1"]).with_policy("sometimes"),
    ] {
        let err = h
            .engine
            .create_forward_zone(&h.auth, request)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)), "got {:?}", err);
    }
    assert!(h.sink.rendered().is_empty());
    assert!(h.change_logs().await.is_empty());
}

#[tokio::test]
async fn read_only_key_cannot_regenerate() {
    let h = Harness::new();
    let reader = AuthContext::api_key("monitoring", &[Permission::Read]);

    let err = h.engine.resync_forward_zones(&reader).await.unwrap_err();

    assert!(matches!(err, Error::Forbidden(_)));
    assert!(h.sink.rendered().is_empty());
}
