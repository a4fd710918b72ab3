//! Minimal embedding example for dnsync-core
//!
//! Drives a record through its lifecycle against an in-memory store with
//! the nsupdate client and forwarding sink in dry-run mode, so every script
//! is printed instead of sent.

use std::sync::Arc;

use dnsync_bind::{BindForwardConfig, NsupdateClient};
use dnsync_core::model::{
    ChangeLogQuery, ForwardZoneRequest, RecordPatch, RecordRequest, ZoneRequest,
};
use dnsync_core::{AuthContext, EngineConfig, MemoryStore, Result, SyncEngine, SyncMode};
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let store = Arc::new(MemoryStore::new());
    let client = Arc::new(NsupdateClient::new("nsupdate", Duration::from_secs(10), true));
    let sink = Arc::new(BindForwardConfig::new(
        "/tmp/named.conf.forwarders",
        vec!["rndc".to_string(), "reconfig".to_string()],
        true,
    ));
    let engine = SyncEngine::new(store, client, sink, &EngineConfig::default())?;
    let auth = AuthContext::session("admin");

    let zone = engine
        .create_zone(
            &auth,
            ZoneRequest::new("example.com", "127.0.0.1", 53).with_tsig(
                "hmac-sha256",
                "ddns-key",
                "c2VjcmV0LXNlY3JldA==",
            ),
        )
        .await?;
    println!("zone #{} {} (secret on read: {:?})", zone.id, zone.name, zone.tsig_secret);

    let created = engine
        .create_record(
            &auth,
            RecordRequest::new(zone.id, "www", "A", "192.0.2.10"),
            SyncMode::Immediate,
        )
        .await?;
    println!("create: {}\n{}", created.outcome.message, created.outcome.stdout);

    let id = created.record.id;
    let updated = engine
        .update_record(&auth, id, RecordPatch::value("192.0.2.20"), SyncMode::Immediate)
        .await?;
    println!("update: {}\n{}", updated.outcome.message, updated.outcome.stdout);

    let disabled = engine
        .update_record(&auth, id, RecordPatch::status("inactive"), SyncMode::Immediate)
        .await?;
    println!("disable: {}\n{}", disabled.outcome.message, disabled.outcome.stdout);

    let deleted = engine.delete_record(&auth, id, SyncMode::Immediate).await?;
    println!("delete: {}", deleted.outcome.message);

    let forward = engine
        .create_forward_zone(
            &auth,
            ForwardZoneRequest::new("corp.internal", ["10.1.0.1", "10.1.0.2"]),
        )
        .await?;
    println!("forward zone: {}\n{}", forward.outcome.message, forward.outcome.stdout);

    let logs = engine.list_change_logs(&auth, &ChangeLogQuery::default()).await?;
    println!("change log ({} entries):", logs.len());
    for entry in &logs {
        println!(
            "  #{} {} {} by {}: {}",
            entry.id,
            entry.action.as_str(),
            serde_json::to_string(&entry.status)?,
            entry.operator_name,
            entry.message
        );
    }

    engine.shutdown().await
}
