//! Test doubles and common utilities for contract tests
//!
//! The doubles record what the engine asked of them and answer with
//! scripted outcomes, so tests can assert on exact protocol traffic without
//! a nameserver.

#![allow(dead_code)]

use async_trait::async_trait;
use dnsync_core::error::{Error, Result};
use dnsync_core::model::{
    ChangeLog, ChangeLogQuery, ForwardZone, ForwardZoneSpec, NewChangeLog, Record, RecordQuery,
    RecordRequest, RecordSpec, Zone, ZoneRequest, ZoneSpec,
};
use dnsync_core::protocol::UpdateScript;
use dnsync_core::traits::{ExecOutcome, FailureKind, ForwardConfigSink, Store, UpdateClient};
use dnsync_core::{AuthContext, EngineConfig, MemoryStore, SyncEngine, SyncMode};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Update client that records every script and answers from a queue
///
/// An empty queue answers with success, echoing the script like a dry run.
#[derive(Clone, Default)]
pub struct RecordingClient {
    scripts: Arc<Mutex<Vec<UpdateScript>>>,
    responses: Arc<Mutex<VecDeque<ExecOutcome>>>,
}

impl RecordingClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the outcome of the next call
    pub fn respond_with(&self, outcome: ExecOutcome) {
        self.responses.lock().unwrap().push_back(outcome);
    }

    /// Queue a rejection (not retried by the engine)
    pub fn reject_next(&self, stderr: &str) {
        self.respond_with(ExecOutcome::failed_with(FailureKind::Rejected, stderr));
    }

    /// Queue a transient failure (retried by the engine)
    pub fn time_out_next(&self) {
        self.respond_with(ExecOutcome::failed_with(
            FailureKind::Transient,
            "nsupdate timed out after 30s",
        ));
    }

    pub fn scripts(&self) -> Vec<UpdateScript> {
        self.scripts.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.scripts.lock().unwrap().len()
    }

    pub fn last_script(&self) -> Option<String> {
        self.scripts
            .lock()
            .unwrap()
            .last()
            .map(|s| s.text().to_string())
    }
}

#[async_trait]
impl UpdateClient for RecordingClient {
    async fn submit(&self, script: &UpdateScript) -> ExecOutcome {
        self.scripts.lock().unwrap().push(script.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| ExecOutcome::succeeded(script.text(), ""))
    }

    fn client_name(&self) -> &'static str {
        "recording"
    }
}

/// Forward sink that records every rendered configuration
#[derive(Clone, Default)]
pub struct RecordingSink {
    rendered: Arc<Mutex<Vec<String>>>,
    fail: Arc<Mutex<bool>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent apply fail
    pub fn fail(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }

    pub fn rendered(&self) -> Vec<String> {
        self.rendered.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<String> {
        self.rendered.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ForwardConfigSink for RecordingSink {
    async fn apply(&self, rendered: &str) -> ExecOutcome {
        self.rendered.lock().unwrap().push(rendered.to_string());
        if *self.fail.lock().unwrap() {
            ExecOutcome::failed("", "rndc: connect failed: 127.0.0.1#953: connection refused")
        } else {
            ExecOutcome::succeeded("", "")
        }
    }

    fn sink_name(&self) -> &'static str {
        "recording"
    }
}

/// Memory store with switchable write failures; everything else delegates
#[derive(Clone, Default)]
pub struct FaultyStore {
    inner: MemoryStore,
    fail_change_logs: bool,
    fail_record_deletes: bool,
}

impl FaultyStore {
    /// Every change-log append fails
    pub fn failing_change_logs() -> Self {
        Self {
            fail_change_logs: true,
            ..Self::default()
        }
    }

    /// Every record delete fails
    pub fn failing_record_deletes() -> Self {
        Self {
            fail_record_deletes: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl Store for FaultyStore {
    async fn insert_zone(&self, spec: ZoneSpec) -> Result<Zone> {
        self.inner.insert_zone(spec).await
    }

    async fn update_zone(&self, zone: &Zone) -> Result<()> {
        self.inner.update_zone(zone).await
    }

    async fn delete_zone(&self, id: u64) -> Result<()> {
        self.inner.delete_zone(id).await
    }

    async fn get_zone(&self, id: u64) -> Result<Option<Zone>> {
        self.inner.get_zone(id).await
    }

    async fn find_zone_by_name(&self, name: &str) -> Result<Option<Zone>> {
        self.inner.find_zone_by_name(name).await
    }

    async fn list_zones(&self) -> Result<Vec<Zone>> {
        self.inner.list_zones().await
    }

    async fn count_zone_records(&self, zone_id: u64) -> Result<usize> {
        self.inner.count_zone_records(zone_id).await
    }

    async fn insert_record(&self, spec: RecordSpec) -> Result<Record> {
        self.inner.insert_record(spec).await
    }

    async fn update_record(&self, record: &Record, expected_version: u64) -> Result<Record> {
        self.inner.update_record(record, expected_version).await
    }

    async fn delete_record(&self, id: u64) -> Result<()> {
        if self.fail_record_deletes {
            return Err(Error::store("records table is read-only"));
        }
        self.inner.delete_record(id).await
    }

    async fn get_record(&self, id: u64) -> Result<Option<Record>> {
        self.inner.get_record(id).await
    }

    async fn list_records(&self, query: &RecordQuery) -> Result<Vec<Record>> {
        self.inner.list_records(query).await
    }

    async fn insert_forward_zone(&self, spec: ForwardZoneSpec) -> Result<ForwardZone> {
        self.inner.insert_forward_zone(spec).await
    }

    async fn update_forward_zone(&self, zone: &ForwardZone) -> Result<()> {
        self.inner.update_forward_zone(zone).await
    }

    async fn delete_forward_zone(&self, id: u64) -> Result<()> {
        self.inner.delete_forward_zone(id).await
    }

    async fn get_forward_zone(&self, id: u64) -> Result<Option<ForwardZone>> {
        self.inner.get_forward_zone(id).await
    }

    async fn find_forward_zone_by_name(&self, name: &str) -> Result<Option<ForwardZone>> {
        self.inner.find_forward_zone_by_name(name).await
    }

    async fn list_forward_zones(&self) -> Result<Vec<ForwardZone>> {
        self.inner.list_forward_zones().await
    }

    async fn append_change_log(&self, entry: NewChangeLog) -> Result<ChangeLog> {
        if self.fail_change_logs {
            return Err(Error::store("change_logs table is locked"));
        }
        self.inner.append_change_log(entry).await
    }

    async fn list_change_logs(&self, query: &ChangeLogQuery) -> Result<Vec<ChangeLog>> {
        self.inner.list_change_logs(query).await
    }

    async fn flush(&self) -> Result<()> {
        self.inner.flush().await
    }
}

/// Engine wired to recording doubles, plus handles to inspect them
pub struct Harness {
    pub engine: SyncEngine,
    pub store: Arc<dyn Store>,
    pub client: RecordingClient,
    pub sink: RecordingSink,
    pub auth: AuthContext,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    pub fn with_store(store: Arc<dyn Store>) -> Self {
        let client = RecordingClient::new();
        let sink = RecordingSink::new();
        let config = EngineConfig {
            max_retries: 1,
            retry_delay_ms: 0,
        };
        let engine = SyncEngine::new(
            store.clone(),
            Arc::new(client.clone()),
            Arc::new(sink.clone()),
            &config,
        )
        .unwrap();

        Self {
            engine,
            store,
            client,
            sink,
            auth: AuthContext::session("alice"),
        }
    }

    /// `example.com` served by 10.0.0.53:53 without TSIG
    pub async fn zone(&self, active: bool) -> Zone {
        self.engine
            .create_zone(
                &self.auth,
                ZoneRequest::new("example.com", "10.0.0.53", 53).with_active(active),
            )
            .await
            .unwrap()
    }

    /// Active A record created with immediate sync
    pub async fn a_record(&self, zone: &Zone, name: &str, value: &str) -> Record {
        self.engine
            .create_record(
                &self.auth,
                RecordRequest::new(zone.id, name, "A", value).with_ttl(300),
                SyncMode::Immediate,
            )
            .await
            .unwrap()
            .record
    }

    pub async fn change_logs(&self) -> Vec<ChangeLog> {
        self.store
            .list_change_logs(&ChangeLogQuery::default())
            .await
            .unwrap()
    }
}
