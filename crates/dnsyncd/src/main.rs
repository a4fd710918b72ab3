// # dnsyncd - dnsync operator daemon
//
// CRITICAL RULES:
// - This is a THIN integration layer ONLY
// - DO NOT add business logic, DNS logic, or retry logic here
// - All sync logic MUST be in dnsync-core
// - Configuration is via environment variables ONLY
//
// The dnsyncd binary is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing logging and the runtime
// 3. Opening the store and wiring the BIND integration into a SyncEngine
// 4. Running one operator command and reporting the result
//
// ## Commands
//
// - `check`: validate configuration, open the store, report sync state
// - `resync`: re-sync every record whose last sync is pending or failed
// - `resync --all`: re-sync every record
// - `forwarders`: regenerate the forwarding configuration and reload
//
// ## Configuration
//
// ### Store
// - `DNSYNC_STORE_TYPE`: file (default) or memory
// - `DNSYNC_STORE_PATH`: Path to the state file (for file store)
//
// ### nsupdate
// - `DNSYNC_NSUPDATE_BIN`: Binary to run (default: nsupdate)
// - `DNSYNC_NSUPDATE_DRY_RUN`: Echo scripts instead of sending them
// - `DNSYNC_NSUPDATE_TIMEOUT_SECS`: Upper bound on one update call
// - `DNSYNC_NSUPDATE_TCP`: Send updates over TCP
//
// ### Forwarding
// - `DNSYNC_FORWARD_CONFIG_PATH`: Include file for forward zones
// - `DNSYNC_RELOAD_COMMAND`: Space-separated reload command (default: rndc reconfig)
// - `DNSYNC_FORWARD_DRY_RUN`: Render without writing or reloading
//
// ### Engine
// - `DNSYNC_MAX_RETRIES`: Extra attempts after a transient failure
// - `DNSYNC_RETRY_DELAY_MS`: Delay between attempts
//
// ### Logging
// - `DNSYNC_LOG_LEVEL`: trace, debug, info, warn, error
//
// ## Example
//
// ```bash
// export DNSYNC_STORE_PATH=/var/lib/dnsync/state.json
// export DNSYNC_NSUPDATE_DRY_RUN=true
//
// dnsyncd resync
// ```

use anyhow::{Context, Result};
use dnsync_bind::{BindForwardConfig, NsupdateClient};
use dnsync_core::model::{RecordQuery, SyncStatus};
use dnsync_core::{
    AuthContext, DnsyncConfig, FileStore, MemoryStore, Store, StoreConfig, SyncEngine,
};
use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Command completed
/// - 1: Configuration or startup error
/// - 2: Runtime error, including failed syncs
#[derive(Debug, Clone, Copy)]
enum DnsyncExitCode {
    /// Command completed
    Success = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (store failure, failed syncs)
    RuntimeError = 2,
}

impl From<DnsyncExitCode> for ExitCode {
    fn from(code: DnsyncExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Operator command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Check,
    Resync { all: bool },
    Forwarders,
}

impl Command {
    fn parse<I: IntoIterator<Item = String>>(args: I) -> Result<Self> {
        let args: Vec<String> = args.into_iter().collect();
        let words: Vec<&str> = args.iter().map(String::as_str).collect();
        match words.as_slice() {
            [] | ["check"] => Ok(Command::Check),
            ["resync"] => Ok(Command::Resync { all: false }),
            ["resync", "--all"] => Ok(Command::Resync { all: true }),
            ["forwarders"] => Ok(Command::Forwarders),
            _ => anyhow::bail!(
                "Unknown command '{}'. Usage: dnsyncd [check | resync [--all] | forwarders]",
                words.join(" ")
            ),
        }
    }
}

/// Application configuration
struct Config {
    dnsync: DnsyncConfig,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut dnsync = DnsyncConfig::new();

        let store_type = lookup("DNSYNC_STORE_TYPE").unwrap_or_else(|| "file".to_string());
        dnsync.store = match store_type.as_str() {
            "file" => StoreConfig::File {
                path: lookup("DNSYNC_STORE_PATH")
                    .unwrap_or_else(|| "/var/lib/dnsync/state.json".to_string()),
            },
            "memory" => StoreConfig::Memory,
            other => anyhow::bail!(
                "DNSYNC_STORE_TYPE '{}' is not supported. Supported types: file, memory",
                other
            ),
        };

        if let Some(binary) = lookup("DNSYNC_NSUPDATE_BIN") {
            dnsync.nsupdate.binary = binary;
        }
        if let Some(value) = lookup("DNSYNC_NSUPDATE_DRY_RUN") {
            dnsync.nsupdate.dry_run = parse_flag("DNSYNC_NSUPDATE_DRY_RUN", &value)?;
        }
        if let Some(value) = lookup("DNSYNC_NSUPDATE_TIMEOUT_SECS") {
            dnsync.nsupdate.timeout_secs = value
                .parse()
                .with_context(|| format!("DNSYNC_NSUPDATE_TIMEOUT_SECS must be a number. Got: {}", value))?;
        }
        if let Some(value) = lookup("DNSYNC_NSUPDATE_TCP") {
            dnsync.nsupdate.use_tcp = parse_flag("DNSYNC_NSUPDATE_TCP", &value)?;
        }

        if let Some(path) = lookup("DNSYNC_FORWARD_CONFIG_PATH") {
            dnsync.forwarding.config_path = path;
        }
        if let Some(command) = lookup("DNSYNC_RELOAD_COMMAND") {
            dnsync.forwarding.reload_command =
                command.split_whitespace().map(str::to_string).collect();
        }
        if let Some(value) = lookup("DNSYNC_FORWARD_DRY_RUN") {
            dnsync.forwarding.dry_run = parse_flag("DNSYNC_FORWARD_DRY_RUN", &value)?;
        }

        if let Some(value) = lookup("DNSYNC_MAX_RETRIES") {
            dnsync.engine.max_retries = value
                .parse()
                .with_context(|| format!("DNSYNC_MAX_RETRIES must be a number. Got: {}", value))?;
        }
        if let Some(value) = lookup("DNSYNC_RETRY_DELAY_MS") {
            dnsync.engine.retry_delay_ms = value
                .parse()
                .with_context(|| format!("DNSYNC_RETRY_DELAY_MS must be a number. Got: {}", value))?;
        }

        Ok(Self {
            dnsync,
            log_level: lookup("DNSYNC_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        self.dnsync.validate()?;

        if let StoreConfig::File { path } = &self.dnsync.store
            && let Some(parent) = std::path::Path::new(path).parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            anyhow::bail!(
                "DNSYNC_STORE_PATH parent directory does not exist: {}. \
                    Create it first: sudo mkdir -p {}",
                parent.display(),
                parent.display()
            );
        }

        self.level()?;
        Ok(())
    }

    fn level(&self) -> Result<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            _ => anyhow::bail!(
                "DNSYNC_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => anyhow::bail!("{} must be true or false. Got: {}", key, value),
    }
}

fn main() -> ExitCode {
    let command = match Command::parse(env::args().skip(1)) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{}", e);
            return DnsyncExitCode::ConfigError.into();
        }
    };

    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return DnsyncExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return DnsyncExitCode::ConfigError.into();
    }

    // Initialize tracing
    let log_level = config.level().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DnsyncExitCode::ConfigError.into();
    }

    info!("Starting dnsyncd ({:?})", command);
    info!("Store: {}", config.dnsync.store.type_name());

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DnsyncExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run(config, command).await {
            error!("dnsyncd error: {:#}", e);
            DnsyncExitCode::RuntimeError
        } else {
            DnsyncExitCode::Success
        }
    });

    result.into()
}

/// Wire the engine and run one command
async fn run(config: Config, command: Command) -> Result<()> {
    let store: Arc<dyn Store> = match &config.dnsync.store {
        StoreConfig::File { path } => Arc::new(
            FileStore::open(path)
                .await
                .with_context(|| format!("Failed to open store at {}", path))?,
        ),
        StoreConfig::Memory => {
            warn!("Using in-memory store; nothing will be persisted");
            Arc::new(MemoryStore::new())
        }
    };

    let client = Arc::new(NsupdateClient::from_config(&config.dnsync.nsupdate));
    let sink = Arc::new(BindForwardConfig::from_config(&config.dnsync.forwarding));
    let engine = SyncEngine::new(store, client, sink, &config.dnsync.engine)?;
    let auth = AuthContext::system();

    let result = match command {
        Command::Check => check(&engine).await,
        Command::Resync { all } => resync(&engine, &auth, all).await,
        Command::Forwarders => forwarders(&engine, &auth).await,
    };

    engine.shutdown().await?;
    result
}

/// Report zones and records by sync status
async fn check(engine: &SyncEngine) -> Result<()> {
    let store = engine.store();
    let zones = store.list_zones().await?;
    let records = store
        .list_records(&RecordQuery {
            zone_id: None,
            include_inactive: true,
        })
        .await?;
    let forward_zones = store.list_forward_zones().await?;

    for zone in &zones {
        let count = records.iter().filter(|r| r.zone_id == zone.id).count();
        info!(
            "Zone {} -> {}:{} ({} record(s), {}{})",
            zone.name,
            zone.server_host,
            zone.server_port,
            count,
            if zone.active { "active" } else { "disabled" },
            if zone.tsig_key_name.is_empty() { "" } else { ", signed" }
        );
    }

    let unsynced = records
        .iter()
        .filter(|r| matches!(r.last_sync_status, SyncStatus::Pending | SyncStatus::Failed))
        .count();
    info!(
        "{} zone(s), {} record(s), {} forward zone(s); {} record(s) pending or failed",
        zones.len(),
        records.len(),
        forward_zones.len(),
        unsynced
    );
    if unsynced > 0 {
        warn!("Run `dnsyncd resync` to retry pending and failed records");
    }
    Ok(())
}

async fn resync(engine: &SyncEngine, auth: &AuthContext, all: bool) -> Result<()> {
    let changes = if all {
        engine.resync_all(auth).await?
    } else {
        engine.resync_pending(auth).await?
    };

    let failed: Vec<_> = changes.iter().filter(|c| c.outcome.is_failed()).collect();
    info!(
        "Re-synced {} record(s): {} failed",
        changes.len(),
        failed.len()
    );
    for change in &failed {
        warn!("Record {}: {}", change.record.id, change.outcome.message);
    }

    if !failed.is_empty() {
        anyhow::bail!("{} record(s) failed to sync", failed.len());
    }
    Ok(())
}

async fn forwarders(engine: &SyncEngine, auth: &AuthContext) -> Result<()> {
    let outcome = engine.resync_forward_zones(auth).await?;
    if outcome.is_failed() {
        anyhow::bail!("{}", outcome.message);
    }
    info!("{}", outcome.message);
    Ok(())
}
