//! nsupdate update client
//!
//! Delivers one script per call by spawning `nsupdate` and writing the
//! script to its stdin. TSIG credentials go on the command line (`-y`) and
//! are never logged.

use std::time::Duration;

use async_trait::async_trait;
use dnsync_core::config::NsupdateConfig;
use dnsync_core::protocol::UpdateScript;
use dnsync_core::traits::{ExecOutcome, UpdateClient};

use crate::process;

/// nsupdate-backed [`UpdateClient`]
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the client will:
/// - Log the script it would send (without the signing key)
/// - Echo the script as stdout
/// - **NOT** spawn nsupdate or contact the nameserver
#[derive(Debug, Clone)]
pub struct NsupdateClient {
    /// Binary to execute
    binary: String,

    /// Report success without spawning
    dry_run: bool,

    /// Upper bound on one call
    timeout: Duration,

    /// Pass `-v` (virtual circuit, i.e. TCP)
    use_tcp: bool,
}

impl NsupdateClient {
    /// Create a client with explicit settings
    pub fn new(binary: impl Into<String>, timeout: Duration, dry_run: bool) -> Self {
        Self {
            binary: binary.into(),
            dry_run,
            timeout,
            use_tcp: false,
        }
    }

    /// Create a client from configuration
    pub fn from_config(config: &NsupdateConfig) -> Self {
        if config.dry_run {
            tracing::warn!("nsupdate client running in DRY-RUN mode - no changes will be made");
        }
        Self {
            binary: config.binary.clone(),
            dry_run: config.dry_run,
            timeout: Duration::from_secs(config.timeout_secs),
            use_tcp: config.use_tcp,
        }
    }

    /// Send updates over TCP instead of UDP
    pub fn with_tcp(mut self, use_tcp: bool) -> Self {
        self.use_tcp = use_tcp;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Command-line arguments for one script
    ///
    /// ⚠️ Contains the TSIG secret when the script is signed.
    fn arguments(&self, script: &UpdateScript) -> Vec<String> {
        let mut args = Vec::new();
        if self.use_tcp {
            args.push("-v".to_string());
        }
        if let Some(signing) = script.signing_argument() {
            args.push("-y".to_string());
            args.push(signing);
        }
        args
    }
}

#[async_trait]
impl UpdateClient for NsupdateClient {
    async fn submit(&self, script: &UpdateScript) -> ExecOutcome {
        tracing::debug!(
            "Submitting update for zone {} to {} [signed: {}, mode: {}]",
            script.zone,
            script.server,
            script.is_signed(),
            if self.dry_run { "DRY-RUN" } else { "LIVE" }
        );

        if self.dry_run {
            tracing::info!("[DRY-RUN] Would send to {}:\n{}", script.server, script.text());
            return ExecOutcome::succeeded(script.text(), "");
        }

        process::run(&self.binary, &self.arguments(script), Some(script.text()), self.timeout).await
    }

    fn client_name(&self) -> &'static str {
        "nsupdate"
    }
}
