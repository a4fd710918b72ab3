// # Update Client Trait
//
// Defines the interface for delivering update scripts to a nameserver.
//
// ## Implementations
//
// - nsupdate process: `dnsync-bind` crate
// - Test doubles: `tests/common` in this crate
//
// ## Usage
//
// ```rust,ignore
// use dnsync_core::protocol::{UpdateOperation, UpdateScript};
// use dnsync_core::UpdateClient;
//
// let script = UpdateScript::build(&zone.endpoint(), &UpdateOperation::Add(record.tuple()));
// let outcome = client.submit(&script).await;
// if !outcome.success {
//     eprintln!("update failed: {}", outcome.stderr);
// }
// ```

use async_trait::async_trait;

use crate::protocol::UpdateScript;

/// Response codes that mean the nameserver understood and refused the update
const REJECTION_MARKERS: &[&str] = &[
    "REFUSED", "NOTAUTH", "NOTZONE", "YXDOMAIN", "YXRRSET", "NXRRSET", "NXDOMAIN", "FORMERR",
    "BADKEY", "BADSIG", "BADTIME", "syntax error", "bad key",
];

/// Why an update attempt failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Timeouts, spawn errors, unreachable servers; worth retrying
    Transient,
    /// The nameserver or client rejected the update; retrying will not help
    Rejected,
}

impl FailureKind {
    /// Classify a failure from the client's diagnostic output
    pub fn from_diagnostics(stdout: &str, stderr: &str) -> Self {
        let rejected = REJECTION_MARKERS
            .iter()
            .any(|marker| stderr.contains(marker) || stdout.contains(marker));
        if rejected {
            FailureKind::Rejected
        } else {
            FailureKind::Transient
        }
    }
}

/// Result of running one update script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOutcome {
    /// `true` iff the client exited with status zero
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    /// Set on failure only
    pub failure: Option<FailureKind>,
}

impl ExecOutcome {
    pub fn succeeded(stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            success: true,
            stdout: stdout.into(),
            stderr: stderr.into(),
            failure: None,
        }
    }

    /// A failed run, classified from its output
    pub fn failed(stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        let stdout = stdout.into();
        let stderr = stderr.into();
        let failure = FailureKind::from_diagnostics(&stdout, &stderr);
        Self {
            success: false,
            stdout,
            stderr,
            failure: Some(failure),
        }
    }

    /// A failed run with an explicit classification
    pub fn failed_with(kind: FailureKind, stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr: stderr.into(),
            failure: Some(kind),
        }
    }

    pub fn is_transient(&self) -> bool {
        self.failure == Some(FailureKind::Transient)
    }

    /// First non-empty diagnostic line, for short messages
    pub fn summary(&self) -> &str {
        self.stderr
            .lines()
            .chain(self.stdout.lines())
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or("no diagnostic output")
    }
}

/// Trait for update client implementations
///
/// # Contract
///
/// - One call delivers one script in one transaction
/// - Never returns an error: spawn failures, timeouts and non-zero exits
///   are all reported as a failed [`ExecOutcome`]
/// - No retry logic (owned by `SyncEngine`)
/// - The signing secret must never be logged
#[async_trait]
pub trait UpdateClient: Send + Sync {
    /// Deliver one update script and wait for the result
    async fn submit(&self, script: &UpdateScript) -> ExecOutcome;

    /// Client name (for logging/debugging)
    fn client_name(&self) -> &'static str;
}
