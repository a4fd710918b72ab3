// # Forward Config Sink Trait
//
// Forward zones are never synchronized incrementally. After any forward-zone
// mutation the engine renders the whole forwarding configuration and hands
// it to a sink, which installs it and reloads the nameserver.
//
// ## Implementations
//
// - BIND include file + `rndc reconfig`: `dnsync-bind` crate

use async_trait::async_trait;

use super::update_client::ExecOutcome;

/// Trait for installing a regenerated forwarding configuration
///
/// Same contract as [`UpdateClient`](super::UpdateClient): failures are
/// reported in the outcome, never as errors, and there is no retry logic.
#[async_trait]
pub trait ForwardConfigSink: Send + Sync {
    /// Install the rendered configuration and reload the nameserver
    async fn apply(&self, rendered: &str) -> ExecOutcome;

    /// Sink name (for logging/debugging)
    fn sink_name(&self) -> &'static str;
}
