// # BIND Integration
//
// This crate connects the dnsync engine to a BIND nameserver.
//
// ## Components
//
// - `NsupdateClient`: `UpdateClient` that pipes RFC 2136 scripts into `nsupdate`
// - `BindForwardConfig`: `ForwardConfigSink` that writes the forwarding
//   include file and runs `rndc reconfig`
//
// ## Constraints
//
// - One call delivers one script; no retry logic (owned by SyncEngine)
// - Every child process runs under a timeout and is killed when it elapses
// - Failures are reported as outcomes, never as errors
// - TSIG secrets NEVER appear in logs
// - Dry-run mode logs what would happen and spawns nothing
//
// ## Security Requirements
//
// The TSIG secret is passed to nsupdate with `-y algorithm:name:secret`,
// which exposes it in the process table for the lifetime of the call.
// Hosts where that matters should restrict process visibility
// (`hidepid`) for the service user.

pub mod forwarders;
pub mod nsupdate;
pub mod process;

pub use forwarders::BindForwardConfig;
pub use nsupdate::NsupdateClient;
