//! Core traits for the dnsync engine
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`UpdateClient`]: Deliver update scripts to a nameserver
//! - [`ForwardConfigSink`]: Install regenerated forwarding configuration
//! - [`Store`]: Persisted zones, records, forward zones and change log

pub mod forward_sink;
pub mod store;
pub mod update_client;

pub use forward_sink::ForwardConfigSink;
pub use store::Store;
pub use update_client::{ExecOutcome, FailureKind, UpdateClient};
