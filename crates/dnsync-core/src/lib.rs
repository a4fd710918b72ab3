// # dnsync-core
//
// Core library for keeping a nameserver in step with a DNS record database.
//
// ## Architecture Overview
//
// This library provides the core functionality for RFC 2136 synchronization:
// - **Store**: Trait for persisted zones, records, forward zones and change log
// - **UpdateClient**: Trait for delivering update scripts (nsupdate)
// - **ForwardConfigSink**: Trait for installing regenerated forwarding config
// - **SyncEngine**: Orchestrates validate → persist → sync → persist → log
// - **protocol**: Pure construction of update scripts from record tuples
//
// ## Design Principles
//
// 1. **Database first**: The store is the source of truth; the nameserver follows it
// 2. **Intent before effect**: Every sync is preceded by a `pending` write
// 3. **Failures are data**: Sync failures land on the row and in the change log
// 4. **Library-First**: All core functionality can be used as a library
// 5. **Secrets stay inside**: TSIG secrets are never returned on read paths or logged

pub mod auth;
pub mod changelog;
pub mod config;
pub mod engine;
pub mod error;
pub mod forward;
pub mod model;
pub mod protocol;
pub mod state;
pub mod traits;

// Re-export core types for convenience
pub use auth::{AuthContext, Authenticator, Credentials, Permission};
pub use config::{DnsyncConfig, EngineConfig, ForwardingConfig, NsupdateConfig, StoreConfig};
pub use engine::{ForwardZoneChange, RecordChange, SkipReason, SyncAction, SyncEngine, SyncMode};
pub use error::{Error, Result};
pub use state::{FileStore, MemoryStore};
pub use traits::{ExecOutcome, FailureKind, ForwardConfigSink, Store, UpdateClient};
