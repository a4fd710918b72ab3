//! RFC 2136 update-script construction
//!
//! This module is pure: it turns (zone credentials, record tuple) into the
//! text an nsupdate-style client reads on stdin. Executing the script is the
//! job of an [`UpdateClient`](crate::traits::UpdateClient).

pub mod name;
pub mod rdata;
pub mod script;

pub use name::{absolute_target, fqdn};
pub use rdata::{encode_rdata, quote_txt, txt_rdata};
pub use script::{UpdateOperation, UpdateScript};

use serde::{Deserialize, Serialize};

use crate::model::RecordType;

/// TSIG credentials of a zone
#[derive(Clone, PartialEq, Eq)]
pub struct TsigKey {
    pub algorithm: String,
    pub name: String,
    /// ⚠️ NEVER log this value
    pub secret: String,
}

impl TsigKey {
    /// `algorithm:keyname:secret`, the nsupdate `-y` argument
    pub fn argument(&self) -> String {
        format!("{}:{}:{}", self.algorithm, self.name, self.secret)
    }
}

impl std::fmt::Debug for TsigKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TsigKey")
            .field("algorithm", &self.algorithm)
            .field("name", &self.name)
            .field("secret", &"<REDACTED>")
            .finish()
    }
}

/// Everything needed to address a zone's nameserver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneEndpoint {
    pub zone: String,
    pub server_host: String,
    pub server_port: u16,
    /// `None` sends unauthenticated updates
    pub tsig: Option<TsigKey>,
}

/// The (name, type, ttl, value, priority) tuple a record publishes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordTuple {
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: RecordType,
    pub ttl: u32,
    pub value: String,
    pub priority: Option<u16>,
}
