//! nsupdate script construction
//!
//! Every script has the same shape:
//!
//! ```text
//! server <host> <port>
//! zone <zone>
//! update delete|add ...
//! send
//! ```
//!
//! A replace puts the delete of the prior tuple and the add of the new tuple
//! in one script with one `send`, so the nameserver applies both atomically.

use std::fmt::Write as _;

use super::name::fqdn;
use super::rdata::encode_rdata;
use super::{RecordTuple, TsigKey, ZoneEndpoint};

/// One protocol operation against a zone
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOperation {
    /// `update add <fqdn> <ttl> <type> <rdata>`
    Add(RecordTuple),
    /// `update delete <fqdn> <type> <rdata>`
    Delete(RecordTuple),
    /// Delete of `from` immediately followed by add of `to`
    Replace { from: RecordTuple, to: RecordTuple },
}

impl UpdateOperation {
    /// Lowercase verb for messages and logs
    pub fn verb(&self) -> &'static str {
        match self {
            UpdateOperation::Add(_) => "add",
            UpdateOperation::Delete(_) => "delete",
            UpdateOperation::Replace { .. } => "replace",
        }
    }

    /// The tuple the operation is about: the one added, deleted or replaced into place
    pub fn target(&self) -> &RecordTuple {
        match self {
            UpdateOperation::Add(tuple) | UpdateOperation::Delete(tuple) => tuple,
            UpdateOperation::Replace { to, .. } => to,
        }
    }

    /// The tuple the nameserver holds once the operation succeeds
    pub fn published_after(&self) -> Option<&RecordTuple> {
        match self {
            UpdateOperation::Add(tuple) | UpdateOperation::Replace { to: tuple, .. } => Some(tuple),
            UpdateOperation::Delete(_) => None,
        }
    }
}

/// A rendered update script plus the credentials to sign it with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateScript {
    /// Zone the script updates
    pub zone: String,
    /// `host:port` of the target nameserver
    pub server: String,
    text: String,
    tsig: Option<TsigKey>,
}

impl UpdateScript {
    /// Render the script for one operation
    pub fn build(endpoint: &ZoneEndpoint, operation: &UpdateOperation) -> Self {
        let zone = crate::model::normalize_zone_name(&endpoint.zone);
        let mut text = String::new();

        let _ = writeln!(text, "server {} {}", endpoint.server_host, endpoint.server_port);
        let _ = writeln!(text, "zone {}", zone);

        match operation {
            UpdateOperation::Add(tuple) => push_add(&mut text, tuple, &zone),
            UpdateOperation::Delete(tuple) => push_delete(&mut text, tuple, &zone),
            UpdateOperation::Replace { from, to } => {
                push_delete(&mut text, from, &zone);
                push_add(&mut text, to, &zone);
            }
        }

        text.push_str("send\n");

        Self {
            server: format!("{}:{}", endpoint.server_host, endpoint.server_port),
            zone,
            text,
            tsig: endpoint.tsig.clone(),
        }
    }

    /// The script as written to the update client's stdin
    pub fn text(&self) -> &str {
        &self.text
    }

    /// `algorithm:keyname:secret`, present only when the zone has TSIG
    ///
    /// ⚠️ Contains the secret; never log it.
    pub fn signing_argument(&self) -> Option<String> {
        self.tsig.as_ref().map(TsigKey::argument)
    }

    /// Whether the update will be TSIG-signed
    pub fn is_signed(&self) -> bool {
        self.tsig.is_some()
    }
}

fn push_add(text: &mut String, tuple: &RecordTuple, zone: &str) {
    let _ = writeln!(
        text,
        "update add {} {} {} {}",
        fqdn(&tuple.name, zone),
        tuple.ttl,
        tuple.record_type,
        encode_rdata(tuple, zone)
    );
}

fn push_delete(text: &mut String, tuple: &RecordTuple, zone: &str) {
    let _ = writeln!(
        text,
        "update delete {} {} {}",
        fqdn(&tuple.name, zone),
        tuple.record_type,
        encode_rdata(tuple, zone)
    );
}
