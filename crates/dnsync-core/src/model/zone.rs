//! Zone entity and its inbound request types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::names::{normalize_zone_name, reject_control_chars, validate_domain_name};
use crate::error::{Error, Result};
use crate::protocol::{TsigKey, ZoneEndpoint};

/// Default nameserver port
pub const DEFAULT_DNS_PORT: u16 = 53;

/// TSIG algorithm used when a key is configured without one
pub const DEFAULT_TSIG_ALGORITHM: &str = "hmac-sha256";

/// A DNS zone hosted by one authoritative nameserver
///
/// # Security
///
/// The TSIG secret is stored but never returned by read paths (see
/// [`Zone::redacted`]) and never shown by the `Debug` implementation.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    pub id: u64,
    /// Lowercase, no trailing dot, unique
    pub name: String,
    pub server_host: String,
    pub server_port: u16,
    /// Empty when the zone is updated without TSIG
    pub tsig_key_name: String,
    pub tsig_algorithm: String,
    /// ⚠️ NEVER log this value
    pub tsig_secret: String,
    pub description: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Custom Debug implementation that hides the TSIG secret
impl std::fmt::Debug for Zone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Zone")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .field("tsig_key_name", &self.tsig_key_name)
            .field("tsig_algorithm", &self.tsig_algorithm)
            .field("tsig_secret", &"<REDACTED>")
            .field("active", &self.active)
            .finish()
    }
}

impl Zone {
    /// Build a zone row from a validated spec
    pub fn from_spec(id: u64, spec: ZoneSpec, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: spec.name,
            server_host: spec.server_host,
            server_port: spec.server_port,
            tsig_key_name: spec.tsig_key_name,
            tsig_algorithm: spec.tsig_algorithm,
            tsig_secret: spec.tsig_secret,
            description: spec.description,
            active: spec.active,
            created_at: now,
            updated_at: now,
        }
    }

    /// Copy of this zone with the TSIG secret blanked, for read paths
    pub fn redacted(&self) -> Self {
        Self {
            tsig_secret: String::new(),
            ..self.clone()
        }
    }

    /// Connection and credential data needed to build update scripts
    pub fn endpoint(&self) -> ZoneEndpoint {
        let tsig = if !self.tsig_key_name.is_empty() && !self.tsig_secret.is_empty() {
            Some(TsigKey {
                algorithm: self.tsig_algorithm.clone(),
                name: self.tsig_key_name.clone(),
                secret: self.tsig_secret.clone(),
            })
        } else {
            None
        };

        ZoneEndpoint {
            zone: self.name.clone(),
            server_host: self.server_host.clone(),
            server_port: self.server_port,
            tsig,
        }
    }

    /// Apply a validated spec over this row, keeping identity and creation time
    pub fn apply(&mut self, spec: ZoneSpec, now: DateTime<Utc>) {
        self.name = spec.name;
        self.server_host = spec.server_host;
        self.server_port = spec.server_port;
        self.tsig_key_name = spec.tsig_key_name;
        self.tsig_algorithm = spec.tsig_algorithm;
        self.tsig_secret = spec.tsig_secret;
        self.description = spec.description;
        self.active = spec.active;
        self.updated_at = now;
    }
}

/// Inbound zone payload, as received from callers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ZoneRequest {
    pub name: String,
    pub server_host: String,
    #[serde(default)]
    pub server_port: Option<i64>,
    #[serde(default)]
    pub tsig_key_name: Option<String>,
    #[serde(default)]
    pub tsig_algorithm: Option<String>,
    #[serde(default)]
    pub tsig_secret: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
}

impl ZoneRequest {
    /// Create a request for an active zone without TSIG
    pub fn new(name: impl Into<String>, server_host: impl Into<String>, port: u16) -> Self {
        Self {
            name: name.into(),
            server_host: server_host.into(),
            server_port: Some(i64::from(port)),
            ..Self::default()
        }
    }

    /// Configure TSIG credentials
    pub fn with_tsig(
        mut self,
        algorithm: impl Into<String>,
        key_name: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        self.tsig_algorithm = Some(algorithm.into());
        self.tsig_key_name = Some(key_name.into());
        self.tsig_secret = Some(secret.into());
        self
    }

    /// Enable or disable the zone
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = Some(active);
        self
    }

    /// Validate into a typed zone spec
    pub fn validate(self) -> Result<ZoneSpec> {
        let name = normalize_zone_name(&self.name);
        validate_domain_name(&name)?;

        let server_host = self.server_host.trim().to_string();
        if server_host.is_empty() {
            return Err(Error::validation("Zone server host cannot be empty"));
        }
        reject_control_chars("Zone server host", &server_host)?;
        if server_host.contains(char::is_whitespace) {
            return Err(Error::validation("Zone server host cannot contain whitespace"));
        }

        let server_port = match self.server_port {
            None => DEFAULT_DNS_PORT,
            Some(port) => u16::try_from(port)
                .ok()
                .filter(|p| *p >= 1)
                .ok_or_else(|| {
                    Error::validation(format!("Zone port must be between 1 and 65535. Got: {}", port))
                })?,
        };

        let tsig_key_name = self.tsig_key_name.unwrap_or_default().trim().to_string();
        let tsig_secret = self.tsig_secret.unwrap_or_default().trim().to_string();
        let tsig_algorithm = match self.tsig_algorithm {
            Some(algorithm) => algorithm.trim().to_string(),
            None => DEFAULT_TSIG_ALGORITHM.to_string(),
        };

        if (!tsig_key_name.is_empty() || !tsig_secret.is_empty()) && tsig_algorithm.is_empty() {
            return Err(Error::validation(
                "TSIG algorithm cannot be empty when a TSIG key or secret is set",
            ));
        }

        for (field, value) in [
            ("TSIG key name", &tsig_key_name),
            ("TSIG algorithm", &tsig_algorithm),
            ("TSIG secret", &tsig_secret),
        ] {
            reject_control_chars(field, value)?;
            if value.contains(':') || value.contains(char::is_whitespace) {
                return Err(Error::validation(format!(
                    "{} cannot contain ':' or whitespace",
                    field
                )));
            }
        }

        Ok(ZoneSpec {
            name,
            server_host,
            server_port,
            tsig_key_name,
            tsig_algorithm,
            tsig_secret,
            description: self.description.unwrap_or_default(),
            active: self.active.unwrap_or(true),
        })
    }
}

/// Partial zone update; omitted fields keep their stored value
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ZonePatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub server_host: Option<String>,
    #[serde(default)]
    pub server_port: Option<i64>,
    #[serde(default)]
    pub tsig_key_name: Option<String>,
    #[serde(default)]
    pub tsig_algorithm: Option<String>,
    /// An omitted secret keeps the stored one, since reads never return it
    #[serde(default)]
    pub tsig_secret: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
}

impl ZonePatch {
    /// Merge this patch over a stored zone into a full request
    pub fn merge(self, zone: &Zone) -> ZoneRequest {
        ZoneRequest {
            name: self.name.unwrap_or_else(|| zone.name.clone()),
            server_host: self.server_host.unwrap_or_else(|| zone.server_host.clone()),
            server_port: Some(self.server_port.unwrap_or(i64::from(zone.server_port))),
            tsig_key_name: Some(self.tsig_key_name.unwrap_or_else(|| zone.tsig_key_name.clone())),
            tsig_algorithm: Some(
                self.tsig_algorithm
                    .unwrap_or_else(|| zone.tsig_algorithm.clone()),
            ),
            tsig_secret: Some(self.tsig_secret.unwrap_or_else(|| zone.tsig_secret.clone())),
            description: Some(self.description.unwrap_or_else(|| zone.description.clone())),
            active: Some(self.active.unwrap_or(zone.active)),
        }
    }
}

/// A validated zone, ready to persist
#[derive(Clone, PartialEq, Eq)]
pub struct ZoneSpec {
    pub name: String,
    pub server_host: String,
    pub server_port: u16,
    pub tsig_key_name: String,
    pub tsig_algorithm: String,
    pub tsig_secret: String,
    pub description: String,
    pub active: bool,
}

impl std::fmt::Debug for ZoneSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZoneSpec")
            .field("name", &self.name)
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .field("tsig_key_name", &self.tsig_key_name)
            .field("tsig_secret", &"<REDACTED>")
            .field("active", &self.active)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone(spec: ZoneSpec) -> Zone {
        Zone::from_spec(1, spec, Utc::now())
    }

    #[test]
    fn test_zone_name_is_normalized() {
        let spec = ZoneRequest::new("Example.COM.", "10.0.0.53", 53)
            .validate()
            .unwrap();
        assert_eq!(spec.name, "example.com");
        assert!(spec.active);
        assert_eq!(spec.tsig_algorithm, DEFAULT_TSIG_ALGORITHM);
    }

    #[test]
    fn test_port_range() {
        let mut request = ZoneRequest::new("example.com", "ns1", 53);
        request.server_port = Some(0);
        assert!(matches!(request.clone().validate(), Err(Error::Validation(_))));
        request.server_port = Some(65536);
        assert!(request.clone().validate().is_err());
        request.server_port = Some(65535);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_tsig_requires_algorithm() {
        let request = ZoneRequest::new("example.com", "ns1", 53).with_tsig("", "key", "c2VjcmV0");
        assert!(request.validate().is_err());

        let request = ZoneRequest::new("example.com", "ns1", 53).with_tsig(
            "hmac-sha512",
            "key",
            "c2VjcmV0",
        );
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_endpoint_requires_both_key_and_secret() {
        let mut spec = ZoneRequest::new("example.com", "ns1", 53)
            .with_tsig("hmac-sha256", "key", "c2VjcmV0")
            .validate()
            .unwrap();
        assert!(zone(spec.clone()).endpoint().tsig.is_some());

        spec.tsig_secret.clear();
        assert!(zone(spec).endpoint().tsig.is_none());
    }

    #[test]
    fn test_redaction_and_debug_hide_secret() {
        let spec = ZoneRequest::new("example.com", "ns1", 53)
            .with_tsig("hmac-sha256", "key", "c2VjcmV0")
            .validate()
            .unwrap();
        let zone = zone(spec);
        assert_eq!(zone.redacted().tsig_secret, "");
        assert!(!format!("{:?}", zone).contains("c2VjcmV0"));
    }

    #[test]
    fn test_patch_keeps_secret_when_omitted() {
        let spec = ZoneRequest::new("example.com", "ns1", 53)
            .with_tsig("hmac-sha256", "key", "c2VjcmV0")
            .validate()
            .unwrap();
        let zone = zone(spec);
        let patch = ZonePatch {
            active: Some(false),
            ..ZonePatch::default()
        };
        let merged = patch.merge(&zone).validate().unwrap();
        assert_eq!(merged.tsig_secret, "c2VjcmV0");
        assert!(!merged.active);
    }
}
