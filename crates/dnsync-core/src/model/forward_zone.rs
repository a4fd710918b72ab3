//! Conditional-forwarding zones

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::str::FromStr;

use super::names::{normalize_zone_name, validate_domain_name};
use crate::error::{Error, Result};

/// How the nameserver treats a forward zone when forwarders fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForwardPolicy {
    /// Only ask the forwarders
    Only,
    /// Ask the forwarders first, then resolve normally
    First,
}

impl ForwardPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ForwardPolicy::Only => "only",
            ForwardPolicy::First => "first",
        }
    }
}

impl FromStr for ForwardPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "only" => Ok(ForwardPolicy::Only),
            "first" => Ok(ForwardPolicy::First),
            _ => Err(Error::validation(format!(
                "Forward policy '{}' is not valid. Valid policies: only, first",
                s
            ))),
        }
    }
}

/// A zone whose queries are forwarded to explicit upstream resolvers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardZone {
    pub id: u64,
    pub name: String,
    pub forwarders: Vec<Ipv4Addr>,
    pub forward_policy: ForwardPolicy,
    pub description: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ForwardZone {
    pub fn from_spec(id: u64, spec: ForwardZoneSpec, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: spec.name,
            forwarders: spec.forwarders,
            forward_policy: spec.forward_policy,
            description: spec.description,
            active: spec.active,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, spec: ForwardZoneSpec, now: DateTime<Utc>) {
        self.name = spec.name;
        self.forwarders = spec.forwarders;
        self.forward_policy = spec.forward_policy;
        self.description = spec.description;
        self.active = spec.active;
        self.updated_at = now;
    }
}

/// Inbound forward-zone payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForwardZoneRequest {
    pub name: String,
    pub forwarders: Vec<String>,
    #[serde(default)]
    pub forward_policy: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
}

impl ForwardZoneRequest {
    pub fn new<I, S>(name: impl Into<String>, forwarders: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            forwarders: forwarders.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_policy(mut self, policy: impl Into<String>) -> Self {
        self.forward_policy = Some(policy.into());
        self
    }

    pub fn validate(self) -> Result<ForwardZoneSpec> {
        let name = normalize_zone_name(&self.name);
        validate_domain_name(&name)?;

        if self.forwarders.is_empty() {
            return Err(Error::validation("Forward zone needs at least one forwarder"));
        }

        let mut forwarders = Vec::with_capacity(self.forwarders.len());
        for forwarder in &self.forwarders {
            let addr: Ipv4Addr = forwarder.trim().parse().map_err(|_| {
                Error::validation(format!(
                    "Forwarder must be an IPv4 address. Got: {}",
                    forwarder
                ))
            })?;
            if !forwarders.contains(&addr) {
                forwarders.push(addr);
            }
        }

        let forward_policy = match self.forward_policy {
            None => ForwardPolicy::Only,
            Some(policy) => policy.parse()?,
        };

        Ok(ForwardZoneSpec {
            name,
            forwarders,
            forward_policy,
            description: self.description.unwrap_or_default(),
            active: self.active.unwrap_or(true),
        })
    }
}

/// Partial forward-zone update
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForwardZonePatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub forwarders: Option<Vec<String>>,
    #[serde(default)]
    pub forward_policy: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
}

impl ForwardZonePatch {
    pub fn merge(self, zone: &ForwardZone) -> ForwardZoneRequest {
        ForwardZoneRequest {
            name: self.name.unwrap_or_else(|| zone.name.clone()),
            forwarders: self
                .forwarders
                .unwrap_or_else(|| zone.forwarders.iter().map(ToString::to_string).collect()),
            forward_policy: Some(
                self.forward_policy
                    .unwrap_or_else(|| zone.forward_policy.as_str().to_string()),
            ),
            description: Some(self.description.unwrap_or_else(|| zone.description.clone())),
            active: Some(self.active.unwrap_or(zone.active)),
        }
    }
}

/// A validated forward zone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardZoneSpec {
    pub name: String,
    pub forwarders: Vec<Ipv4Addr>,
    pub forward_policy: ForwardPolicy,
    pub description: String,
    pub active: bool,
}
