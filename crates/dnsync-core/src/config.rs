//! Configuration types for the dnsync engine
//!
//! This module defines all configuration structures used throughout the workspace.

use serde::{Deserialize, Serialize};

/// Main dnsync configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DnsyncConfig {
    /// Store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Update client configuration
    #[serde(default)]
    pub nsupdate: NsupdateConfig,

    /// Forwarding config regeneration
    #[serde(default)]
    pub forwarding: ForwardingConfig,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl DnsyncConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.store.validate()?;
        self.nsupdate.validate()?;
        self.forwarding.validate()?;
        self.engine.validate()?;
        Ok(())
    }
}

/// Store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreConfig {
    /// JSON file store
    File {
        /// Path to the state file
        path: String,
    },

    /// In-memory store (not persistent)
    #[default]
    Memory,
}

impl StoreConfig {
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            StoreConfig::File { path } if path.is_empty() => {
                Err(crate::Error::config("File store path cannot be empty"))
            }
            _ => Ok(()),
        }
    }

    /// Get the store type name
    pub fn type_name(&self) -> &str {
        match self {
            StoreConfig::File { .. } => "file",
            StoreConfig::Memory => "memory",
        }
    }
}

/// Update client (nsupdate) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NsupdateConfig {
    /// Path or name of the update client binary
    #[serde(default = "default_nsupdate_binary")]
    pub binary: String,

    /// Report success without spawning, echoing the script on stdout
    #[serde(default)]
    pub dry_run: bool,

    /// Upper bound on one update call, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Send updates over TCP (`-v`)
    #[serde(default)]
    pub use_tcp: bool,
}

impl NsupdateConfig {
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.binary.trim().is_empty() {
            return Err(crate::Error::config("nsupdate binary cannot be empty"));
        }
        if self.timeout_secs == 0 {
            return Err(crate::Error::config("nsupdate timeout must be > 0"));
        }
        Ok(())
    }
}

impl Default for NsupdateConfig {
    fn default() -> Self {
        Self {
            binary: default_nsupdate_binary(),
            dry_run: false,
            timeout_secs: default_timeout_secs(),
            use_tcp: false,
        }
    }
}

/// Forwarding configuration regeneration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForwardingConfig {
    /// File the rendered forward zones are written to
    #[serde(default = "default_forward_config_path")]
    pub config_path: String,

    /// Command (program and arguments) that makes the nameserver reload it
    #[serde(default = "default_reload_command")]
    pub reload_command: Vec<String>,

    /// Render without writing or reloading
    #[serde(default)]
    pub dry_run: bool,

    /// Upper bound on the reload command, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ForwardingConfig {
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.config_path.trim().is_empty() {
            return Err(crate::Error::config("Forward config path cannot be empty"));
        }
        if self.reload_command.first().is_none_or(|c| c.trim().is_empty()) {
            return Err(crate::Error::config("Reload command cannot be empty"));
        }
        if self.timeout_secs == 0 {
            return Err(crate::Error::config("Reload timeout must be > 0"));
        }
        Ok(())
    }
}

impl Default for ForwardingConfig {
    fn default() -> Self {
        Self {
            config_path: default_forward_config_path(),
            reload_command: default_reload_command(),
            dry_run: false,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Extra attempts after a transient update failure
    ///
    /// Rejections (REFUSED, NOTAUTH, ...) are never retried.
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Delay between retry attempts (in milliseconds)
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.max_retries > 10 {
            return Err(crate::Error::config(format!(
                "max_retries must be between 0 and 10. Got: {}",
                self.max_retries
            )));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

fn default_nsupdate_binary() -> String {
    "nsupdate".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_forward_config_path() -> String {
    "/etc/bind/named.conf.forwarders".to_string()
}

fn default_reload_command() -> Vec<String> {
    vec!["rndc".to_string(), "reconfig".to_string()]
}

fn default_max_retries() -> usize {
    1
}

fn default_retry_delay_ms() -> u64 {
    500
}
