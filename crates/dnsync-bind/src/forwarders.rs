//! BIND forwarding configuration sink
//!
//! Writes the rendered forward zones to the include file named in the
//! configuration (atomically, via a temp file and rename), then runs the
//! reload command so named picks it up.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use dnsync_core::config::ForwardingConfig;
use dnsync_core::traits::{ExecOutcome, FailureKind, ForwardConfigSink};

use crate::process;

/// Include-file + reload-command [`ForwardConfigSink`]
#[derive(Debug, Clone)]
pub struct BindForwardConfig {
    /// File the rendered configuration is written to
    config_path: PathBuf,

    /// Program and arguments that reload the nameserver
    reload_command: Vec<String>,

    /// Render and log only
    dry_run: bool,

    /// Upper bound on the reload command
    timeout: Duration,
}

impl BindForwardConfig {
    pub fn new(config_path: impl Into<PathBuf>, reload_command: Vec<String>, dry_run: bool) -> Self {
        Self {
            config_path: config_path.into(),
            reload_command,
            dry_run,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn from_config(config: &ForwardingConfig) -> Self {
        if config.dry_run {
            tracing::warn!("Forwarding config sink running in DRY-RUN mode - no files will be written");
        }
        Self {
            config_path: PathBuf::from(&config.config_path),
            reload_command: config.reload_command.clone(),
            dry_run: config.dry_run,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Write `rendered` next to the target and rename it into place
    async fn write_atomically(&self, rendered: &str) -> std::io::Result<()> {
        if let Some(parent) = self.config_path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let temp_path = self.config_path.with_extension("tmp");
        tokio::fs::write(&temp_path, rendered).await?;
        if let Err(e) = tokio::fs::rename(&temp_path, &self.config_path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(e);
        }
        Ok(())
    }
}

#[async_trait]
impl ForwardConfigSink for BindForwardConfig {
    async fn apply(&self, rendered: &str) -> ExecOutcome {
        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would write {} and run {:?}:\n{}",
                self.config_path.display(),
                self.reload_command,
                rendered
            );
            return ExecOutcome::succeeded(rendered, "");
        }

        if let Err(e) = self.write_atomically(rendered).await {
            tracing::error!("Failed to write {}: {}", self.config_path.display(), e);
            return ExecOutcome::failed_with(
                FailureKind::Rejected,
                format!("Failed to write {}: {}", self.config_path.display(), e),
            );
        }
        tracing::debug!("Wrote forwarding config to {}", self.config_path.display());

        let Some((program, args)) = self.reload_command.split_first() else {
            return ExecOutcome::succeeded("", "");
        };
        process::run(program, args, None, self.timeout).await
    }

    fn sink_name(&self) -> &'static str {
        "bind"
    }
}
