//! Forward-zone operations
//!
//! Every accepted mutation regenerates the complete forwarding
//! configuration from the active rows and hands it to the sink. A failed
//! regeneration does not roll back the row; it is reported in the outcome
//! and can be retried with [`SyncEngine::resync_forward_zones`].

use chrono::Utc;
use tracing::{error, info, warn};

use super::SyncEngine;
use crate::auth::{AuthContext, Permission};
use crate::changelog::ChangeEntry;
use crate::error::{Error, Result};
use crate::forward::render_forward_config;
use crate::model::{
    ChangeAction, ForwardZone, ForwardZonePatch, ForwardZoneRequest, SyncOutcome, SyncStatus,
};

/// A forward zone together with the outcome of the regeneration that followed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardZoneChange {
    pub forward_zone: ForwardZone,
    pub outcome: SyncOutcome,
}

impl SyncEngine {
    pub async fn create_forward_zone(
        &self,
        auth: &AuthContext,
        request: ForwardZoneRequest,
    ) -> Result<ForwardZoneChange> {
        auth.require(Permission::Write)?;
        let spec = request.validate()?;

        if self.store.find_forward_zone_by_name(&spec.name).await?.is_some() {
            return Err(Error::conflict(format!(
                "Forward zone '{}' already exists",
                spec.name
            )));
        }

        let forward_zone = self.store.insert_forward_zone(spec).await?;
        info!("Created forward zone {} ({})", forward_zone.id, forward_zone.name);

        let outcome = self.regenerate_forward_config().await;
        self.changelog
            .append(
                auth,
                ChangeEntry::new(ChangeAction::Create, outcome.status.into(), &outcome.message)
                    .after(&forward_zone)
                    .output(&outcome.stdout, &outcome.stderr),
            )
            .await;

        Ok(ForwardZoneChange {
            forward_zone,
            outcome,
        })
    }

    pub async fn update_forward_zone(
        &self,
        auth: &AuthContext,
        id: u64,
        patch: ForwardZonePatch,
    ) -> Result<ForwardZoneChange> {
        auth.require(Permission::Write)?;
        let current = self.load_forward_zone(id).await?;
        let spec = patch.merge(&current).validate()?;

        if spec.name != current.name
            && let Some(other) = self.store.find_forward_zone_by_name(&spec.name).await?
            && other.id != id
        {
            return Err(Error::conflict(format!(
                "Forward zone '{}' already exists",
                spec.name
            )));
        }

        let mut forward_zone = current.clone();
        forward_zone.apply(spec, Utc::now());
        self.store.update_forward_zone(&forward_zone).await?;
        info!("Updated forward zone {} ({})", id, forward_zone.name);

        let outcome = self.regenerate_forward_config().await;
        self.changelog
            .append(
                auth,
                ChangeEntry::new(ChangeAction::Update, outcome.status.into(), &outcome.message)
                    .before(&current)
                    .after(&forward_zone)
                    .output(&outcome.stdout, &outcome.stderr),
            )
            .await;

        Ok(ForwardZoneChange {
            forward_zone,
            outcome,
        })
    }

    pub async fn delete_forward_zone(
        &self,
        auth: &AuthContext,
        id: u64,
    ) -> Result<ForwardZoneChange> {
        auth.require(Permission::Write)?;
        let forward_zone = self.load_forward_zone(id).await?;

        self.store.delete_forward_zone(id).await?;
        info!("Deleted forward zone {} ({})", id, forward_zone.name);

        let outcome = self.regenerate_forward_config().await;
        self.changelog
            .append(
                auth,
                ChangeEntry::new(ChangeAction::Delete, outcome.status.into(), &outcome.message)
                    .before(&forward_zone)
                    .output(&outcome.stdout, &outcome.stderr),
            )
            .await;

        Ok(ForwardZoneChange {
            forward_zone,
            outcome,
        })
    }

    pub async fn get_forward_zone(&self, auth: &AuthContext, id: u64) -> Result<ForwardZone> {
        auth.require(Permission::Read)?;
        self.load_forward_zone(id).await
    }

    pub async fn list_forward_zones(&self, auth: &AuthContext) -> Result<Vec<ForwardZone>> {
        auth.require(Permission::Read)?;
        self.store.list_forward_zones().await
    }

    /// Regenerate and install the forwarding configuration without a row change
    pub async fn resync_forward_zones(&self, auth: &AuthContext) -> Result<SyncOutcome> {
        auth.require(Permission::Write)?;

        let outcome = self.regenerate_forward_config().await;
        self.changelog
            .append(
                auth,
                ChangeEntry::new(ChangeAction::Sync, outcome.status.into(), &outcome.message)
                    .output(&outcome.stdout, &outcome.stderr),
            )
            .await;

        Ok(outcome)
    }

    async fn load_forward_zone(&self, id: u64) -> Result<ForwardZone> {
        self.store
            .get_forward_zone(id)
            .await?
            .ok_or_else(|| Error::not_found(format!("Forward zone {} not found", id)))
    }

    async fn regenerate_forward_config(&self) -> SyncOutcome {
        let zones = match self.store.list_forward_zones().await {
            Ok(zones) => zones,
            Err(e) => {
                error!("Failed to load forward zones: {}", e);
                return SyncOutcome {
                    status: SyncStatus::Failed,
                    message: format!("Failed to load forward zones: {}", e),
                    stdout: String::new(),
                    stderr: String::new(),
                };
            }
        };

        let active = zones.iter().filter(|z| z.active).count();
        let rendered = render_forward_config(&zones);
        let exec = self.forward_sink.apply(&rendered).await;

        if exec.success {
            info!(
                "Forwarding config regenerated with {} zone(s) via {}",
                active,
                self.forward_sink.sink_name()
            );
            SyncOutcome {
                status: SyncStatus::Success,
                message: format!("Forwarding config regenerated with {} zone(s)", active),
                stdout: exec.stdout,
                stderr: exec.stderr,
            }
        } else {
            let message = format!("Failed to regenerate forwarding config: {}", exec.summary());
            warn!("{}", message);
            SyncOutcome {
                status: SyncStatus::Failed,
                message,
                stdout: exec.stdout,
                stderr: exec.stderr,
            }
        }
    }
}
