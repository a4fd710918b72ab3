//! Zone registry operations
//!
//! Zones are returned with the TSIG secret blanked on every path, including
//! the change-log payloads.

use chrono::Utc;
use tracing::info;

use super::SyncEngine;
use crate::auth::{AuthContext, Permission};
use crate::changelog::ChangeEntry;
use crate::error::{Error, Result};
use crate::model::{ChangeAction, ChangeStatus, Zone, ZonePatch, ZoneRequest};

impl SyncEngine {
    /// Register a zone
    pub async fn create_zone(&self, auth: &AuthContext, request: ZoneRequest) -> Result<Zone> {
        auth.require(Permission::Write)?;
        let spec = request.validate()?;

        if self.store.find_zone_by_name(&spec.name).await?.is_some() {
            return Err(Error::conflict(format!("Zone '{}' already exists", spec.name)));
        }

        let zone = self.store.insert_zone(spec).await?.redacted();
        info!("Created zone {} ({})", zone.id, zone.name);

        self.changelog
            .append(
                auth,
                ChangeEntry::new(
                    ChangeAction::Create,
                    ChangeStatus::Success,
                    format!("Created zone {}", zone.name),
                )
                .zone(zone.id)
                .after(&zone),
            )
            .await;

        Ok(zone)
    }

    /// Apply a partial update to a zone
    ///
    /// A zone that still holds records cannot be renamed: the published
    /// records would stay under the old name.
    pub async fn update_zone(&self, auth: &AuthContext, id: u64, patch: ZonePatch) -> Result<Zone> {
        auth.require(Permission::Write)?;
        let current = self.load_zone(id).await?;
        let spec = patch.merge(&current).validate()?;

        if spec.name != current.name {
            if let Some(other) = self.store.find_zone_by_name(&spec.name).await?
                && other.id != id
            {
                return Err(Error::conflict(format!("Zone '{}' already exists", spec.name)));
            }
            let records = self.store.count_zone_records(id).await?;
            if records > 0 {
                return Err(Error::conflict(format!(
                    "Zone '{}' has {} record(s) and cannot be renamed",
                    current.name, records
                )));
            }
        }

        let mut updated = current.clone();
        updated.apply(spec, Utc::now());
        self.store.update_zone(&updated).await?;
        let updated = updated.redacted();
        info!("Updated zone {} ({})", updated.id, updated.name);

        self.changelog
            .append(
                auth,
                ChangeEntry::new(
                    ChangeAction::Update,
                    ChangeStatus::Success,
                    format!("Updated zone {}", updated.name),
                )
                .zone(id)
                .before(&current.redacted())
                .after(&updated),
            )
            .await;

        Ok(updated)
    }

    /// Remove a zone that holds no records
    pub async fn delete_zone(&self, auth: &AuthContext, id: u64) -> Result<()> {
        auth.require(Permission::Write)?;
        let zone = self.load_zone(id).await?;

        let records = self.store.count_zone_records(id).await?;
        if records > 0 {
            return Err(Error::conflict(format!(
                "Zone '{}' still has {} record(s); delete them first",
                zone.name, records
            )));
        }

        self.store.delete_zone(id).await?;
        info!("Deleted zone {} ({})", id, zone.name);

        self.changelog
            .append(
                auth,
                ChangeEntry::new(
                    ChangeAction::Delete,
                    ChangeStatus::Success,
                    format!("Deleted zone {}", zone.name),
                )
                .zone(id)
                .before(&zone.redacted()),
            )
            .await;

        Ok(())
    }

    pub async fn get_zone(&self, auth: &AuthContext, id: u64) -> Result<Zone> {
        auth.require(Permission::Read)?;
        Ok(self.load_zone(id).await?.redacted())
    }

    pub async fn list_zones(&self, auth: &AuthContext) -> Result<Vec<Zone>> {
        auth.require(Permission::Read)?;
        let zones = self.store.list_zones().await?;
        Ok(zones.iter().map(Zone::redacted).collect())
    }
}
