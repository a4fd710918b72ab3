//! Change-log queries

use super::SyncEngine;
use crate::auth::{AuthContext, Permission};
use crate::error::Result;
use crate::model::{ChangeLog, ChangeLogQuery};

impl SyncEngine {
    /// Most recent change-log entries first, filtered by zone and/or record
    ///
    /// The limit defaults to 100 and is capped at 500.
    pub async fn list_change_logs(
        &self,
        auth: &AuthContext,
        query: &ChangeLogQuery,
    ) -> Result<Vec<ChangeLog>> {
        auth.require(Permission::Read)?;
        self.store.list_change_logs(query).await
    }
}
