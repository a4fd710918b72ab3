//! Persisted entities and their validation rules
//!
//! - [`Zone`]: an authoritative zone and the nameserver that hosts it
//! - [`Record`]: a resource record scoped to a zone
//! - [`ForwardZone`]: a conditional-forwarding zone
//! - [`ChangeLog`]: append-only audit entries
//!
//! Every inbound payload (`*Request`, `*Patch`) is validated into a typed
//! `*Spec` before any engine logic runs.

pub mod change_log;
pub mod forward_zone;
pub mod names;
pub mod record;
pub mod zone;

pub use change_log::{
    ChangeAction, ChangeLog, ChangeLogQuery, ChangePayload, ChangeStatus, NewChangeLog,
    OperatorType,
};
pub use forward_zone::{
    ForwardPolicy, ForwardZone, ForwardZonePatch, ForwardZoneRequest, ForwardZoneSpec,
};
pub use names::normalize_zone_name;
pub use record::{
    Record, RecordPatch, RecordQuery, RecordRequest, RecordSpec, RecordStatus, RecordType,
    SyncOutcome, SyncStatus,
};
pub use zone::{Zone, ZonePatch, ZoneRequest, ZoneSpec};
