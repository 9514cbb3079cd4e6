use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use unitrack_core::UnitKey;
use unitrack_events::Event;

use crate::quarantine::Quarantine;
use crate::status::InventoryStatus;

/// Which workflow produced an update.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateKind {
    Created,
    Received,
    Quarantined,
    QuarantineUpdated,
    QuarantineRemoved,
    Discarded,
    Shipped,
    StorageUpdated,
}

impl UpdateKind {
    pub fn event_type(self) -> &'static str {
        match self {
            UpdateKind::Created => "inventory.unit.created",
            UpdateKind::Received => "inventory.unit.received",
            UpdateKind::Quarantined => "inventory.unit.quarantined",
            UpdateKind::QuarantineUpdated => "inventory.unit.quarantine_updated",
            UpdateKind::QuarantineRemoved => "inventory.unit.quarantine_removed",
            UpdateKind::Discarded => "inventory.unit.discarded",
            UpdateKind::Shipped => "inventory.unit.shipped",
            UpdateKind::StorageUpdated => "inventory.unit.storage_updated",
        }
    }
}

/// Post-mutation state of a unit, as seen by downstream services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitSnapshot {
    pub key: UnitKey,
    pub status: InventoryStatus,
    pub status_reason: Option<String>,
    pub location: String,
    pub quarantines: Vec<Quarantine>,
    /// Aggregate-level flag set by the "received" workflow.
    pub quarantined: bool,
}

/// Event: a unit's status, location or quarantines changed and were saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryEvent {
    pub update: UpdateKind,
    pub unit: UnitSnapshot,
    pub occurred_at: DateTime<Utc>,
}

impl Event for InventoryEvent {
    fn event_type(&self) -> &'static str {
        self.update.event_type()
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
}
