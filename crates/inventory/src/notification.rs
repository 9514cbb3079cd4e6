//! Ship-readiness notifications raised when a unit cannot leave a location.

use serde::{Deserialize, Serialize};

use crate::status::InventoryStatus;

/// Why a unit cannot be shipped.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    InventoryNotFoundInLocation,
    InventoryIsExpired,
    InventoryIsDiscarded,
    InventoryIsQuarantined,
    InventoryIsUnlabeled,
    InventoryIsUnsuitable,
    InventoryIsShipped,
    InventoryIsInTransit,
    InventoryIsPacked,
    InventoryIsConverted,
    InventoryIsModified,
}

/// What the operator is expected to do with the unit.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationAction {
    BackToStorage,
    TriggerDiscard,
}

impl NotificationKind {
    /// Stable numeric code shared with client applications.
    pub fn code(self) -> u16 {
        match self {
            NotificationKind::InventoryNotFoundInLocation => 1,
            NotificationKind::InventoryIsExpired => 2,
            NotificationKind::InventoryIsDiscarded => 3,
            NotificationKind::InventoryIsQuarantined => 4,
            NotificationKind::InventoryIsUnlabeled => 5,
            NotificationKind::InventoryIsUnsuitable => 6,
            NotificationKind::InventoryIsShipped => 7,
            NotificationKind::InventoryIsInTransit => 8,
            NotificationKind::InventoryIsPacked => 9,
            NotificationKind::InventoryIsConverted => 10,
            NotificationKind::InventoryIsModified => 11,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            NotificationKind::InventoryNotFoundInLocation => "INVENTORY_NOT_FOUND_IN_LOCATION",
            NotificationKind::InventoryIsExpired => "INVENTORY_IS_EXPIRED",
            NotificationKind::InventoryIsDiscarded => "INVENTORY_IS_DISCARDED",
            NotificationKind::InventoryIsQuarantined => "INVENTORY_IS_QUARANTINED",
            NotificationKind::InventoryIsUnlabeled => "INVENTORY_IS_UNLABELED",
            NotificationKind::InventoryIsUnsuitable => "INVENTORY_IS_UNSUITABLE",
            NotificationKind::InventoryIsShipped => "INVENTORY_IS_SHIPPED",
            NotificationKind::InventoryIsInTransit => "INVENTORY_IS_IN_TRANSIT",
            NotificationKind::InventoryIsPacked => "INVENTORY_IS_PACKED",
            NotificationKind::InventoryIsConverted => "INVENTORY_IS_CONVERTED",
            NotificationKind::InventoryIsModified => "INVENTORY_IS_MODIFIED",
        }
    }

    pub fn action(self) -> NotificationAction {
        match self {
            NotificationKind::InventoryIsExpired | NotificationKind::InventoryIsUnsuitable => {
                NotificationAction::TriggerDiscard
            }
            _ => NotificationAction::BackToStorage,
        }
    }

    /// Notification for a unit sitting in a non-shippable status.
    pub fn from_status(status: InventoryStatus) -> Option<Self> {
        match status {
            InventoryStatus::Available => None,
            InventoryStatus::InTransit => Some(NotificationKind::InventoryIsInTransit),
            InventoryStatus::Quarantined => Some(NotificationKind::InventoryIsQuarantined),
            InventoryStatus::Discarded => Some(NotificationKind::InventoryIsDiscarded),
            InventoryStatus::Shipped => Some(NotificationKind::InventoryIsShipped),
            InventoryStatus::Packed => Some(NotificationKind::InventoryIsPacked),
            InventoryStatus::Converted => Some(NotificationKind::InventoryIsConverted),
            InventoryStatus::Modified => Some(NotificationKind::InventoryIsModified),
        }
    }
}

/// A single ship-readiness finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub code: u16,
    pub message: String,
    pub action: NotificationAction,
    pub reason: Option<String>,
    pub details: Vec<String>,
}

impl Notification {
    pub fn new(kind: NotificationKind, message: impl Into<String>, reason: Option<String>) -> Self {
        Self {
            kind,
            code: kind.code(),
            message: message.into(),
            action: kind.action(),
            reason,
            details: Vec::new(),
        }
    }

    /// Notification whose message is the kind's own name.
    pub fn plain(kind: NotificationKind, reason: Option<String>) -> Self {
        Self::new(kind, kind.name(), reason)
    }

    pub fn with_details(mut self, details: Vec<String>) -> Self {
        self.details = details;
        self
    }
}
