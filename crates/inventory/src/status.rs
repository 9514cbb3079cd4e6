use serde::{Deserialize, Serialize};

/// Lifecycle state of an inventory unit.
///
/// Any state may follow any other: no transition table is enforced here.
/// `Discarded` and `Shipped` are terminal in practice for downstream services.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InventoryStatus {
    InTransit,
    Available,
    Quarantined,
    Discarded,
    Shipped,
    Packed,
    Converted,
    Modified,
}

impl InventoryStatus {
    pub const ALL: [InventoryStatus; 8] = [
        InventoryStatus::InTransit,
        InventoryStatus::Available,
        InventoryStatus::Quarantined,
        InventoryStatus::Discarded,
        InventoryStatus::Shipped,
        InventoryStatus::Packed,
        InventoryStatus::Converted,
        InventoryStatus::Modified,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            InventoryStatus::InTransit => "IN_TRANSIT",
            InventoryStatus::Available => "AVAILABLE",
            InventoryStatus::Quarantined => "QUARANTINED",
            InventoryStatus::Discarded => "DISCARDED",
            InventoryStatus::Shipped => "SHIPPED",
            InventoryStatus::Packed => "PACKED",
            InventoryStatus::Converted => "CONVERTED",
            InventoryStatus::Modified => "MODIFIED",
        }
    }
}

impl core::fmt::Display for InventoryStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of shipment that completed for a unit.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipmentType {
    Customer,
    InternalTransfer,
}
