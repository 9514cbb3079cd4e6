//! Inbound trigger payloads.
//!
//! These are the messages upstream services send about a unit. Identity is
//! carried as raw strings and validated when the trigger is handled, so a bad
//! identifier surfaces as a typed validation failure rather than a decode error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use unitrack_core::{DomainResult, UnitKey};
use unitrack_inventory::{InventoryStatus, ShipmentType, UnitAttributes};

/// Common accessor for triggers addressed to one unit.
pub trait UnitTrigger {
    fn unit_number(&self) -> &str;
    fn product_code(&self) -> &str;

    fn key(&self) -> DomainResult<UnitKey> {
        UnitKey::parse(self.unit_number(), self.product_code())
    }
}

macro_rules! impl_unit_trigger {
    ($($t:ty),+ $(,)?) => {
        $(impl UnitTrigger for $t {
            fn unit_number(&self) -> &str {
                &self.unit_number
            }

            fn product_code(&self) -> &str {
                &self.product_code
            }
        })+
    };
}

/// A quarantine that was already open when the product was imported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportedQuarantine {
    pub extern_id: i64,
    pub reason: String,
    #[serde(default)]
    pub comments: String,
}

/// "Product imported": a unit enters inventory from an external system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductImported {
    pub unit_number: String,
    pub product_code: String,
    pub location: String,
    #[serde(default = "default_import_status")]
    pub status: InventoryStatus,
    #[serde(default)]
    pub expiration_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_labeled: bool,
    #[serde(default)]
    pub is_licensed: bool,
    #[serde(default)]
    pub attributes: UnitAttributes,
    #[serde(default)]
    pub quarantines: Vec<ImportedQuarantine>,
}

fn default_import_status() -> InventoryStatus {
    InventoryStatus::Available
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuarantineAction {
    Add,
    Update,
    Remove,
}

/// "Quarantine requested": open, amend or release a hold on a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuarantineRequested {
    pub unit_number: String,
    pub product_code: String,
    pub action: QuarantineAction,
    /// Upstream correlation id of the quarantine.
    pub extern_id: i64,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub comments: String,
}

/// "Unit received": a unit physically arrived at a location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitReceived {
    pub unit_number: String,
    pub product_code: String,
    pub location: String,
    #[serde(default)]
    pub has_quarantine: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDiscarded {
    pub unit_number: String,
    pub product_code: String,
    pub reason: String,
    #[serde(default)]
    pub comments: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentCompleted {
    pub unit_number: String,
    pub product_code: String,
    pub shipment_type: ShipmentType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductStored {
    pub unit_number: String,
    pub product_code: String,
    #[serde(default)]
    pub device_stored: Option<String>,
    #[serde(default)]
    pub storage_location: Option<String>,
}

impl_unit_trigger!(
    ProductImported,
    QuarantineRequested,
    UnitReceived,
    ProductDiscarded,
    ShipmentCompleted,
    ProductStored,
);
