//! Response DTOs and JSON mapping helpers.
//!
//! Request bodies are the trigger payloads from `unitrack_infra::workflow`.

use serde::{Deserialize, Serialize};

use unitrack_core::AggregateRoot;
use unitrack_infra::Outcome;
use unitrack_inventory::{InventoryAggregate, InventoryUnit, Notification, UnitSnapshot};

/// Result of an inbound trigger.
#[derive(Debug, Serialize)]
pub struct TriggerResponse {
    pub version: u64,
    /// `false` when the trigger was already reflected in the stored unit.
    pub changed: bool,
    pub event_id: Option<String>,
    pub event_type: Option<String>,
    pub unit: Option<UnitSnapshot>,
}

impl From<Outcome> for TriggerResponse {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Saved { version, envelope } => Self {
                version,
                changed: true,
                event_id: Some(envelope.event_id().to_string()),
                event_type: Some(envelope.event_type().to_string()),
                unit: Some(envelope.into_payload().unit),
            },
            Outcome::Unchanged { version } => Self {
                version,
                changed: false,
                event_id: None,
                event_type: None,
                unit: None,
            },
        }
    }
}

/// Full state of one unit.
#[derive(Debug, Serialize)]
pub struct UnitResponse<'a> {
    pub version: u64,
    pub quarantined: bool,
    pub available: bool,
    #[serde(flatten)]
    pub unit: &'a InventoryUnit,
}

impl<'a> UnitResponse<'a> {
    pub fn new(aggregate: &'a InventoryAggregate) -> Self {
        Self {
            version: aggregate.version(),
            quarantined: aggregate.is_quarantined(),
            available: aggregate.is_available(),
            unit: aggregate.unit(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ShipCheckQuery {
    pub location: String,
}

#[derive(Debug, Serialize)]
pub struct ShipCheckResponse {
    pub location: String,
    pub can_ship: bool,
    pub notifications: Vec<Notification>,
}
