//! Inventory lifecycle domain.
//!
//! Business rules for a single inventoried unit: status transitions,
//! quarantines, audit history and ship readiness. Deterministic domain logic
//! only (no IO, no HTTP, no storage).

pub mod aggregate;
pub mod event;
pub mod history;
pub mod notification;
pub mod quarantine;
pub mod status;
pub mod unit;

pub use aggregate::InventoryAggregate;
pub use event::{InventoryEvent, UnitSnapshot, UpdateKind};
pub use history::HistorySnapshot;
pub use notification::{Notification, NotificationAction, NotificationKind};
pub use quarantine::{OTHER_REASON, Quarantine};
pub use status::{InventoryStatus, ShipmentType};
pub use unit::{InventoryUnit, NewInventoryUnit, UnitAttributes};
