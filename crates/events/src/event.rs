use chrono::{DateTime, Utc};

/// An outbound domain notification.
///
/// Events are:
/// - **immutable** (treat them as facts about a committed change)
/// - **versioned** (schema evolution for downstream consumers)
/// - emitted only after the change they describe has been saved
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable event name/type identifier (e.g. "inventory.unit.received").
    fn event_type(&self) -> &'static str;

    /// Schema version for this event type.
    fn version(&self) -> u32;

    /// When the change happened (business time).
    fn occurred_at(&self) -> DateTime<Utc>;
}
