use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use unitrack_core::UnitKey;
use unitrack_inventory::{InventoryEvent, InventoryStatus};

use crate::read_model::ReadModelStore;
use crate::workflow::{AGGREGATE_TYPE, InventoryEnvelope};

/// Queryable view of one unit: where it is and whether it is on hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitStatusView {
    pub key: UnitKey,
    pub status: InventoryStatus,
    pub status_reason: Option<String>,
    pub location: String,
    pub open_quarantines: usize,
    pub quarantined: bool,
    pub version: u64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UnitStatusProjectionError {
    #[error("unexpected aggregate type '{0}'")]
    AggregateType(String),

    #[error("envelope stream '{stream}' does not match event unit '{unit}'")]
    StreamMismatch { stream: String, unit: String },

    #[error("non-monotonic sequence number (last={last}, found={found})")]
    NonMonotonicSequence { last: u64, found: u64 },
}

/// Unit status projection.
///
/// Consumes published inventory envelopes and keeps the latest state per unit.
/// The read model is disposable and rebuildable from the envelopes.
///
/// Each envelope carries the complete post-save state, so a stream may skip
/// sequence numbers (a subscriber that joined late); only replays at or below
/// the cursor are ignored.
#[derive(Debug)]
pub struct UnitStatusProjection<S>
where
    S: ReadModelStore<UnitKey, UnitStatusView>,
{
    store: S,
    cursors: RwLock<HashMap<String, u64>>,
}

impl<S> UnitStatusProjection<S>
where
    S: ReadModelStore<UnitKey, UnitStatusView>,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            cursors: RwLock::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &UnitKey) -> Option<UnitStatusView> {
        self.store.get(key)
    }

    /// All units, ordered by key.
    pub fn list(&self) -> Vec<UnitStatusView> {
        let mut all = self.store.list();
        all.sort_by(|a, b| a.key.cmp(&b.key));
        all
    }

    /// Apply a published envelope.
    ///
    /// Returns `Ok(false)` for a duplicate or replayed envelope.
    pub fn apply_envelope(&self, envelope: &InventoryEnvelope) -> Result<bool, UnitStatusProjectionError> {
        if envelope.aggregate_type() != AGGREGATE_TYPE {
            return Err(UnitStatusProjectionError::AggregateType(
                envelope.aggregate_type().to_string(),
            ));
        }

        let event: &InventoryEvent = envelope.payload();
        let unit_id = event.unit.key.to_string();
        if unit_id != envelope.stream_id() {
            return Err(UnitStatusProjectionError::StreamMismatch {
                stream: envelope.stream_id().to_string(),
                unit: unit_id,
            });
        }

        let seq = envelope.sequence_number();
        let Ok(mut cursors) = self.cursors.write() else {
            return Ok(false);
        };
        let last = cursors.get(envelope.stream_id()).copied().unwrap_or(0);

        if seq == 0 {
            return Err(UnitStatusProjectionError::NonMonotonicSequence { last, found: seq });
        }
        if seq <= last {
            tracing::debug!(stream = envelope.stream_id(), seq, last, "ignoring replayed envelope");
            return Ok(false);
        }

        self.store.upsert(
            event.unit.key.clone(),
            UnitStatusView {
                key: event.unit.key.clone(),
                status: event.unit.status,
                status_reason: event.unit.status_reason.clone(),
                location: event.unit.location.clone(),
                open_quarantines: event.unit.quarantines.len(),
                quarantined: event.unit.quarantined,
                version: seq,
                updated_at: event.occurred_at,
            },
        );
        cursors.insert(unit_id, seq);

        Ok(true)
    }

    /// Rebuild the read model from scratch by replaying envelopes.
    pub fn rebuild_from_scratch(
        &self,
        envelopes: impl IntoIterator<Item = InventoryEnvelope>,
    ) -> Result<(), UnitStatusProjectionError> {
        if let Ok(mut cursors) = self.cursors.write() {
            cursors.clear();
        }
        self.store.clear();

        // Deterministic replay order: stream, then sequence.
        let mut envs: Vec<_> = envelopes.into_iter().collect();
        envs.sort_by(|a, b| {
            (a.stream_id(), a.sequence_number()).cmp(&(b.stream_id(), b.sequence_number()))
        });

        for env in &envs {
            self.apply_envelope(env)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use uuid::Uuid;

    use unitrack_events::EventEnvelope;
    use unitrack_inventory::{InventoryAggregate, InventoryUnit, NewInventoryUnit, UpdateKind};

    use super::*;
    use crate::read_model::InMemoryReadModelStore;

    fn envelope(seq: u64, location: &str) -> InventoryEnvelope {
        let key = UnitKey::parse("W036825014001", "E0869V00").unwrap();
        let unit = InventoryUnit::create(NewInventoryUnit::new(key.clone(), InventoryStatus::Available, location)).unwrap();
        let event = InventoryAggregate::new(unit).to_event(UpdateKind::Received, Utc::now());
        EventEnvelope::wrap(Uuid::now_v7(), key.to_string(), AGGREGATE_TYPE, seq, event)
    }

    fn projection() -> UnitStatusProjection<Arc<InMemoryReadModelStore<UnitKey, UnitStatusView>>> {
        UnitStatusProjection::new(Arc::new(InMemoryReadModelStore::new()))
    }

    #[test]
    fn replays_are_ignored() {
        let p = projection();
        assert!(p.apply_envelope(&envelope(1, "A")).unwrap());
        assert!(p.apply_envelope(&envelope(2, "B")).unwrap());

        assert!(!p.apply_envelope(&envelope(1, "A")).unwrap());

        let view = p.list().pop().unwrap();
        assert_eq!(view.location, "B");
        assert_eq!(view.version, 2);
    }

    #[test]
    fn sequence_zero_is_rejected() {
        let p = projection();
        let err = p.apply_envelope(&envelope(0, "A")).unwrap_err();
        assert_eq!(err, UnitStatusProjectionError::NonMonotonicSequence { last: 0, found: 0 });
    }

    #[test]
    fn foreign_aggregate_type_is_rejected() {
        let p = projection();
        let env = envelope(1, "A");
        let payload = env.payload().clone();
        let foreign = EventEnvelope::wrap(Uuid::now_v7(), env.stream_id(), "orders.order", 1, payload);

        assert!(matches!(
            p.apply_envelope(&foreign),
            Err(UnitStatusProjectionError::AggregateType(_))
        ));
    }

    #[test]
    fn rebuild_replays_in_sequence_order() {
        let p = projection();
        p.apply_envelope(&envelope(1, "STALE")).unwrap();

        p.rebuild_from_scratch(vec![envelope(3, "C"), envelope(1, "A"), envelope(2, "B")])
            .unwrap();

        let view = p.list().pop().unwrap();
        assert_eq!(view.location, "C");
        assert_eq!(view.version, 3);
    }
}
