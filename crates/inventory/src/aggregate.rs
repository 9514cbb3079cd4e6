//! Inventory aggregate: the transactional boundary around one unit.

use chrono::{DateTime, Utc};

use unitrack_core::{AggregateRoot, DomainResult, UnitKey, require_text};

use crate::event::{InventoryEvent, UnitSnapshot, UpdateKind};
use crate::notification::{Notification, NotificationKind};
use crate::quarantine::{OTHER_REASON, explain_reason};
use crate::status::{InventoryStatus, ShipmentType};
use crate::unit::InventoryUnit;

pub const CONVERTED_REASON: &str = "Child manufactured";
pub const MODIFIED_REASON: &str = "Product modified";
pub const EXPIRED_REASON: &str = "EXPIRED";

/// Aggregate root: InventoryAggregate.
///
/// Wraps exactly one [`InventoryUnit`] and adds the `quarantined` flag set by
/// the "unit received" workflow. That flag is tracked on its own: it is not
/// derived from the unit's open quarantines.
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryAggregate {
    unit: InventoryUnit,
    quarantined: bool,
    version: u64,
}

impl InventoryAggregate {
    /// Wrap a freshly created, never saved unit.
    pub fn new(unit: InventoryUnit) -> Self {
        Self {
            unit,
            quarantined: false,
            version: 0,
        }
    }

    /// Rebuild an aggregate loaded from storage at `version`.
    pub fn rehydrate(unit: InventoryUnit, quarantined: bool, version: u64) -> DomainResult<Self> {
        unit.check_invariants()?;
        Ok(Self {
            unit,
            quarantined,
            version,
        })
    }

    pub fn unit(&self) -> &InventoryUnit {
        &self.unit
    }

    pub fn key(&self) -> &UnitKey {
        self.unit.key()
    }

    /// The flag set by [`product_received`](Self::product_received).
    pub fn is_quarantined(&self) -> bool {
        self.quarantined
    }

    pub fn is_available(&self) -> bool {
        self.unit.status() == InventoryStatus::Available
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.unit.expiration_date().is_some_and(|exp| exp < now)
    }

    /// Record the version assigned by a successful save.
    pub fn mark_saved(&mut self, version: u64) {
        self.version = version;
    }

    /// A physical unit arrived at `new_location`.
    pub fn product_received(&mut self, new_location: &str, has_quarantine: bool) -> DomainResult<()> {
        require_text("location", new_location)?;

        self.unit.set_location(new_location)?;
        self.unit.transition_status(InventoryStatus::Available, None);
        self.quarantined = has_quarantine;
        Ok(())
    }

    /// Open a quarantine and move the unit to `Quarantined` if it is not already.
    ///
    /// Returns `false` when the request was an exact replay of an open quarantine.
    pub fn quarantine(&mut self, extern_id: i64, reason: &str, comments: &str) -> DomainResult<bool> {
        let added = self.unit.add_quarantine(extern_id, reason, comments)?;
        if added && self.unit.status() != InventoryStatus::Quarantined {
            self.unit
                .transition_status(InventoryStatus::Quarantined, Some(reason.to_string()));
        }
        Ok(added)
    }

    pub fn update_quarantine(&mut self, extern_id: i64, reason: &str, comments: &str) -> DomainResult<()> {
        self.unit.update_quarantine(extern_id, reason, comments)
    }

    pub fn remove_quarantine(&mut self, extern_id: i64) -> DomainResult<()> {
        self.unit.remove_quarantine(extern_id)
    }

    pub fn complete_shipment(&mut self, shipment_type: ShipmentType) {
        let status = match shipment_type {
            ShipmentType::InternalTransfer => InventoryStatus::InTransit,
            ShipmentType::Customer => InventoryStatus::Shipped,
        };
        self.unit.transition_status(status, None);
    }

    pub fn discard(&mut self, reason: &str, comments: Option<String>) -> DomainResult<()> {
        require_text("discard reason", reason)?;

        self.unit
            .transition_status(InventoryStatus::Discarded, Some(reason.to_string()));
        self.unit.set_comments(comments);
        Ok(())
    }

    pub fn update_storage(&mut self, device_stored: Option<String>, storage_location: Option<String>) {
        self.unit.set_storage(device_stored, storage_location);
    }

    pub fn convert(&mut self) {
        self.unit
            .transition_status(InventoryStatus::Converted, Some(CONVERTED_REASON.to_string()));
    }

    pub fn modify(&mut self) {
        self.unit
            .transition_status(InventoryStatus::Modified, Some(MODIFIED_REASON.to_string()));
    }

    pub fn label(&mut self, is_licensed: bool, expiration_date: Option<DateTime<Utc>>) {
        self.unit.set_label(true, is_licensed);
        self.unit.set_expiration_date(expiration_date);
    }

    pub fn invalidate_label(&mut self) {
        self.unit.set_label(false, false);
    }

    /// Flag the unit unsuitable. Converted units are left untouched.
    ///
    /// Returns whether the flag was applied.
    pub fn unsuit(&mut self, reason: &str) -> DomainResult<bool> {
        require_text("unsuitable reason", reason)?;

        if self.unit.status() == InventoryStatus::Converted {
            tracing::info!(unit = %self.unit.key(), "skipping unsuitable for converted unit");
            return Ok(false);
        }
        self.unit.set_unsuitable_reason(Some(reason.to_string()));
        Ok(true)
    }

    pub fn put_in_carton(&mut self, carton_number: &str) -> DomainResult<()> {
        require_text("carton number", carton_number)?;

        self.unit.transition_status(InventoryStatus::Packed, None);
        self.unit.set_carton_number(Some(carton_number.to_string()));
        Ok(())
    }

    /// Take the unit out of `carton_number`; other cartons are ignored.
    ///
    /// Returns whether the unit was in that carton.
    pub fn remove_from_carton(&mut self, carton_number: &str) -> bool {
        if self.unit.carton_number() != Some(carton_number) {
            return false;
        }
        self.unit.transition_status(InventoryStatus::Available, None);
        self.unit.set_carton_number(None);
        true
    }

    pub fn carton_shipped(&mut self) {
        self.unit.transition_status(InventoryStatus::Shipped, None);
    }

    /// Restore the state recorded before the latest change.
    pub fn recover(&mut self) -> DomainResult<()> {
        self.unit.restore_history()
    }

    /// Evaluate whether the unit can ship from `location`.
    ///
    /// Rules are checked in order and only the first failing rule is reported;
    /// an empty result means the unit can ship.
    pub fn check_valid_to_ship(&self, location: &str, now: DateTime<Utc>) -> Vec<Notification> {
        let unit = &self.unit;

        let finding = if unit.location() != location {
            Some(Notification::plain(NotificationKind::InventoryNotFoundInLocation, None))
        } else if unit.status() == InventoryStatus::Discarded {
            self.status_notification()
        } else if let Some(reason) = unit.unsuitable_reason() {
            Some(Notification::new(
                NotificationKind::InventoryIsUnsuitable,
                reason,
                Some(reason.to_string()),
            ))
        } else if self.quarantined || unit.has_open_quarantines() {
            let details = unit.quarantines().iter().map(|q| q.display_reason()).collect();
            Some(Notification::plain(NotificationKind::InventoryIsQuarantined, None).with_details(details))
        } else if !unit.is_labeled() {
            Some(Notification::plain(NotificationKind::InventoryIsUnlabeled, None))
        } else if self.is_expired(now) {
            Some(Notification::plain(
                NotificationKind::InventoryIsExpired,
                Some(EXPIRED_REASON.to_string()),
            ))
        } else if !self.is_available() {
            self.status_notification()
        } else {
            None
        };

        finding.into_iter().collect()
    }

    fn status_notification(&self) -> Option<Notification> {
        let kind = NotificationKind::from_status(self.unit.status())?;
        let message = match self.unit.status_reason() {
            Some(reason) if !reason.trim().is_empty() => {
                if reason == OTHER_REASON {
                    explain_reason(reason, self.unit.comments())
                } else {
                    reason.to_string()
                }
            }
            _ => kind.name().to_string(),
        };
        Some(Notification::new(kind, message, None))
    }

    /// State to publish after a successful save.
    pub fn snapshot(&self) -> UnitSnapshot {
        UnitSnapshot {
            key: self.unit.key().clone(),
            status: self.unit.status(),
            status_reason: self.unit.status_reason().map(str::to_string),
            location: self.unit.location().to_string(),
            quarantines: self.unit.quarantines().to_vec(),
            quarantined: self.quarantined,
        }
    }

    pub fn to_event(&self, update: UpdateKind, occurred_at: DateTime<Utc>) -> InventoryEvent {
        InventoryEvent {
            update,
            unit: self.snapshot(),
            occurred_at,
        }
    }
}

impl AggregateRoot for InventoryAggregate {
    type Id = UnitKey;

    fn id(&self) -> &Self::Id {
        self.unit.key()
    }

    fn version(&self) -> u64 {
        self.version
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::unit::tests::{available_unit, test_key};
    use crate::unit::NewInventoryUnit;
    use unitrack_core::DomainError;

    fn in_transit_aggregate() -> InventoryAggregate {
        let unit = InventoryUnit::create(NewInventoryUnit::new(
            test_key(),
            InventoryStatus::InTransit,
            "OLD_LOCATION",
        ))
        .unwrap();
        InventoryAggregate::new(unit)
    }

    /// Labeled, available, unexpired unit at LOCATION_1.
    fn shippable_aggregate() -> InventoryAggregate {
        let mut agg = InventoryAggregate::new(available_unit());
        agg.label(true, Some(Utc::now() + Duration::days(10)));
        agg
    }

    #[test]
    fn product_received_without_quarantine() {
        let mut agg = in_transit_aggregate();

        agg.product_received("NEW_LOCATION", false).unwrap();

        assert_eq!(agg.unit().status(), InventoryStatus::Available);
        assert_eq!(agg.unit().location(), "NEW_LOCATION");
        assert!(!agg.is_quarantined());
        assert_eq!(agg.unit().histories().last().unwrap().status, InventoryStatus::InTransit);
    }

    #[test]
    fn product_received_with_quarantine_sets_flag_regardless_of_quarantine_list() {
        let mut agg = in_transit_aggregate();

        agg.product_received("NEW_LOCATION", true).unwrap();

        assert_eq!(agg.unit().status(), InventoryStatus::Available);
        assert_eq!(agg.unit().location(), "NEW_LOCATION");
        assert!(agg.is_quarantined());
        assert!(agg.unit().quarantines().is_empty());
    }

    #[test]
    fn flag_and_quarantine_list_diverge() {
        // The received flag and the open quarantines are independent signals.
        let mut agg = in_transit_aggregate();
        agg.quarantine(1, "Contamination", "Detected contamination").unwrap();

        agg.product_received("NEW_LOCATION", false).unwrap();

        assert!(!agg.is_quarantined());
        assert_eq!(agg.unit().quarantines().len(), 1);
        assert_eq!(agg.unit().status(), InventoryStatus::Available);
    }

    #[test]
    fn product_received_rejects_blank_location_without_side_effects() {
        let mut agg = in_transit_aggregate();
        let before = agg.clone();

        let err = agg.product_received("  ", true).unwrap_err();

        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(agg, before);
    }

    #[test]
    fn quarantine_transitions_once_and_release_restores() {
        let mut agg = InventoryAggregate::new(available_unit());

        assert!(agg.quarantine(1, "Contamination", "Detected contamination").unwrap());
        assert!(agg.quarantine(2, OTHER_REASON, "Second").unwrap());
        assert_eq!(agg.unit().status(), InventoryStatus::Quarantined);
        assert_eq!(agg.unit().histories().len(), 1);

        agg.remove_quarantine(1).unwrap();
        assert_eq!(agg.unit().status(), InventoryStatus::Quarantined);

        agg.remove_quarantine(2).unwrap();
        assert_eq!(agg.unit().status(), InventoryStatus::Available);
    }

    #[test]
    fn release_after_discard_and_recover_restores_pre_quarantine_status() {
        let mut agg = InventoryAggregate::new(available_unit());
        agg.quarantine(1, "Contamination", "Detected contamination").unwrap();
        agg.discard("Broken", None).unwrap();
        agg.recover().unwrap();
        assert_eq!(agg.unit().status(), InventoryStatus::Quarantined);

        agg.remove_quarantine(1).unwrap();

        assert_eq!(agg.unit().status(), InventoryStatus::Available);
        assert!(agg.unit().quarantines().is_empty());
        assert_eq!(agg.unit().histories().len(), 4);
    }

    #[test]
    fn unit_created_quarantined_is_released_to_available() {
        let unit = InventoryUnit::create(NewInventoryUnit::new(
            test_key(),
            InventoryStatus::Quarantined,
            "LOCATION_1",
        ))
        .unwrap();
        let mut agg = InventoryAggregate::new(unit);
        agg.quarantine(1, "Contamination", "c").unwrap();

        agg.remove_quarantine(1).unwrap();

        assert_eq!(agg.unit().status(), InventoryStatus::Available);
        assert!(agg.unit().quarantines().is_empty());
    }

    #[test]
    fn quarantine_replay_does_not_record_history() {
        let mut agg = InventoryAggregate::new(available_unit());
        agg.quarantine(1, "Contamination", "c").unwrap();
        let before = agg.clone();

        assert!(!agg.quarantine(1, "Contamination", "c").unwrap());
        assert_eq!(agg, before);
    }

    #[test]
    fn complete_shipment_depends_on_type() {
        let mut agg = InventoryAggregate::new(available_unit());
        agg.complete_shipment(ShipmentType::InternalTransfer);
        assert_eq!(agg.unit().status(), InventoryStatus::InTransit);

        agg.complete_shipment(ShipmentType::Customer);
        assert_eq!(agg.unit().status(), InventoryStatus::Shipped);
    }

    #[test]
    fn discard_sets_reason_and_comments() {
        let mut agg = InventoryAggregate::new(available_unit());

        agg.discard("Expired", Some("Product is expired".to_string())).unwrap();

        assert_eq!(agg.unit().status(), InventoryStatus::Discarded);
        assert_eq!(agg.unit().status_reason(), Some("Expired"));
        assert_eq!(agg.unit().comments(), Some("Product is expired"));
        // The snapshot is taken before the comments change.
        assert_eq!(agg.unit().histories().last().unwrap().comments, None);
    }

    #[test]
    fn recover_restores_discarded_unit() {
        let mut agg = InventoryAggregate::new(available_unit());
        agg.discard("Broken", None).unwrap();

        agg.recover().unwrap();

        assert!(agg.is_available());
    }

    #[test]
    fn convert_and_modify_use_fixed_reasons() {
        let mut agg = InventoryAggregate::new(available_unit());
        agg.convert();
        assert_eq!(agg.unit().status(), InventoryStatus::Converted);
        assert_eq!(agg.unit().status_reason(), Some(CONVERTED_REASON));

        agg.modify();
        assert_eq!(agg.unit().status(), InventoryStatus::Modified);
        assert_eq!(agg.unit().status_reason(), Some(MODIFIED_REASON));
    }

    #[test]
    fn unsuit_skips_converted_units() {
        let mut agg = InventoryAggregate::new(available_unit());
        agg.convert();

        assert!(!agg.unsuit("Damaged packaging").unwrap());
        assert_eq!(agg.unit().unsuitable_reason(), None);
    }

    #[test]
    fn carton_round_trip() {
        let mut agg = InventoryAggregate::new(available_unit());
        agg.put_in_carton("C-1").unwrap();
        assert_eq!(agg.unit().status(), InventoryStatus::Packed);

        assert!(!agg.remove_from_carton("C-2"));
        assert_eq!(agg.unit().status(), InventoryStatus::Packed);

        assert!(agg.remove_from_carton("C-1"));
        assert_eq!(agg.unit().status(), InventoryStatus::Available);
        assert_eq!(agg.unit().carton_number(), None);
    }

    #[test]
    fn shippable_unit_has_no_notifications() {
        let agg = shippable_aggregate();
        assert!(agg.check_valid_to_ship("LOCATION_1", Utc::now()).is_empty());
    }

    #[test]
    fn ship_check_reports_location_mismatch_first() {
        let mut agg = shippable_aggregate();
        agg.discard("Broken", None).unwrap();

        let found = agg.check_valid_to_ship("LOCATION_2", Utc::now());

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, NotificationKind::InventoryNotFoundInLocation);
    }

    #[test]
    fn ship_check_reports_discard_reason() {
        let mut agg = shippable_aggregate();
        agg.discard(OTHER_REASON, Some("Bag leaking".to_string())).unwrap();

        let found = agg.check_valid_to_ship("LOCATION_1", Utc::now());

        assert_eq!(found[0].kind, NotificationKind::InventoryIsDiscarded);
        assert_eq!(found[0].message, "OTHER: Bag leaking");
    }

    #[test]
    fn ship_check_lists_quarantine_details() {
        let mut agg = shippable_aggregate();
        agg.quarantine(1, "UNDER_INVESTIGATION", "x").unwrap();
        agg.quarantine(2, OTHER_REASON, "a comment").unwrap();

        let found = agg.check_valid_to_ship("LOCATION_1", Utc::now());

        assert_eq!(found[0].kind, NotificationKind::InventoryIsQuarantined);
        assert_eq!(found[0].code, 4);
        assert_eq!(found[0].details, vec!["UNDER_INVESTIGATION", "OTHER: a comment"]);
    }

    #[test]
    fn ship_check_honours_received_flag() {
        let mut agg = shippable_aggregate();
        agg.product_received("LOCATION_1", true).unwrap();

        let found = agg.check_valid_to_ship("LOCATION_1", Utc::now());

        assert_eq!(found[0].kind, NotificationKind::InventoryIsQuarantined);
        assert!(found[0].details.is_empty());
    }

    #[test]
    fn ship_check_reports_unlabeled_then_expired() {
        let mut agg = InventoryAggregate::new(available_unit());
        let found = agg.check_valid_to_ship("LOCATION_1", Utc::now());
        assert_eq!(found[0].kind, NotificationKind::InventoryIsUnlabeled);

        agg.label(false, Some(Utc::now() - Duration::days(1)));
        let found = agg.check_valid_to_ship("LOCATION_1", Utc::now());
        assert_eq!(found[0].kind, NotificationKind::InventoryIsExpired);
        assert_eq!(found[0].reason.as_deref(), Some(EXPIRED_REASON));
    }

    #[test]
    fn ship_check_reports_non_available_status() {
        let mut agg = shippable_aggregate();
        agg.put_in_carton("C-1").unwrap();

        let found = agg.check_valid_to_ship("LOCATION_1", Utc::now());

        assert_eq!(found[0].kind, NotificationKind::InventoryIsPacked);
        assert_eq!(found[0].message, "INVENTORY_IS_PACKED");
    }

    #[test]
    fn rehydrate_validates_unit() {
        let agg = InventoryAggregate::rehydrate(available_unit(), true, 3).unwrap();
        assert_eq!(agg.version(), 3);
        assert!(agg.is_quarantined());
    }

    #[test]
    fn event_carries_post_mutation_state() {
        let mut agg = in_transit_aggregate();
        agg.product_received("NEW_LOCATION", true).unwrap();

        let event = agg.to_event(UpdateKind::Received, Utc::now());

        assert_eq!(event.unit.status, InventoryStatus::Available);
        assert_eq!(event.unit.location, "NEW_LOCATION");
        assert!(event.unit.quarantined);
        assert_eq!(unitrack_events::Event::event_type(&event), "inventory.unit.received");
    }
}
