//! The inventory unit entity: owns status, open quarantines and audit history.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use unitrack_core::{DomainError, DomainResult, Entity, UnitKey, require_text};

use crate::history::HistorySnapshot;
use crate::quarantine::Quarantine;
use crate::status::InventoryStatus;

/// Descriptive attributes carried for downstream reporting.
///
/// None of these take part in lifecycle decisions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnitAttributes {
    pub product_family: Option<String>,
    pub abo_rh: Option<String>,
    pub collection_date: Option<NaiveDate>,
    pub weight_grams: Option<u32>,
    pub temperature_category: Option<String>,
}

/// Everything needed to create a unit at receipt/import time.
#[derive(Debug, Clone, PartialEq)]
pub struct NewInventoryUnit {
    pub key: UnitKey,
    pub status: InventoryStatus,
    pub location: String,
    pub expiration_date: Option<DateTime<Utc>>,
    pub is_labeled: bool,
    pub is_licensed: bool,
    pub attributes: UnitAttributes,
}

impl NewInventoryUnit {
    /// Minimal creation parameters; labels and attributes default to empty.
    pub fn new(key: UnitKey, status: InventoryStatus, location: impl Into<String>) -> Self {
        Self {
            key,
            status,
            location: location.into(),
            expiration_date: None,
            is_labeled: false,
            is_licensed: false,
            attributes: UnitAttributes::default(),
        }
    }
}

/// A physical inventoried unit.
///
/// Collections are owned here and exposed only as slices; every mutation goes
/// through a method that keeps these invariants:
///
/// - at most one open quarantine per `extern_id`
/// - `histories` only grows, entries are never rewritten or reordered
/// - each status transition first records the pre-transition state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryUnit {
    key: UnitKey,
    status: InventoryStatus,
    location: String,
    status_reason: Option<String>,
    comments: Option<String>,
    quarantines: Vec<Quarantine>,
    histories: Vec<HistorySnapshot>,
    /// State the unit was in when its current quarantine episode began.
    #[serde(default)]
    pre_quarantine: Option<HistorySnapshot>,

    is_labeled: bool,
    is_licensed: bool,
    unsuitable_reason: Option<String>,
    carton_number: Option<String>,
    device_stored: Option<String>,
    storage_location: Option<String>,
    expiration_date: Option<DateTime<Utc>>,
    attributes: UnitAttributes,
}

impl InventoryUnit {
    /// Create a unit with its initial status and no quarantines or history.
    pub fn create(new: NewInventoryUnit) -> DomainResult<Self> {
        require_text("location", &new.location)?;

        Ok(Self {
            key: new.key,
            status: new.status,
            location: new.location,
            status_reason: None,
            comments: None,
            quarantines: Vec::new(),
            histories: Vec::new(),
            pre_quarantine: None,
            is_labeled: new.is_labeled,
            is_licensed: new.is_licensed,
            unsuitable_reason: None,
            carton_number: None,
            device_stored: None,
            storage_location: None,
            expiration_date: new.expiration_date,
            attributes: new.attributes,
        })
    }

    pub fn key(&self) -> &UnitKey {
        &self.key
    }

    pub fn status(&self) -> InventoryStatus {
        self.status
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn status_reason(&self) -> Option<&str> {
        self.status_reason.as_deref()
    }

    pub fn comments(&self) -> Option<&str> {
        self.comments.as_deref()
    }

    pub fn quarantines(&self) -> &[Quarantine] {
        &self.quarantines
    }

    pub fn quarantine(&self, extern_id: i64) -> Option<&Quarantine> {
        self.quarantines.iter().find(|q| q.extern_id == extern_id)
    }

    pub fn has_open_quarantines(&self) -> bool {
        !self.quarantines.is_empty()
    }

    pub fn histories(&self) -> &[HistorySnapshot] {
        &self.histories
    }

    pub fn is_labeled(&self) -> bool {
        self.is_labeled
    }

    pub fn is_licensed(&self) -> bool {
        self.is_licensed
    }

    pub fn unsuitable_reason(&self) -> Option<&str> {
        self.unsuitable_reason.as_deref()
    }

    pub fn carton_number(&self) -> Option<&str> {
        self.carton_number.as_deref()
    }

    pub fn device_stored(&self) -> Option<&str> {
        self.device_stored.as_deref()
    }

    pub fn storage_location(&self) -> Option<&str> {
        self.storage_location.as_deref()
    }

    pub fn expiration_date(&self) -> Option<DateTime<Utc>> {
        self.expiration_date
    }

    pub fn attributes(&self) -> &UnitAttributes {
        &self.attributes
    }

    /// Record the current state, then move to `status` with `reason`.
    pub fn transition_status(&mut self, status: InventoryStatus, reason: Option<String>) {
        if status == InventoryStatus::Quarantined {
            self.begin_quarantine_episode();
        } else if self.quarantines.is_empty() {
            self.pre_quarantine = None;
        }
        self.create_history();
        self.status = status;
        self.status_reason = reason;
    }

    /// Remember the current state as the one to restore once every quarantine
    /// is closed. An episode already in progress keeps its original state.
    fn begin_quarantine_episode(&mut self) {
        if self.pre_quarantine.is_none() && self.status != InventoryStatus::Quarantined {
            self.pre_quarantine = Some(self.current_snapshot());
        }
    }

    fn current_snapshot(&self) -> HistorySnapshot {
        HistorySnapshot::new(self.status, self.status_reason.clone(), self.comments.clone())
    }

    /// Record the current (status, reason, comments) without changing state.
    pub fn create_history(&mut self) {
        let snapshot = self.current_snapshot();
        self.histories.push(snapshot);
    }

    /// Open a quarantine.
    ///
    /// Returns `Ok(true)` when added and `Ok(false)` when an identical entry is
    /// already open (a redelivered request). The same id with different
    /// content is a `Duplicate`. Status is not touched.
    pub fn add_quarantine(
        &mut self,
        extern_id: i64,
        reason: impl Into<String>,
        comments: impl Into<String>,
    ) -> DomainResult<bool> {
        let candidate = Quarantine::new(extern_id, reason, comments);
        require_text("quarantine reason", &candidate.reason)?;

        if let Some(existing) = self.quarantine(extern_id) {
            if *existing == candidate {
                return Ok(false);
            }
            return Err(DomainError::duplicate(format!(
                "quarantine {extern_id} is already open on {}",
                self.key
            )));
        }

        if self.quarantines.is_empty() {
            self.begin_quarantine_episode();
        }
        self.quarantines.push(candidate);
        Ok(true)
    }

    /// Replace reason and comments of an open quarantine in place.
    pub fn update_quarantine(
        &mut self,
        extern_id: i64,
        reason: impl Into<String>,
        comments: impl Into<String>,
    ) -> DomainResult<()> {
        let reason = reason.into();
        require_text("quarantine reason", &reason)?;

        let key = &self.key;
        let entry = self
            .quarantines
            .iter_mut()
            .find(|q| q.extern_id == extern_id)
            .ok_or_else(|| DomainError::not_found(format!("quarantine {extern_id} on {key}")))?;

        entry.reason = reason;
        entry.comments = comments.into();
        Ok(())
    }

    /// Close a quarantine.
    ///
    /// When the last one closes on a `Quarantined` unit, the status rolls back
    /// to the state recorded when the quarantine episode began, or to
    /// `Available` for a unit that was never seen outside `Quarantined`. A unit
    /// whose status is no longer `Quarantined` keeps its status.
    pub fn remove_quarantine(&mut self, extern_id: i64) -> DomainResult<()> {
        let idx = self
            .quarantines
            .iter()
            .position(|q| q.extern_id == extern_id)
            .ok_or_else(|| DomainError::not_found(format!("quarantine {extern_id} on {}", self.key)))?;

        self.quarantines.remove(idx);

        if !self.quarantines.is_empty() {
            return Ok(());
        }

        let previous = self.pre_quarantine.take();
        if self.status == InventoryStatus::Quarantined {
            let (status, reason) = previous
                .map(|p| (p.status, p.reason))
                .unwrap_or((InventoryStatus::Available, None));
            self.transition_status(status, reason);
        }
        Ok(())
    }

    /// Undo the latest change: restore (status, reason, comments) from the most
    /// recent snapshot. The restore is itself recorded.
    pub fn restore_history(&mut self) -> DomainResult<()> {
        let last = self
            .histories
            .last()
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("history of {}", self.key)))?;

        self.transition_status(last.status, last.reason);
        self.comments = last.comments;
        Ok(())
    }

    pub fn set_location(&mut self, location: impl Into<String>) -> DomainResult<()> {
        let location = location.into();
        require_text("location", &location)?;
        self.location = location;
        Ok(())
    }

    pub fn set_comments(&mut self, comments: Option<String>) {
        self.comments = comments;
    }

    pub fn set_storage(&mut self, device_stored: Option<String>, storage_location: Option<String>) {
        self.device_stored = device_stored;
        self.storage_location = storage_location;
    }

    pub fn set_label(&mut self, is_labeled: bool, is_licensed: bool) {
        self.is_labeled = is_labeled;
        self.is_licensed = is_licensed;
    }

    pub fn set_expiration_date(&mut self, expiration_date: Option<DateTime<Utc>>) {
        self.expiration_date = expiration_date;
    }

    pub fn set_unsuitable_reason(&mut self, reason: Option<String>) {
        self.unsuitable_reason = reason;
    }

    pub fn set_carton_number(&mut self, carton_number: Option<String>) {
        self.carton_number = carton_number;
    }

    /// Validate a unit that did not come through `create` (e.g. loaded from storage).
    pub fn check_invariants(&self) -> DomainResult<()> {
        require_text("location", &self.location)?;

        for (idx, q) in self.quarantines.iter().enumerate() {
            if self.quarantines[..idx].iter().any(|p| p.extern_id == q.extern_id) {
                return Err(DomainError::invariant(format!(
                    "quarantine {} appears more than once on {}",
                    q.extern_id, self.key
                )));
            }
            if q.reason.trim().is_empty() {
                return Err(DomainError::invariant(format!(
                    "quarantine {} on {} has no reason",
                    q.extern_id, self.key
                )));
            }
        }
        Ok(())
    }
}

impl Entity for InventoryUnit {
    type Id = UnitKey;

    fn id(&self) -> &Self::Id {
        &self.key
    }
}
