//! Inbound trigger execution (application-level orchestration).
//!
//! Every trigger runs the same pipeline against one unit:
//!
//! ```text
//! Trigger
//!   ↓
//! 1. Load aggregate by (unit number, product code)
//!   ↓
//! 2. Apply the domain operation in memory
//!   ↓
//! 3. Save with an exact expected version
//!   ↓   (version conflict → reload and reapply, up to `max_retries` times)
//! 4. Publish the post-save state to the event bus
//! ```
//!
//! Nothing is published unless the save succeeded, and a trigger that leaves
//! the unit unchanged (a redelivered message) neither saves nor publishes.

use chrono::Utc;
use thiserror::Error;
use tracing::instrument;
use uuid::Uuid;

use unitrack_core::{AggregateRoot, DomainError, DomainResult, ExpectedVersion, UnitKey};
use unitrack_events::{EventBus, EventEnvelope};
use unitrack_inventory::{
    InventoryAggregate, InventoryEvent, InventoryStatus, InventoryUnit, NewInventoryUnit,
    Notification, ShipmentType, UpdateKind,
};

use crate::config::DEFAULT_SAVE_MAX_RETRIES;
use crate::repository::{InventoryRepository, RepositoryError};

pub mod triggers;

pub use triggers::{
    ImportedQuarantine, ProductDiscarded, ProductImported, ProductStored, QuarantineAction,
    QuarantineRequested, ShipmentCompleted, UnitReceived, UnitTrigger,
};

/// Aggregate type written into every published envelope.
pub const AGGREGATE_TYPE: &str = "inventory.unit";

pub type InventoryEnvelope = EventEnvelope<InventoryEvent>;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("duplicate: {0}")]
    Duplicate(String),

    /// Version conflicts persisted after every retry.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invariant violated: {0}")]
    Invariant(String),

    #[error("repository failure: {0}")]
    Repository(RepositoryError),

    /// The state was saved but publication failed; republishing is safe.
    #[error("event publication failed after save: {0}")]
    Publish(String),
}

impl From<DomainError> for WorkflowError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => WorkflowError::Validation(msg),
            DomainError::InvariantViolation(msg) => WorkflowError::Invariant(msg),
            DomainError::NotFound(msg) => WorkflowError::NotFound(msg),
            DomainError::Duplicate(msg) => WorkflowError::Duplicate(msg),
            DomainError::Conflict(msg) => WorkflowError::Conflict(msg),
        }
    }
}

impl From<RepositoryError> for WorkflowError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::Conflict(msg) => WorkflowError::Conflict(msg),
            other => WorkflowError::Repository(other),
        }
    }
}

/// Result of a trigger that did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The unit was saved at `version` and `envelope` was published.
    Saved { version: u64, envelope: InventoryEnvelope },
    /// The trigger was already reflected in the stored state.
    Unchanged { version: u64 },
}

impl Outcome {
    pub fn version(&self) -> u64 {
        match self {
            Outcome::Saved { version, .. } | Outcome::Unchanged { version } => *version,
        }
    }

    pub fn envelope(&self) -> Option<&InventoryEnvelope> {
        match self {
            Outcome::Saved { envelope, .. } => Some(envelope),
            Outcome::Unchanged { .. } => None,
        }
    }
}

/// What a trigger decided after looking at the loaded state.
enum Decision {
    Save(InventoryAggregate, UpdateKind),
    Unchanged(u64),
}

/// Runs inbound triggers against the repository and publishes the results.
///
/// - `R`: repository implementation
/// - `B`: event bus carrying typed inventory envelopes
#[derive(Debug)]
pub struct InventoryWorkflow<R, B> {
    repository: R,
    bus: B,
    max_retries: u32,
}

impl<R, B> InventoryWorkflow<R, B> {
    pub fn new(repository: R, bus: B) -> Self {
        Self {
            repository,
            bus,
            max_retries: DEFAULT_SAVE_MAX_RETRIES,
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }
}

impl<R, B> InventoryWorkflow<R, B>
where
    R: InventoryRepository,
    B: EventBus<InventoryEnvelope>,
{
    /// Load a unit, failing with `NotFound` if it was never saved.
    pub async fn get(&self, key: &UnitKey) -> Result<InventoryAggregate, WorkflowError> {
        self.repository
            .find(key)
            .await?
            .ok_or_else(|| WorkflowError::NotFound(format!("inventory unit {key}")))
    }

    /// Ship-readiness findings for a unit at `location`.
    pub async fn check_valid_to_ship(
        &self,
        key: &UnitKey,
        location: &str,
    ) -> Result<Vec<Notification>, WorkflowError> {
        let aggregate = self.get(key).await?;
        Ok(aggregate.check_valid_to_ship(location, Utc::now()))
    }

    /// Create the unit, or re-apply its import quarantines if it already exists.
    #[instrument(
        skip(self, trigger),
        fields(unit_number = %trigger.unit_number, product_code = %trigger.product_code),
        err
    )]
    pub async fn product_imported(&self, trigger: &ProductImported) -> Result<Outcome, WorkflowError> {
        let key = trigger.key()?;

        self.run(&key, |loaded| {
            let (mut aggregate, created) = match loaded {
                Some(existing) => (existing, false),
                None => {
                    if trigger.status == InventoryStatus::Quarantined {
                        return Err(DomainError::validation(
                            "import status cannot be QUARANTINED; send the quarantines instead",
                        ));
                    }
                    let unit = InventoryUnit::create(NewInventoryUnit {
                        key: key.clone(),
                        status: trigger.status,
                        location: trigger.location.clone(),
                        expiration_date: trigger.expiration_date,
                        is_labeled: trigger.is_labeled,
                        is_licensed: trigger.is_licensed,
                        attributes: trigger.attributes.clone(),
                    })?;
                    (InventoryAggregate::new(unit), true)
                }
            };

            let mut changed = created;
            for q in &trigger.quarantines {
                changed |= aggregate.quarantine(q.extern_id, &q.reason, &q.comments)?;
            }
            let update = if created { UpdateKind::Created } else { UpdateKind::Quarantined };
            Ok(decide(aggregate, changed, update))
        })
        .await
    }

    #[instrument(
        skip(self, trigger),
        fields(
            unit_number = %trigger.unit_number,
            product_code = %trigger.product_code,
            extern_id = trigger.extern_id,
            action = ?trigger.action
        ),
        err
    )]
    pub async fn quarantine_requested(&self, trigger: &QuarantineRequested) -> Result<Outcome, WorkflowError> {
        let key = trigger.key()?;
        let update = match trigger.action {
            QuarantineAction::Add => UpdateKind::Quarantined,
            QuarantineAction::Update => UpdateKind::QuarantineUpdated,
            QuarantineAction::Remove => UpdateKind::QuarantineRemoved,
        };

        self.mutate(&key, update, |aggregate| match trigger.action {
            QuarantineAction::Add => aggregate.quarantine(trigger.extern_id, &trigger.reason, &trigger.comments),
            QuarantineAction::Update => {
                let unchanged = aggregate.unit().quarantine(trigger.extern_id).is_some_and(|q| {
                    q.reason == trigger.reason && q.comments == trigger.comments
                });
                if unchanged {
                    return Ok(false);
                }
                aggregate.update_quarantine(trigger.extern_id, &trigger.reason, &trigger.comments)?;
                Ok(true)
            }
            QuarantineAction::Remove => {
                aggregate.remove_quarantine(trigger.extern_id)?;
                Ok(true)
            }
        })
        .await
    }

    #[instrument(
        skip(self, trigger),
        fields(
            unit_number = %trigger.unit_number,
            product_code = %trigger.product_code,
            location = %trigger.location,
            has_quarantine = trigger.has_quarantine
        ),
        err
    )]
    pub async fn unit_received(&self, trigger: &UnitReceived) -> Result<Outcome, WorkflowError> {
        let key = trigger.key()?;

        self.mutate(&key, UpdateKind::Received, |aggregate| {
            aggregate.product_received(&trigger.location, trigger.has_quarantine)?;
            Ok(true)
        })
        .await
    }

    #[instrument(
        skip(self, trigger),
        fields(unit_number = %trigger.unit_number, product_code = %trigger.product_code),
        err
    )]
    pub async fn product_discarded(&self, trigger: &ProductDiscarded) -> Result<Outcome, WorkflowError> {
        let key = trigger.key()?;

        self.mutate(&key, UpdateKind::Discarded, |aggregate| {
            let unit = aggregate.unit();
            if unit.status() == InventoryStatus::Discarded
                && unit.status_reason() == Some(trigger.reason.as_str())
                && unit.comments() == trigger.comments.as_deref()
            {
                return Ok(false);
            }
            aggregate.discard(&trigger.reason, trigger.comments.clone())?;
            Ok(true)
        })
        .await
    }

    #[instrument(
        skip(self, trigger),
        fields(
            unit_number = %trigger.unit_number,
            product_code = %trigger.product_code,
            shipment_type = ?trigger.shipment_type
        ),
        err
    )]
    pub async fn shipment_completed(&self, trigger: &ShipmentCompleted) -> Result<Outcome, WorkflowError> {
        let key = trigger.key()?;
        let target = match trigger.shipment_type {
            ShipmentType::InternalTransfer => InventoryStatus::InTransit,
            ShipmentType::Customer => InventoryStatus::Shipped,
        };

        self.mutate(&key, UpdateKind::Shipped, |aggregate| {
            if aggregate.unit().status() == target {
                return Ok(false);
            }
            aggregate.complete_shipment(trigger.shipment_type);
            Ok(true)
        })
        .await
    }

    #[instrument(
        skip(self, trigger),
        fields(unit_number = %trigger.unit_number, product_code = %trigger.product_code),
        err
    )]
    pub async fn product_stored(&self, trigger: &ProductStored) -> Result<Outcome, WorkflowError> {
        let key = trigger.key()?;

        self.mutate(&key, UpdateKind::StorageUpdated, |aggregate| {
            let unit = aggregate.unit();
            if unit.device_stored() == trigger.device_stored.as_deref()
                && unit.storage_location() == trigger.storage_location.as_deref()
            {
                return Ok(false);
            }
            aggregate.update_storage(trigger.device_stored.clone(), trigger.storage_location.clone());
            Ok(true)
        })
        .await
    }

    /// Apply `operation` to an existing unit; `Ok(false)` means nothing changed.
    async fn mutate<F>(&self, key: &UnitKey, update: UpdateKind, mut operation: F) -> Result<Outcome, WorkflowError>
    where
        F: FnMut(&mut InventoryAggregate) -> DomainResult<bool> + Send,
    {
        self.run(key, |loaded| {
            let mut aggregate = loaded.ok_or_else(|| DomainError::not_found(format!("inventory unit {key}")))?;
            let changed = operation(&mut aggregate)?;
            Ok(decide(aggregate, changed, update))
        })
        .await
    }

    /// Load → decide → save → publish, reloading on version conflicts.
    async fn run<F>(&self, key: &UnitKey, mut step: F) -> Result<Outcome, WorkflowError>
    where
        F: FnMut(Option<InventoryAggregate>) -> DomainResult<Decision> + Send,
    {
        let mut attempt = 0u32;
        loop {
            let loaded = self.repository.find(key).await?;

            let (mut aggregate, update) = match step(loaded) {
                Ok(Decision::Save(aggregate, update)) => (aggregate, update),
                Ok(Decision::Unchanged(version)) => {
                    tracing::debug!(unit = %key, version, "trigger already applied; nothing to save");
                    return Ok(Outcome::Unchanged { version });
                }
                Err(err) => {
                    tracing::info!(unit = %key, error = %err, "trigger rejected by domain rules");
                    return Err(err.into());
                }
            };

            let expected = ExpectedVersion::for_loaded(&aggregate);
            match self.repository.save(&aggregate, expected).await {
                Ok(version) => {
                    aggregate.mark_saved(version);
                    tracing::debug!(unit = %key, version, "unit saved");
                    let envelope = self.publish(&aggregate, update)?;
                    return Ok(Outcome::Saved { version, envelope });
                }
                Err(err) if err.is_conflict() && attempt < self.max_retries => {
                    attempt += 1;
                    tracing::warn!(unit = %key, attempt, error = %err, "version conflict; reloading");
                }
                Err(err) => {
                    if err.is_conflict() {
                        tracing::warn!(unit = %key, attempts = attempt + 1, "giving up after repeated version conflicts");
                    }
                    return Err(err.into());
                }
            }
        }
    }

    fn publish(&self, aggregate: &InventoryAggregate, update: UpdateKind) -> Result<InventoryEnvelope, WorkflowError> {
        let envelope = EventEnvelope::wrap(
            Uuid::now_v7(),
            aggregate.key().to_string(),
            AGGREGATE_TYPE,
            aggregate.version(),
            aggregate.to_event(update, Utc::now()),
        );

        self.bus.publish(envelope.clone()).map_err(|e| {
            tracing::error!(unit = %aggregate.key(), error = ?e, "publication failed after save");
            WorkflowError::Publish(format!("{e:?}"))
        })?;

        Ok(envelope)
    }
}

fn decide(aggregate: InventoryAggregate, changed: bool, update: UpdateKind) -> Decision {
    if changed {
        Decision::Save(aggregate, update)
    } else {
        Decision::Unchanged(aggregate.version())
    }
}
