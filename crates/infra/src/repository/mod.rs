//! Load/save port for inventory aggregates.
//!
//! A repository persists one aggregate per [`UnitKey`] together with a version
//! number. `save` is guarded by an [`ExpectedVersion`] check so that two
//! workflows racing on the same unit cannot both win: the loser gets
//! [`RepositoryError::Conflict`] and is expected to reload and reapply.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use unitrack_core::{DomainError, ExpectedVersion, UnitKey};
use unitrack_inventory::{InventoryAggregate, InventoryUnit};

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryInventoryRepository;
pub use postgres::PostgresInventoryRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The stored version no longer matches the version the caller loaded.
    #[error("version conflict: {0}")]
    Conflict(String),

    /// A stored record could not be turned back into a valid aggregate.
    #[error("corrupt record for {key}: {reason}")]
    Corrupt { key: String, reason: String },

    /// The storage backend failed.
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl RepositoryError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, RepositoryError::Conflict(_))
    }
}

impl From<DomainError> for RepositoryError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Conflict(msg) => RepositoryError::Conflict(msg),
            other => RepositoryError::Backend(other.to_string()),
        }
    }
}

/// Persistence port for [`InventoryAggregate`].
#[async_trait]
pub trait InventoryRepository: Send + Sync {
    /// Load the aggregate for `key`, or `None` if the unit was never saved.
    async fn find(&self, key: &UnitKey) -> Result<Option<InventoryAggregate>, RepositoryError>;

    /// Persist `aggregate` if the stored version matches `expected`.
    ///
    /// Returns the new version. The first save of a unit produces version 1.
    async fn save(
        &self,
        aggregate: &InventoryAggregate,
        expected: ExpectedVersion,
    ) -> Result<u64, RepositoryError>;
}

#[async_trait]
impl<R> InventoryRepository for std::sync::Arc<R>
where
    R: InventoryRepository + ?Sized,
{
    async fn find(&self, key: &UnitKey) -> Result<Option<InventoryAggregate>, RepositoryError> {
        (**self).find(key).await
    }

    async fn save(
        &self,
        aggregate: &InventoryAggregate,
        expected: ExpectedVersion,
    ) -> Result<u64, RepositoryError> {
        (**self).save(aggregate, expected).await
    }
}

/// Serialized form of an aggregate: the unit document plus the aggregate flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct StoredUnit {
    pub version: u64,
    pub quarantined: bool,
    pub unit: InventoryUnit,
}

impl StoredUnit {
    pub(crate) fn capture(aggregate: &InventoryAggregate, version: u64) -> Self {
        Self {
            version,
            quarantined: aggregate.is_quarantined(),
            unit: aggregate.unit().clone(),
        }
    }

    pub(crate) fn into_aggregate(self) -> Result<InventoryAggregate, RepositoryError> {
        let key = self.unit.key().to_string();
        InventoryAggregate::rehydrate(self.unit, self.quarantined, self.version).map_err(|e| {
            RepositoryError::Corrupt {
                key,
                reason: e.to_string(),
            }
        })
    }
}
