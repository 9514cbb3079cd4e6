use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use unitrack_core::{ExpectedVersion, UnitKey};
use unitrack_inventory::InventoryAggregate;

use super::{InventoryRepository, RepositoryError, StoredUnit};

/// In-memory inventory repository.
///
/// Intended for tests/dev. Records are stored as owned clones, so a caller
/// mutating a loaded aggregate never affects the stored copy until `save`.
#[derive(Debug, Default)]
pub struct InMemoryInventoryRepository {
    units: RwLock<HashMap<UnitKey, StoredUnit>>,
}

impl InMemoryInventoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored units.
    pub fn len(&self) -> usize {
        self.units.read().map(|u| u.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl InventoryRepository for InMemoryInventoryRepository {
    async fn find(&self, key: &UnitKey) -> Result<Option<InventoryAggregate>, RepositoryError> {
        let units = self
            .units
            .read()
            .map_err(|_| RepositoryError::Backend("lock poisoned".to_string()))?;

        units.get(key).cloned().map(StoredUnit::into_aggregate).transpose()
    }

    async fn save(
        &self,
        aggregate: &InventoryAggregate,
        expected: ExpectedVersion,
    ) -> Result<u64, RepositoryError> {
        let mut units = self
            .units
            .write()
            .map_err(|_| RepositoryError::Backend("lock poisoned".to_string()))?;

        let key = aggregate.key();
        let current = units.get(key).map(|s| s.version).unwrap_or(0);
        expected.check(current)?;

        let next = current + 1;
        units.insert(key.clone(), StoredUnit::capture(aggregate, next));
        Ok(next)
    }
}
