use serde::{Deserialize, Serialize};

use unitrack_core::ValueObject;

use crate::status::InventoryStatus;

/// Audit record of a unit's (status, reason, comments) just before a change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistorySnapshot {
    pub status: InventoryStatus,
    pub reason: Option<String>,
    pub comments: Option<String>,
}

impl HistorySnapshot {
    pub fn new(status: InventoryStatus, reason: Option<String>, comments: Option<String>) -> Self {
        Self {
            status,
            reason,
            comments,
        }
    }
}

impl ValueObject for HistorySnapshot {}
