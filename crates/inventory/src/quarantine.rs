use serde::{Deserialize, Serialize};

use unitrack_core::ValueObject;

/// Reason code whose free-text comment carries the actual explanation.
pub const OTHER_REASON: &str = "OTHER";

/// An open hold on a unit, keyed by the upstream system's correlation id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quarantine {
    pub extern_id: i64,
    pub reason: String,
    pub comments: String,
}

impl Quarantine {
    pub fn new(extern_id: i64, reason: impl Into<String>, comments: impl Into<String>) -> Self {
        Self {
            extern_id,
            reason: reason.into(),
            comments: comments.into(),
        }
    }

    /// Human-facing reason: the reason code, or `OTHER: <comments>`.
    pub fn display_reason(&self) -> String {
        explain_reason(&self.reason, Some(&self.comments))
    }
}

impl ValueObject for Quarantine {}

pub(crate) fn explain_reason(reason: &str, comments: Option<&str>) -> String {
    if reason == OTHER_REASON {
        format!("{OTHER_REASON}: {}", comments.unwrap_or_default())
    } else {
        reason.to_string()
    }
}
