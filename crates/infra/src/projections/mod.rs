//! Projection implementations (read model builders).
//!
//! Projections consume published inventory envelopes and build query-optimized
//! read models. All projections are:
//! - **Rebuildable**: Can be reconstructed from the published envelopes
//! - **Idempotent**: Safe for at-least-once delivery

pub mod unit_status;

pub use unit_status::{UnitStatusProjection, UnitStatusProjectionError, UnitStatusView};
