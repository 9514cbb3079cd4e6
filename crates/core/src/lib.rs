//! `unitrack-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod aggregate;
pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use aggregate::{AggregateRoot, ExpectedVersion};
pub use entity::Entity;
pub use error::{require_text, DomainError, DomainResult};
pub use id::{ProductCode, UnitKey, UnitNumber};
pub use value_object::ValueObject;
