//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects have no identity: two instances with the same attribute
/// values are interchangeable. They are immutable; "changing" one means
/// replacing it with a new value.
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq, Eq)]
/// struct Quarantine {
///     extern_id: i64,
///     reason: String,
///     comments: String,
/// }
///
/// impl ValueObject for Quarantine {}
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
