//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Implemented by small immutable types (identifiers, entry modes, persisted
/// references) that are compared by their attributes only.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
