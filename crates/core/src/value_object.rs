//! Value object trait: equality by value, not identity.
//!
//! Value objects have **no identity**. Two recipes listing the same
//! ingredients in the same order are the same recipe, regardless of which
//! drink they belong to.

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by their attribute values. To
/// "modify" one, build a new value and replace it on the owning entity.
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq, Eq)]
/// struct Ingredient {
///     name: String,
///     color: String,
///     parts: u32,
/// }
///
/// impl ValueObject for Ingredient {}
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
