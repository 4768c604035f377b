//! Entity capability: stable identity, equality over identity only.

use std::fmt::Debug;
use std::hash::Hash;

/// An object with a persistent identity that never changes over its lifetime.
///
/// Implementors compare and hash by [`Entity::id`] alone; use
/// [`identity_equality!`](crate::entity::identity_equality) to derive those
/// impls.
pub trait Entity {
    /// Strongly-typed identifier.
    type Id: Clone + Eq + Hash + Debug;

    /// Returns the identifier.
    fn id(&self) -> &Self::Id;

    /// Returns true if both values denote the same entity, whatever their
    /// current attributes.
    fn same_identity_as(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

/// Implements `PartialEq`, `Eq` and `Hash` for an entity in terms of its id.
macro_rules! identity_equality {
    ($ty:ty) => {
        impl PartialEq for $ty {
            fn eq(&self, other: &Self) -> bool {
                $crate::entity::Entity::id(self) == $crate::entity::Entity::id(other)
            }
        }

        impl Eq for $ty {}

        impl std::hash::Hash for $ty {
            fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
                std::hash::Hash::hash($crate::entity::Entity::id(self), state);
            }
        }
    };
}

pub(crate) use identity_equality;
