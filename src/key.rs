//! Type identity keys for the container registry and caches.

use std::any::TypeId;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Type identity used as the sole key for registry and cache lookups.
///
/// A key wraps the [`TypeId`] of a type together with its `type_name`. Only the
/// `TypeId` takes part in equality, ordering and hashing; the name exists for
/// error messages and logs.
///
/// Keys work for unsized types too, so `dyn Trait` interfaces are first-class
/// identities:
///
/// ```rust
/// use ferrous_ioc::Key;
///
/// trait Clock: Send + Sync {}
///
/// let a = Key::of::<dyn Clock>();
/// let b = Key::of::<dyn Clock>();
/// assert_eq!(a, b);
/// assert_ne!(a, Key::of::<String>());
/// assert!(a.display_name().contains("Clock"));
/// ```
#[derive(Clone, Copy)]
pub struct Key {
    id: TypeId,
    name: &'static str,
}

impl Key {
    /// Returns the key identifying `T`.
    #[inline(always)]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// The underlying `TypeId`.
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.id
    }

    /// Get the type name for display
    ///
    /// This is the `std::any::type_name` result and is meant for diagnostics
    /// only; it is not guaranteed to be unique or stable across compilers.
    #[inline]
    pub fn display_name(&self) -> &'static str {
        self.name
    }
}

// Hot path: TypeId-only comparison, the name is ignored
impl PartialEq for Key {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Key {}

impl Hash for Key {
    #[inline(always)]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for Key {
    #[inline(always)]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Key {
    #[inline(always)]
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({})", self.name)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Helper for creating type keys.
#[inline(always)]
pub fn key_of_type<T: ?Sized + 'static>() -> Key {
    Key::of::<T>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    trait Greeter: Send + Sync {}

    #[test]
    fn test_equality_follows_type_id() {
        assert_eq!(Key::of::<u32>(), key_of_type::<u32>());
        assert_ne!(Key::of::<u32>(), Key::of::<u64>());
        assert_ne!(Key::of::<dyn Greeter>(), Key::of::<Box<dyn Greeter>>());
    }

    #[test]
    fn test_hash_set_dedupes() {
        let mut set = HashSet::new();
        set.insert(Key::of::<String>());
        set.insert(Key::of::<String>());
        set.insert(Key::of::<dyn Greeter>());
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_display_uses_type_name() {
        let key = Key::of::<String>();
        assert_eq!(key.to_string(), std::any::type_name::<String>());
        assert_eq!(format!("{:?}", key), format!("Key({})", std::any::type_name::<String>()));
    }
}
