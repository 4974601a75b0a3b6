//! Service key types for the dependency injection container.

use std::any::TypeId;

/// Key for service storage and lookup.
///
/// Keys identify a service contract. Concrete types and trait objects have
/// separate variants because their instances are stored differently: a
/// concrete `T` is held as `Arc<T>`, a trait object `dyn Trait` as
/// `Arc<Arc<dyn Trait>>` behind the type-erased pointer.
///
/// Equality and hashing use the `TypeId` (plus the name for named keys); the
/// type name string is carried only for diagnostics.
///
/// # Examples
///
/// ```rust
/// use strata_di::{Key, key_of_type, key_of_trait};
///
/// trait Logger: Send + Sync {}
///
/// let concrete = key_of_type::<u32>();
/// let named = key_of_type::<u32>().named("port");
/// let contract = key_of_trait::<dyn Logger>();
///
/// assert_eq!(concrete.display_name(), "u32");
/// assert_ne!(concrete, named);
/// assert_eq!(named.service_name(), Some("port"));
/// assert!(contract.is_trait());
/// ```
#[derive(Debug, Clone)]
pub enum Key {
    /// Concrete type key with TypeId and name for diagnostics
    Type(TypeId, &'static str),
    /// Trait object key with the TypeId of `dyn Trait`
    Trait(TypeId, &'static str),
    /// Named concrete type key with TypeId, typename, and name
    TypeNamed(TypeId, &'static str, &'static str),
    /// Named trait object key with TypeId, trait name, and name
    TraitNamed(TypeId, &'static str, &'static str),
}

impl Key {
    /// Get the type or trait name for display
    pub fn display_name(&self) -> &'static str {
        match self {
            Key::Type(_, name) => name,
            Key::Trait(_, name) => name,
            Key::TypeNamed(_, name, _) => name,
            Key::TraitNamed(_, name, _) => name,
        }
    }

    /// Get the service name for named services, or None for unnamed services
    pub fn service_name(&self) -> Option<&'static str> {
        match self {
            Key::Type(..) | Key::Trait(..) => None,
            Key::TypeNamed(_, _, name) | Key::TraitNamed(_, _, name) => Some(name),
        }
    }

    /// The `TypeId` of the contract this key names.
    pub fn type_id(&self) -> TypeId {
        match self {
            Key::Type(id, _)
            | Key::Trait(id, _)
            | Key::TypeNamed(id, _, _)
            | Key::TraitNamed(id, _, _) => *id,
        }
    }

    /// True when instances for this key are stored as `Arc<Arc<dyn Trait>>`.
    pub fn is_trait(&self) -> bool {
        matches!(self, Key::Trait(..) | Key::TraitNamed(..))
    }

    /// Returns the named form of this key. Naming a named key renames it.
    pub fn named(self, name: &'static str) -> Key {
        match self {
            Key::Type(id, type_name) | Key::TypeNamed(id, type_name, _) => {
                Key::TypeNamed(id, type_name, name)
            }
            Key::Trait(id, trait_name) | Key::TraitNamed(id, trait_name, _) => {
                Key::TraitNamed(id, trait_name, name)
            }
        }
    }
}

impl PartialEq for Key {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            // TypeId comparison only, the string is diagnostic
            (Key::Type(a, _), Key::Type(b, _)) => a == b,
            (Key::Trait(a, _), Key::Trait(b, _)) => a == b,
            (Key::TypeNamed(a, _, name_a), Key::TypeNamed(b, _, name_b)) => {
                a == b && name_a == name_b
            }
            (Key::TraitNamed(a, _, name_a), Key::TraitNamed(b, _, name_b)) => {
                a == b && name_a == name_b
            }
            _ => false,
        }
    }
}

impl Eq for Key {}

impl std::hash::Hash for Key {
    #[inline(always)]
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            Key::Type(id, _) => {
                0u8.hash(state);
                id.hash(state);
            }
            Key::Trait(id, _) => {
                1u8.hash(state);
                id.hash(state);
            }
            Key::TypeNamed(id, _, name) => {
                2u8.hash(state);
                id.hash(state);
                name.hash(state);
            }
            Key::TraitNamed(id, _, name) => {
                3u8.hash(state);
                id.hash(state);
                name.hash(state);
            }
        }
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.service_name() {
            Some(name) => write!(f, "{}[{}]", self.display_name(), name),
            None => f.write_str(self.display_name()),
        }
    }
}

/// Key for a concrete service type `T`.
#[inline(always)]
pub fn key_of_type<T: 'static>() -> Key {
    Key::Type(TypeId::of::<T>(), std::any::type_name::<T>())
}

/// Key for a trait object contract such as `dyn Logger`.
#[inline(always)]
pub fn key_of_trait<T: ?Sized + 'static>() -> Key {
    Key::Trait(TypeId::of::<T>(), std::any::type_name::<T>())
}

/// One or more keys a factory is bound to.
///
/// Lets `register` take a single key or any list of keys (fan-out
/// registration).
pub trait IntoKeys {
    fn into_keys(self) -> Vec<Key>;
}

impl IntoKeys for Key {
    fn into_keys(self) -> Vec<Key> {
        vec![self]
    }
}

impl IntoKeys for &Key {
    fn into_keys(self) -> Vec<Key> {
        vec![self.clone()]
    }
}

impl IntoKeys for Vec<Key> {
    fn into_keys(self) -> Vec<Key> {
        self
    }
}

impl IntoKeys for &[Key] {
    fn into_keys(self) -> Vec<Key> {
        self.to_vec()
    }
}

impl<const N: usize> IntoKeys for [Key; N] {
    fn into_keys(self) -> Vec<Key> {
        self.into()
    }
}
