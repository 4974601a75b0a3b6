//! Service registration types and the layered registry chain.

use std::sync::Arc;

use parking_lot::RwLock;
use smallvec::SmallVec;

use crate::factory::ServiceFactory;
use crate::key::Key;

#[cfg(feature = "ahash")]
type Map<K, V> = ahash::AHashMap<K, V>;
#[cfg(not(feature = "ahash"))]
type Map<K, V> = std::collections::HashMap<K, V>;

/// One factory bound to one key.
#[derive(Clone)]
pub(crate) struct Registration {
    pub(crate) factory: Arc<dyn ServiceFactory>,
    /// Implementation type name for diagnostics, when the registering helper knows it
    pub(crate) impl_name: Option<&'static str>,
}

impl Registration {
    pub(crate) fn new(factory: Arc<dyn ServiceFactory>) -> Self {
        Self { factory, impl_name: None }
    }

    pub(crate) fn with_impl(factory: Arc<dyn ServiceFactory>, impl_name: &'static str) -> Self {
        Self { factory, impl_name: Some(impl_name) }
    }
}

/// A single registry layer: key to factories in registration order.
#[derive(Default)]
pub(crate) struct Registry {
    entries: Map<Key, SmallVec<[Registration; 1]>>,
    // Key insertion order, for stable introspection output
    order: Vec<Key>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Appends `registration` to the list for `key`. Never replaces.
    pub(crate) fn push(&mut self, key: Key, registration: Registration) {
        match self.entries.get_mut(&key) {
            Some(list) => list.push(registration),
            None => {
                self.order.push(key.clone());
                let mut list = SmallVec::new();
                list.push(registration);
                self.entries.insert(key, list);
            }
        }
    }

    #[inline]
    pub(crate) fn first(&self, key: &Key) -> Option<&Registration> {
        self.entries.get(key).and_then(|list| list.first())
    }

    #[inline]
    pub(crate) fn all(&self, key: &Key) -> &[Registration] {
        self.entries.get(key).map(|list| list.as_slice()).unwrap_or(&[])
    }

    #[inline]
    pub(crate) fn contains(&self, key: &Key) -> bool {
        self.entries.get(key).is_some_and(|list| !list.is_empty())
    }

    /// Every registration, keys in first-registration order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (&Key, &Registration)> + '_ {
        self.order
            .iter()
            .flat_map(move |key| self.all(key).iter().map(move |reg| (key, reg)))
    }

    /// Moves every registration of `other` onto the end of this layer.
    pub(crate) fn append(&mut self, mut other: Registry) {
        for key in std::mem::take(&mut other.order) {
            if let Some(list) = other.entries.remove(&key) {
                for registration in list {
                    self.push(key.clone(), registration);
                }
            }
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.values().map(|list| list.len()).sum()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub(crate) type Layer = Arc<RwLock<Registry>>;

/// Registry layers visible from one scope, innermost first.
///
/// Only the first layer belongs to the owning scope; the rest are shared
/// with ancestors and only ever read through this chain.
#[derive(Clone)]
pub(crate) struct RegistryChain {
    layers: Vec<Layer>,
}

impl RegistryChain {
    pub(crate) fn root(registry: Registry) -> Self {
        Self { layers: vec![Arc::new(RwLock::new(registry))] }
    }

    /// The chain of a child scope: a fresh empty layer ahead of this one.
    pub(crate) fn child(&self) -> Self {
        let mut layers = Vec::with_capacity(self.layers.len() + 1);
        layers.push(Arc::new(RwLock::new(Registry::new())));
        layers.extend(self.layers.iter().cloned());
        Self { layers }
    }

    /// The owning scope's writable layer.
    pub(crate) fn own(&self) -> &Layer {
        &self.layers[0]
    }

    pub(crate) fn depth(&self) -> usize {
        self.layers.len()
    }

    pub(crate) fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Index of the innermost layer holding any factory for `key`.
    pub(crate) fn find_layer(&self, key: &Key) -> Option<usize> {
        self.layers.iter().position(|layer| layer.read().contains(key))
    }

    /// The first factory registered for `key` in layer `index`.
    pub(crate) fn select_in_layer(&self, index: usize, key: &Key) -> Option<Registration> {
        self.layers.get(index)?.read().first(key).cloned()
    }

    pub(crate) fn resolve_single(&self, key: &Key) -> Option<Registration> {
        let index = self.find_layer(key)?;
        self.select_in_layer(index, key)
    }

    /// Every factory for `key`, innermost layer first, registration order within a layer.
    pub(crate) fn resolve_all(&self, key: &Key) -> Vec<Registration> {
        let mut out = Vec::new();
        for layer in &self.layers {
            out.extend(layer.read().all(key).iter().cloned());
        }
        out
    }
}
