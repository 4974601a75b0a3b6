//! Lock-guarded lazy instance cache shared by the lifetime wrappers.
//!
//! One cell exists per wrapper and storage contract. The map lock is held only long
//! enough to fetch or insert the cell; construction runs inside the cell's
//! own initializer, so concurrent first access constructs at most once and a
//! factory may resolve other cached services while it runs.

use std::any::TypeId;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;

use crate::error::DiResult;
use crate::factory::AnyArc;
use crate::key::Key;
use crate::lifetime::FactoryId;

#[cfg(feature = "ahash")]
type Map<K, V> = ahash::AHashMap<K, V>;
#[cfg(not(feature = "ahash"))]
type Map<K, V> = std::collections::HashMap<K, V>;

/// Cache slot identity: which wrapper produced it, and how it is stored.
///
/// Keys naming the same contract (for example two names of one type) share
/// a slot, so a wrapper bound to both constructs once. A concrete key and a
/// trait key need different `AnyArc` shapes and get separate slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct CacheKey {
    factory: FactoryId,
    contract: TypeId,
    is_trait: bool,
}

impl CacheKey {
    pub(crate) fn new(factory: FactoryId, key: &Key) -> Self {
        Self {
            factory,
            contract: key.type_id(),
            is_trait: key.is_trait(),
        }
    }
}

#[derive(Default)]
pub(crate) struct LifetimeCache {
    cells: Mutex<Map<CacheKey, Arc<OnceCell<AnyArc>>>>,
}

impl LifetimeCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Returns the cached instance, constructing it with `create` if absent.
    ///
    /// The flag is true only for the call that ran `create` successfully. A
    /// failed `create` leaves the slot empty.
    pub(crate) fn get_or_try_create<F>(&self, key: CacheKey, create: F) -> DiResult<(AnyArc, bool)>
    where
        F: FnOnce() -> DiResult<AnyArc>,
    {
        let cell = {
            let mut cells = self.cells.lock();
            cells.entry(key).or_default().clone()
        };

        if let Some(value) = cell.get() {
            return Ok((value.clone(), false));
        }

        let mut created = false;
        let value = cell
            .get_or_try_init(|| {
                let value = create()?;
                created = true;
                Ok::<_, crate::error::DiError>(value)
            })?
            .clone();
        Ok((value, created))
    }

    /// Number of constructed instances.
    pub(crate) fn len(&self) -> usize {
        self.cells.lock().values().filter(|cell| cell.get().is_some()).count()
    }

    /// Drops every cached instance.
    pub(crate) fn clear(&self) {
        self.cells.lock().clear();
    }
}
