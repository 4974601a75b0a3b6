//! Internal implementation details.

pub(crate) mod circular;
pub(crate) mod dispose_bag;
pub(crate) mod lifetime_cache;

pub(crate) use circular::with_circular_guard;
pub(crate) use dispose_bag::{DisposeBag, Disposer};
pub(crate) use lifetime_cache::{CacheKey, LifetimeCache};
