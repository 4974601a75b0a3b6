//! The service factory contract.
//!
//! Every registration in the container is an `Arc<dyn ServiceFactory>`. A
//! factory receives the key it is being asked for together with the
//! requesting scope's [`ResolverContext`], and returns a type-erased instance.
//! Lifetime wrappers, derived (auto-wired) factories and the typed helpers on
//! `ServiceCollection` are all built on this one trait.

use std::any::Any;
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::provider::ResolverContext;

/// Type-erased `Arc` used for service storage.
///
/// Concrete services are stored as `Arc<T>`; trait-object services as
/// `Arc<Arc<dyn Trait>>`.
pub type AnyArc = Arc<dyn Any + Send + Sync>;

/// Produces service instances on demand.
///
/// Implementations may call back into `resolver` to obtain their own
/// dependencies. The returned value must match the storage convention of
/// `key` (see [`AnyArc`]).
///
/// # Examples
///
/// ```rust
/// use strata_di::{factory_fn, key_of_type, AnyArc, Resolver, ServiceCollection};
/// use std::sync::Arc;
///
/// let mut services = ServiceCollection::new();
/// services.register(
///     key_of_type::<String>(),
///     factory_fn(|key, _resolver| Ok(Arc::new(format!("built for {}", key)) as AnyArc)),
/// );
///
/// let provider = services.build();
/// let text = provider.get_required::<String>();
/// assert_eq!(text.as_str(), "built for alloc::string::String");
/// ```
pub trait ServiceFactory: Send + Sync + 'static {
    /// Creates (or fetches) the instance for `key`.
    fn create(&self, key: &Key, resolver: &ResolverContext<'_>) -> DiResult<AnyArc>;

    /// Caching policy applied by this factory, used for introspection.
    fn lifetime(&self) -> Lifetime {
        Lifetime::Transient
    }
}

impl<F> ServiceFactory for Arc<F>
where
    F: ServiceFactory + ?Sized,
{
    fn create(&self, key: &Key, resolver: &ResolverContext<'_>) -> DiResult<AnyArc> {
        (**self).create(key, resolver)
    }

    fn lifetime(&self) -> Lifetime {
        (**self).lifetime()
    }
}

/// Factory backed by a closure. Build one with [`factory_fn`].
pub struct FnFactory<F> {
    f: F,
}

impl<F> ServiceFactory for FnFactory<F>
where
    F: Fn(&Key, &ResolverContext<'_>) -> DiResult<AnyArc> + Send + Sync + 'static,
{
    fn create(&self, key: &Key, resolver: &ResolverContext<'_>) -> DiResult<AnyArc> {
        (self.f)(key, resolver)
    }
}

/// Turns a closure `(key, resolver) -> instance` into a [`ServiceFactory`].
pub fn factory_fn<F>(f: F) -> FnFactory<F>
where
    F: Fn(&Key, &ResolverContext<'_>) -> DiResult<AnyArc> + Send + Sync + 'static,
{
    FnFactory { f }
}

/// Factory that always hands out one pre-built instance.
pub(crate) struct InstanceFactory {
    value: AnyArc,
}

impl InstanceFactory {
    pub(crate) fn new(value: AnyArc) -> Self {
        Self { value }
    }
}

impl ServiceFactory for InstanceFactory {
    fn create(&self, _key: &Key, _resolver: &ResolverContext<'_>) -> DiResult<AnyArc> {
        Ok(self.value.clone())
    }

    fn lifetime(&self) -> Lifetime {
        Lifetime::Singleton
    }
}

#[inline]
pub(crate) fn downcast_concrete<T>(any: AnyArc) -> DiResult<Arc<T>>
where
    T: Send + Sync + 'static,
{
    any.downcast::<T>()
        .map_err(|_| DiError::TypeMismatch(std::any::type_name::<T>()))
}

#[inline]
pub(crate) fn downcast_trait<T>(any: AnyArc) -> DiResult<Arc<T>>
where
    T: ?Sized + Send + Sync + 'static,
{
    any.downcast::<Arc<T>>()
        .map(|boxed| (*boxed).clone())
        .map_err(|_| DiError::TypeMismatch(std::any::type_name::<T>()))
}
