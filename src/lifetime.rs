//! Service lifetimes and the caching wrappers that implement them.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::DiResult;
use crate::factory::{AnyArc, ServiceFactory};
use crate::internal::{CacheKey, Disposer};
use crate::key::Key;
use crate::provider::ResolverContext;
use crate::traits::{AsyncDispose, BoxFutureUnit, Dispose, ResolverCore};

/// Service lifetimes controlling instance caching behavior
///
/// # Examples
///
/// ```rust
/// use strata_di::{ServiceCollection, Resolver};
///
/// struct Database { url: String }
/// struct Repository { db_url: String }
/// struct RequestModel { id: u32 }
///
/// let mut services = ServiceCollection::new();
///
/// // Singleton: one instance for the whole provider tree
/// services.add_singleton(Database { url: "postgres://localhost".to_string() });
///
/// // Scoped: one instance per scope
/// services.add_scoped_factory::<Repository, _>(|r| {
///     let db = r.get_required::<Database>();
///     Repository { db_url: db.url.clone() }
/// });
///
/// // Transient: new instance every time
/// services.add_transient_factory::<RequestModel, _>(|_| RequestModel { id: 12345 });
///
/// let provider = services.build();
///
/// let db1 = provider.get_required::<Database>();
/// let scope1 = provider.create_scope();
/// let db2 = scope1.get_required::<Database>();
/// assert!(std::ptr::eq(&*db1, &*db2));
///
/// let repo1a = scope1.get_required::<Repository>();
/// let repo1b = scope1.get_required::<Repository>();
/// assert!(std::ptr::eq(&*repo1a, &*repo1b));
///
/// let scope2 = provider.create_scope();
/// let repo2 = scope2.get_required::<Repository>();
/// assert!(!std::ptr::eq(&*repo1a, &*repo2));
///
/// let model1 = scope1.get_required::<RequestModel>();
/// let model2 = scope1.get_required::<RequestModel>();
/// assert!(!std::ptr::eq(&*model1, &*model2));
/// assert_eq!(model1.id, 12345);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifetime {
    /// One instance per root provider, shared by every descendant scope
    Singleton,
    /// One instance per scope that resolves it
    Scoped,
    /// New instance per resolution, never cached
    Transient,
}

impl Lifetime {
    /// Wraps `factory` in the caching policy this lifetime names.
    pub fn apply<F: ServiceFactory>(self, factory: F) -> Arc<dyn ServiceFactory> {
        match self {
            Lifetime::Singleton => Arc::new(singleton(factory)),
            Lifetime::Scoped => Arc::new(scoped(factory)),
            Lifetime::Transient => Arc::new(factory),
        }
    }
}

/// Identity of a caching wrapper. Clones of a wrapper share it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FactoryId(u64);

impl FactoryId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        FactoryId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

type DisposeHook = Arc<dyn Fn(&AnyArc) -> Option<Disposer> + Send + Sync>;

fn sync_hook<T: Dispose>() -> DisposeHook {
    Arc::new(|any: &AnyArc| {
        let service = any.clone().downcast::<T>().ok()?;
        Some(Disposer::Sync(Box::new(move || service.dispose())))
    })
}

fn sync_trait_hook<T: ?Sized + Dispose>() -> DisposeHook {
    Arc::new(|any: &AnyArc| {
        let service = any.clone().downcast::<Arc<T>>().ok()?;
        Some(Disposer::Sync(Box::new(move || service.dispose())))
    })
}

fn async_hook<T: AsyncDispose>() -> DisposeHook {
    Arc::new(|any: &AnyArc| {
        let service = any.clone().downcast::<T>().ok()?;
        Some(Disposer::Async(Box::new(move || {
            Box::pin(async move { service.dispose().await }) as BoxFutureUnit
        })))
    })
}

fn push_hook(hook: &Option<DisposeHook>, value: &AnyArc, owner: &ResolverContext<'_>) {
    match hook.as_ref().and_then(|hook| hook(value)) {
        Some(Disposer::Sync(f)) => owner.push_sync_disposer(f),
        Some(Disposer::Async(f)) => owner.push_async_disposer(f),
        None => {}
    }
}

/// Caches the inner factory's result in the root provider.
///
/// Created with [`singleton`]. The inner factory runs at most once for the
/// whole provider tree, and keys of the same contract it is bound to share
/// that instance. Its dependencies are resolved from the scope that
/// triggered creation, and any disposal hooks it registers belong to
/// the root.
pub struct Singleton<F> {
    id: FactoryId,
    inner: Arc<F>,
    on_dispose: Option<DisposeHook>,
}

impl<F> Clone for Singleton<F> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            inner: self.inner.clone(),
            on_dispose: self.on_dispose.clone(),
        }
    }
}

impl<F> Singleton<F> {
    pub fn id(&self) -> FactoryId {
        self.id
    }

    /// Disposes the cached `T` when the root provider is disposed.
    pub fn disposing<T: Dispose>(mut self) -> Self {
        self.on_dispose = Some(sync_hook::<T>());
        self
    }

    /// Like [`disposing`](Self::disposing) for a trait-object service.
    pub fn disposing_trait<T: ?Sized + Dispose>(mut self) -> Self {
        self.on_dispose = Some(sync_trait_hook::<T>());
        self
    }

    /// Disposes the cached `T` asynchronously from `dispose_async`.
    pub fn disposing_async<T: AsyncDispose>(mut self) -> Self {
        self.on_dispose = Some(async_hook::<T>());
        self
    }
}

impl<F: ServiceFactory> ServiceFactory for Singleton<F> {
    fn create(&self, key: &Key, resolver: &ResolverContext<'_>) -> DiResult<AnyArc> {
        let owner = resolver.for_singleton();
        let (value, created) = resolver
            .singleton_cache()
            .get_or_try_create(CacheKey::new(self.id, key), || self.inner.create(key, &owner))?;
        if created {
            push_hook(&self.on_dispose, &value, &owner);
        }
        Ok(value)
    }

    fn lifetime(&self) -> Lifetime {
        Lifetime::Singleton
    }
}

/// Caches the inner factory's result in the scope that resolves it.
///
/// Created with [`scoped`]. Each scope constructs its own instance on first
/// resolution; a disposal hook attached with [`disposing`](Self::disposing)
/// runs when that scope is disposed.
pub struct Scoped<F> {
    id: FactoryId,
    inner: Arc<F>,
    on_dispose: Option<DisposeHook>,
}

impl<F> Clone for Scoped<F> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            inner: self.inner.clone(),
            on_dispose: self.on_dispose.clone(),
        }
    }
}

impl<F> Scoped<F> {
    pub fn id(&self) -> FactoryId {
        self.id
    }

    /// Disposes each scope's `T` when that scope is disposed.
    pub fn disposing<T: Dispose>(mut self) -> Self {
        self.on_dispose = Some(sync_hook::<T>());
        self
    }

    /// Like [`disposing`](Self::disposing) for a trait-object service.
    pub fn disposing_trait<T: ?Sized + Dispose>(mut self) -> Self {
        self.on_dispose = Some(sync_trait_hook::<T>());
        self
    }

    /// Disposes each scope's `T` asynchronously from `dispose_async`.
    pub fn disposing_async<T: AsyncDispose>(mut self) -> Self {
        self.on_dispose = Some(async_hook::<T>());
        self
    }
}

impl<F: ServiceFactory> ServiceFactory for Scoped<F> {
    fn create(&self, key: &Key, resolver: &ResolverContext<'_>) -> DiResult<AnyArc> {
        // Hooks go to the requesting scope even under a singleton's construction
        let owner = ResolverContext::new(resolver.provider());
        let (value, created) = resolver
            .scoped_cache()
            .get_or_try_create(CacheKey::new(self.id, key), || self.inner.create(key, &owner))?;
        if created {
            push_hook(&self.on_dispose, &value, &owner);
        }
        Ok(value)
    }

    fn lifetime(&self) -> Lifetime {
        Lifetime::Scoped
    }
}

/// Wraps `factory` so the root provider caches its result.
///
/// ```rust
/// use strata_di::{factory_fn, key_of_type, singleton, AnyArc, Resolver, ServiceCollection};
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// static BUILT: AtomicUsize = AtomicUsize::new(0);
///
/// let provider = ServiceCollection::new().build();
/// provider.register(
///     key_of_type::<u64>(),
///     singleton(factory_fn(|_, _| {
///         BUILT.fetch_add(1, Ordering::SeqCst);
///         Ok(Arc::new(99u64) as AnyArc)
///     })),
/// );
///
/// let scope = provider.create_scope();
/// assert!(Arc::ptr_eq(&provider.get_required::<u64>(), &scope.get_required::<u64>()));
/// assert_eq!(BUILT.load(Ordering::SeqCst), 1);
/// ```
pub fn singleton<F: ServiceFactory>(factory: F) -> Singleton<F> {
    Singleton {
        id: FactoryId::next(),
        inner: Arc::new(factory),
        on_dispose: None,
    }
}

/// Wraps `factory` so each scope caches its own result.
pub fn scoped<F: ServiceFactory>(factory: F) -> Scoped<F> {
    Scoped {
        id: FactoryId::next(),
        inner: Arc::new(factory),
        on_dispose: None,
    }
}
