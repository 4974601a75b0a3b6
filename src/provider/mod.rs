//! Service provider: a scope over the registry chain.
//!
//! Every provider owns one registry layer, its scoped-instance cache and its
//! disposal hooks. The root provider additionally owns the singleton cache,
//! which all descendants share.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;

use crate::collection::ServiceCollection;
use crate::descriptors::ServiceDescriptor;
use crate::error::{DiError, DiResult};
use crate::factory::{AnyArc, ServiceFactory};
use crate::internal::{with_circular_guard, DisposeBag, Disposer, LifetimeCache};
use crate::key::{key_of_type, IntoKeys, Key};
use crate::observer::Observers;
use crate::registration::{Registration, Registry, RegistryChain};
use crate::traits::{BoxFutureUnit, ResolverCore};

mod context;
mod scope;

pub use context::ResolverContext;
pub use scope::ScopeGuard;

/// Service provider for resolving dependencies from the DI container.
///
/// A provider is a scope: the root is built from a [`ServiceCollection`],
/// and [`create_scope`](Self::create_scope) derives children that see their
/// own registrations first and their ancestors' after. Cloning is cheap and
/// yields a handle to the same scope.
///
/// Resolving `ServiceProvider` itself yields a new child scope of the
/// requesting provider.
///
/// # Examples
///
/// ```
/// use strata_di::{ServiceCollection, ServiceProvider, Resolver};
/// use std::sync::Arc;
///
/// struct Database { url: String }
/// struct UserService { db: Arc<Database> }
///
/// let mut collection = ServiceCollection::new();
/// collection.add_singleton(Database { url: "postgres://localhost".to_string() });
/// collection.add_transient_factory::<UserService, _>(|resolver| {
///     UserService { db: resolver.get_required::<Database>() }
/// });
///
/// let provider = collection.build();
/// let user_service = provider.get_required::<UserService>();
/// assert_eq!(user_service.db.url, "postgres://localhost");
///
/// let child = provider.get_required::<ServiceProvider>();
/// assert_eq!(child.depth(), 2);
/// ```
#[derive(Clone)]
pub struct ServiceProvider {
    inner: Arc<ProviderInner>,
}

pub(crate) struct ProviderInner {
    chain: RegistryChain,
    shared: Arc<SharedState>,
    scoped: LifetimeCache,
    disposers: Mutex<DisposeBag>,
    // Set by either dispose path; blocks resolution and runs sync hooks
    disposed: AtomicBool,
    // Set once dispose_async has drained the async hooks
    async_disposed: AtomicBool,
    is_root: bool,
}

/// State owned by the root and shared with every descendant.
pub(crate) struct SharedState {
    singletons: LifetimeCache,
    singleton_disposers: Mutex<DisposeBag>,
    observers: Observers,
    root_disposed: AtomicBool,
    root_async_disposed: AtomicBool,
}

impl ServiceProvider {
    pub(crate) fn new_root(registry: Registry, observers: Observers) -> Self {
        let shared = SharedState {
            singletons: LifetimeCache::new(),
            singleton_disposers: Mutex::new(DisposeBag::default()),
            observers,
            root_disposed: AtomicBool::new(false),
            root_async_disposed: AtomicBool::new(false),
        };
        Self::from_parts(RegistryChain::root(registry), Arc::new(shared), true)
    }

    fn from_parts(chain: RegistryChain, shared: Arc<SharedState>, is_root: bool) -> Self {
        Self {
            inner: Arc::new(ProviderInner {
                chain,
                shared,
                scoped: LifetimeCache::new(),
                disposers: Mutex::new(DisposeBag::default()),
                disposed: AtomicBool::new(false),
                async_disposed: AtomicBool::new(false),
                is_root,
            }),
        }
    }

    /// Number of registry layers visible from this scope. The root has depth 1.
    pub fn depth(&self) -> usize {
        self.inner.chain.depth()
    }

    pub fn is_root(&self) -> bool {
        self.inner.is_root
    }

    /// True when both handles refer to the same scope.
    pub fn same_scope(&self, other: &ServiceProvider) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Registers `factory` under each of `keys` in this scope's own layer.
    ///
    /// Registrations append; an earlier registration for the same key in
    /// this layer keeps answering single resolution. Ancestor scopes are
    /// never modified.
    ///
    /// ```
    /// use strata_di::{factory_fn, key_of_trait, key_of_type, singleton, AnyArc, Resolver, ServiceCollection};
    /// use std::sync::Arc;
    ///
    /// trait Greeter: Send + Sync {
    ///     fn greet(&self) -> String;
    /// }
    ///
    /// struct English;
    /// impl Greeter for English {
    ///     fn greet(&self) -> String { "hello".into() }
    /// }
    ///
    /// let provider = ServiceCollection::new().build();
    /// let scope = provider.create_scope();
    /// scope.register(
    ///     [key_of_trait::<dyn Greeter>(), key_of_type::<English>()],
    ///     singleton(factory_fn(|key, _| {
    ///         if key.is_trait() {
    ///             Ok(Arc::new(Arc::new(English) as Arc<dyn Greeter>) as AnyArc)
    ///         } else {
    ///             Ok(Arc::new(English) as AnyArc)
    ///         }
    ///     })),
    /// );
    ///
    /// assert_eq!(scope.get_required_trait::<dyn Greeter>().greet(), "hello");
    /// assert!(scope.get_service::<English>().unwrap().is_some());
    /// assert!(provider.get_service::<English>().unwrap().is_none());
    /// ```
    pub fn register<K, F>(&self, keys: K, factory: F) -> &Self
    where
        K: IntoKeys,
        F: ServiceFactory,
    {
        self.register_shared(keys, Arc::new(factory))
    }

    /// Like [`register`](Self::register) for an already shared factory.
    pub fn register_shared<K: IntoKeys>(&self, keys: K, factory: Arc<dyn ServiceFactory>) -> &Self {
        let mut own = self.inner.chain.own().write();
        for key in keys.into_keys() {
            own.push(key, Registration::new(factory.clone()));
        }
        self
    }

    /// Adds the registrations built by `f` to this scope's own layer.
    ///
    /// Observers cannot be added to a live provider; any added here are
    /// ignored.
    pub fn configure<F>(&self, f: F) -> &Self
    where
        F: FnOnce(&mut ServiceCollection),
    {
        let mut services = ServiceCollection::new();
        f(&mut services);
        let (registry, observers) = services.into_parts();
        if observers.has_observers() {
            tracing::warn!("observers added through configure are ignored");
        }
        self.inner.chain.own().write().append(registry);
        self
    }

    /// Lists every registration visible from this scope, innermost layer first.
    pub fn descriptors(&self) -> Vec<ServiceDescriptor> {
        let mut out = Vec::new();
        for (depth, layer) in self.inner.chain.layers().iter().enumerate() {
            let layer = layer.read();
            out.extend(
                layer
                    .iter()
                    .map(|(key, reg)| ServiceDescriptor::from_registration(key, reg, depth)),
            );
        }
        out
    }

    #[cfg(feature = "diagnostics")]
    pub fn to_debug_string(&self) -> String {
        let mut s = String::new();
        s.push_str("=== Service Provider Debug ===\n");
        for descriptor in self.descriptors() {
            s.push_str(&format!(
                "  [{}] {}: {:?}{}\n",
                descriptor.depth,
                descriptor.key,
                descriptor.lifetime,
                descriptor
                    .impl_type_name
                    .map(|name| format!(" ({})", name))
                    .unwrap_or_default()
            ));
        }
        s
    }

    fn ensure_active(&self) -> DiResult<()> {
        if self.inner.disposed.load(Ordering::Acquire)
            || self.inner.shared.root_disposed.load(Ordering::Acquire)
        {
            return Err(DiError::ScopeDisposed);
        }
        Ok(())
    }

    fn invoke(&self, key: &Key, registration: &Registration) -> DiResult<AnyArc> {
        let observers = &self.inner.shared.observers;
        if !observers.has_observers() {
            return with_circular_guard(key, || {
                registration.factory.create(key, &ResolverContext::new(self))
            });
        }

        observers.resolving(key);
        let start = Instant::now();
        let result = with_circular_guard(key, || {
            registration.factory.create(key, &ResolverContext::new(self))
        });
        match &result {
            Ok(_) => observers.resolved(key, start.elapsed()),
            Err(error) => observers.resolve_failed(key, error),
        }
        result
    }

    pub(crate) fn push_root_disposer(&self, disposer: Disposer) {
        let shared = &self.inner.shared;
        if is_late(&disposer, &shared.root_disposed, &shared.root_async_disposed) {
            run_late(disposer);
            return;
        }
        shared.singleton_disposers.lock().push(disposer);
    }

    fn push_own_disposer(&self, disposer: Disposer) {
        let inner = &self.inner;
        if is_late(&disposer, &inner.disposed, &inner.async_disposed) {
            run_late(disposer);
            return;
        }
        inner.disposers.lock().push(disposer);
    }
}

// Async hooks stay queued until dispose_async has run, even after dispose().
fn is_late(disposer: &Disposer, disposed: &AtomicBool, async_disposed: &AtomicBool) -> bool {
    match disposer {
        Disposer::Sync(_) => disposed.load(Ordering::Acquire),
        Disposer::Async(_) => async_disposed.load(Ordering::Acquire),
    }
}

// Late sync hooks run immediately; late async ones cannot.
fn run_late(disposer: Disposer) {
    match disposer {
        Disposer::Sync(f) => f(),
        Disposer::Async(_) => {
            tracing::warn!("async disposal hook registered on a disposed scope was dropped");
        }
    }
}

fn is_provider_key(key: &Key) -> bool {
    *key == key_of_type::<ServiceProvider>()
}

impl ResolverCore for ServiceProvider {
    fn resolve_single(&self, key: &Key) -> DiResult<Option<AnyArc>> {
        self.ensure_active()?;
        if is_provider_key(key) {
            return Ok(Some(Arc::new(self.create_scope()) as AnyArc));
        }

        match self.inner.chain.resolve_single(key) {
            Some(registration) => {
                tracing::trace!(key = %key, depth = self.depth(), "resolving");
                self.invoke(key, &registration).map(Some)
            }
            None => {
                tracing::trace!(key = %key, "no registration in scope chain");
                Ok(None)
            }
        }
    }

    fn resolve_all(&self, key: &Key) -> DiResult<Vec<AnyArc>> {
        self.ensure_active()?;
        if is_provider_key(key) {
            return Ok(vec![Arc::new(self.create_scope()) as AnyArc]);
        }

        let registrations = self.inner.chain.resolve_all(key);
        tracing::trace!(key = %key, count = registrations.len(), "resolving all");
        registrations
            .iter()
            .map(|registration| self.invoke(key, registration))
            .collect()
    }

    fn push_sync_disposer(&self, f: Box<dyn FnOnce() + Send>) {
        self.push_own_disposer(Disposer::Sync(f));
    }

    fn push_async_disposer(&self, f: Box<dyn FnOnce() -> BoxFutureUnit + Send>) {
        self.push_own_disposer(Disposer::Async(f));
    }
}

impl std::fmt::Debug for ServiceProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceProvider")
            .field("depth", &self.depth())
            .field("registrations", &self.inner.chain.own().read().len())
            .field("scoped_instances", &self.inner.scoped.len())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

impl Drop for ProviderInner {
    fn drop(&mut self) {
        if !self.disposers.get_mut().is_empty() {
            tracing::warn!(
                depth = self.chain.depth(),
                "scope dropped with undisposed resources; call dispose() or dispose_async() first"
            );
        }
    }
}

impl Drop for SharedState {
    fn drop(&mut self) {
        if !self.singleton_disposers.get_mut().is_empty() {
            tracing::warn!("root provider dropped with undisposed singletons; call dispose() or dispose_async() first");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::Resolver;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn provider_is_send_and_sync() {
        assert_send_sync::<ServiceProvider>();
    }

    #[test]
    fn self_injection_yields_a_fresh_child() {
        let root = ServiceCollection::new().build();
        let a = root.get_required::<ServiceProvider>();
        let b = root.get_required::<ServiceProvider>();

        assert!(!a.same_scope(&b));
        assert!(!a.same_scope(&root));
        assert_eq!(a.depth(), 2);

        let all = root.get_services::<ServiceProvider>().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].depth(), 2);
    }

    #[test]
    fn child_of_disposed_root_stops_resolving() {
        let mut services = ServiceCollection::new();
        services.add_singleton(3u8);
        let root = services.build();
        let child = root.create_scope();

        root.dispose();
        assert!(matches!(child.get_service::<u8>(), Err(DiError::ScopeDisposed)));
        assert!(!child.is_disposed());
    }
}
