//! Resolver traits for service resolution.

use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::factory::{downcast_concrete, downcast_trait, AnyArc};
use crate::key::{key_of_trait, key_of_type, Key};
use crate::traits::{AsyncDispose, BoxFutureUnit, Dispose};

/// Core resolver trait for object-safe service resolution.
///
/// Implemented by `ServiceProvider` and by the `ResolverContext` handed to
/// factories. Most code should use the generic methods of [`Resolver`],
/// which every `ResolverCore` gets for free.
pub trait ResolverCore: Send + Sync {
    /// Resolves `key` through the scope chain.
    ///
    /// The innermost layer holding any factory for `key` answers, using the
    /// first factory registered there. Returns `Ok(None)` when no layer holds
    /// the key.
    fn resolve_single(&self, key: &Key) -> DiResult<Option<AnyArc>>;

    /// Resolves every factory registered for `key`, innermost layer first.
    fn resolve_all(&self, key: &Key) -> DiResult<Vec<AnyArc>>;

    /// Registers a synchronous disposal hook with the owning scope.
    fn push_sync_disposer(&self, f: Box<dyn FnOnce() + Send>);

    /// Registers an asynchronous disposal hook with the owning scope.
    fn push_async_disposer(&self, f: Box<dyn FnOnce() -> BoxFutureUnit + Send>);
}

/// High-level resolver interface with generic methods for type-safe service resolution.
///
/// # Examples
///
/// ```
/// use strata_di::{ServiceCollection, Resolver};
/// use std::sync::Arc;
///
/// trait Logger: Send + Sync {
///     fn log(&self, msg: &str) -> String;
/// }
///
/// struct ConsoleLogger;
/// impl Logger for ConsoleLogger {
///     fn log(&self, msg: &str) -> String {
///         format!("LOG: {}", msg)
///     }
/// }
///
/// let mut collection = ServiceCollection::new();
/// collection.add_singleton(42usize);
/// collection.add_singleton_trait(Arc::new(ConsoleLogger) as Arc<dyn Logger>);
///
/// let provider = collection.build();
///
/// let number = provider.get_required_service::<usize>().unwrap();
/// assert_eq!(*number, 42);
///
/// let logger = provider.get_required_trait::<dyn Logger>();
/// assert_eq!(logger.log("ready"), "LOG: ready");
///
/// assert!(provider.get_service::<String>().unwrap().is_none());
/// ```
pub trait Resolver: ResolverCore {
    /// Resolves `key`, failing with [`DiError::NotFound`] when it is absent.
    fn resolve_required(&self, key: &Key) -> DiResult<AnyArc> {
        self.resolve_single(key)?
            .ok_or(DiError::NotFound(key.display_name()))
    }

    /// Resolves a concrete service, `None` when it is not registered.
    fn get_service<T: Send + Sync + 'static>(&self) -> DiResult<Option<Arc<T>>> {
        self.resolve_single(&key_of_type::<T>())?
            .map(downcast_concrete::<T>)
            .transpose()
    }

    /// Resolves a concrete service that must be registered.
    fn get_required_service<T: Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        downcast_concrete(self.resolve_required(&key_of_type::<T>())?)
    }

    /// Resolves every registration of a concrete service, innermost scope first.
    ///
    /// ```
    /// use strata_di::{Resolver, ServiceCollection};
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_singleton("root".to_string());
    /// let provider = services.build();
    ///
    /// let scope = provider.create_scope();
    /// scope.configure(|services| {
    ///     services.add_singleton("scope".to_string());
    /// });
    ///
    /// let all: Vec<String> = scope.get_services::<String>().unwrap()
    ///     .iter().map(|s| s.to_string()).collect();
    /// assert_eq!(all, vec!["scope", "root"]);
    /// ```
    fn get_services<T: Send + Sync + 'static>(&self) -> DiResult<Vec<Arc<T>>> {
        self.resolve_all(&key_of_type::<T>())?
            .into_iter()
            .map(downcast_concrete::<T>)
            .collect()
    }

    /// Resolves a trait-object service, `None` when it is not registered.
    fn get_trait_service<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Option<Arc<T>>> {
        self.resolve_single(&key_of_trait::<T>())?
            .map(downcast_trait::<T>)
            .transpose()
    }

    /// Resolves a trait-object service that must be registered.
    fn get_required_trait_service<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        downcast_trait(self.resolve_required(&key_of_trait::<T>())?)
    }

    /// Resolves every implementation bound to a trait, innermost scope first.
    ///
    /// ```
    /// use strata_di::{Lifetime, Resolver, ServiceCollection};
    /// use std::sync::Arc;
    ///
    /// trait Plugin: Send + Sync {
    ///     fn name(&self) -> &str;
    /// }
    ///
    /// struct PluginA;
    /// impl Plugin for PluginA {
    ///     fn name(&self) -> &str { "Plugin A" }
    /// }
    ///
    /// struct PluginB;
    /// impl Plugin for PluginB {
    ///     fn name(&self) -> &str { "Plugin B" }
    /// }
    ///
    /// let mut collection = ServiceCollection::new();
    /// collection.add_singleton_trait(Arc::new(PluginA) as Arc<dyn Plugin>);
    /// collection.add_trait_factory::<dyn Plugin, _>(Lifetime::Transient, |_| Arc::new(PluginB));
    ///
    /// let provider = collection.build();
    /// let plugins = provider.get_trait_services::<dyn Plugin>().unwrap();
    /// assert_eq!(plugins.len(), 2);
    /// assert_eq!(plugins[0].name(), "Plugin A");
    /// assert_eq!(plugins[1].name(), "Plugin B");
    ///
    /// // Single resolution picks the first registration
    /// assert_eq!(provider.get_required_trait::<dyn Plugin>().name(), "Plugin A");
    /// ```
    fn get_trait_services<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Vec<Arc<T>>> {
        self.resolve_all(&key_of_trait::<T>())?
            .into_iter()
            .map(downcast_trait::<T>)
            .collect()
    }

    /// Resolves a named concrete service, `None` when it is not registered.
    fn get_named_service<T: Send + Sync + 'static>(&self, name: &'static str) -> DiResult<Option<Arc<T>>> {
        self.resolve_single(&key_of_type::<T>().named(name))?
            .map(downcast_concrete::<T>)
            .transpose()
    }

    /// Resolves a named concrete service that must be registered.
    fn get_required_named_service<T: Send + Sync + 'static>(&self, name: &'static str) -> DiResult<Arc<T>> {
        downcast_concrete(self.resolve_required(&key_of_type::<T>().named(name))?)
    }

    /// Resolves a named trait-object service, `None` when it is not registered.
    fn get_named_trait_service<T: ?Sized + Send + Sync + 'static>(
        &self,
        name: &'static str,
    ) -> DiResult<Option<Arc<T>>> {
        self.resolve_single(&key_of_trait::<T>().named(name))?
            .map(downcast_trait::<T>)
            .transpose()
    }

    /// Resolves a concrete service, panicking on failure.
    ///
    /// # Panics
    ///
    /// Panics if the service is not registered or its construction fails.
    fn get_required<T: Send + Sync + 'static>(&self) -> Arc<T> {
        self.get_required_service::<T>()
            .unwrap_or_else(|e| panic!("Failed to resolve {}: {}", std::any::type_name::<T>(), e))
    }

    /// Resolves a trait-object service, panicking on failure.
    ///
    /// # Panics
    ///
    /// Panics if the trait is not registered or its construction fails.
    fn get_required_trait<T: ?Sized + Send + Sync + 'static>(&self) -> Arc<T> {
        self.get_required_trait_service::<T>()
            .unwrap_or_else(|e| panic!("Failed to resolve trait {}: {}", std::any::type_name::<T>(), e))
    }

    /// Registers a service for synchronous disposal.
    ///
    /// Called from a factory, the hook belongs to the scope that owns the
    /// instance being built: the requesting scope for scoped and transient
    /// services, the root for singletons. Hooks run in LIFO order.
    ///
    /// ```
    /// use strata_di::{Dispose, Resolver, ServiceCollection};
    /// use std::sync::Arc;
    /// use std::sync::atomic::{AtomicBool, Ordering};
    ///
    /// struct Cache {
    ///     flushed: Arc<AtomicBool>,
    /// }
    ///
    /// impl Dispose for Cache {
    ///     fn dispose(&self) {
    ///         self.flushed.store(true, Ordering::SeqCst);
    ///     }
    /// }
    ///
    /// let flushed = Arc::new(AtomicBool::new(false));
    /// let provider = ServiceCollection::new().build();
    /// let scope = provider.create_scope();
    /// scope.register_disposer(Arc::new(Cache { flushed: flushed.clone() }));
    ///
    /// scope.dispose();
    /// assert!(flushed.load(Ordering::SeqCst));
    /// ```
    fn register_disposer<T: ?Sized + Dispose>(&self, service: Arc<T>) {
        self.push_sync_disposer(Box::new(move || service.dispose()));
    }

    /// Registers a service for asynchronous disposal.
    ///
    /// Async hooks run from `dispose_async`, before sync hooks, in LIFO order.
    fn register_async_disposer<T: ?Sized + AsyncDispose>(&self, service: Arc<T>) {
        self.push_async_disposer(Box::new(move || {
            Box::pin(async move {
                service.dispose().await;
            }) as BoxFutureUnit
        }));
    }
}

impl<R: ResolverCore + ?Sized> Resolver for R {}
