//! Service collection module for dependency injection.
//!
//! A [`ServiceCollection`] is the registration builder for the root
//! provider (and for extending a live scope via
//! `ServiceProvider::configure`). Every typed helper here is sugar over
//! [`register`](ServiceCollection::register) with an appropriate
//! [`ServiceFactory`].

use std::sync::Arc;

use crate::derived::{DerivedServiceFactory, Injectable};
use crate::descriptors::ServiceDescriptor;
use crate::error::DiResult;
use crate::factory::{factory_fn, AnyArc, InstanceFactory, ServiceFactory};
use crate::key::{key_of_trait, key_of_type, IntoKeys, Key};
use crate::lifetime::{scoped, Lifetime};
use crate::observer::{DiObserver, Observers};
use crate::provider::{ResolverContext, ServiceProvider};
use crate::registration::{Registration, Registry};
use crate::traits::{AsyncDispose, Dispose};

/// Registration builder for a root provider.
///
/// Registrations append: several factories for one key form a multi-binding,
/// and single resolution uses the first one registered.
#[derive(Default)]
pub struct ServiceCollection {
    registry: Registry,
    observers: Observers,
}

impl ServiceCollection {
    /// Creates a new empty service collection.
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            observers: Observers::new(),
        }
    }

    // ----- Raw registration -----

    /// Binds `factory` to one or more keys.
    ///
    /// Binding one factory to several keys (fan-out) shares the factory. A
    /// caching wrapper builds once for all keys of one contract; a concrete
    /// key and a trait key each get their own instance.
    pub fn register<K, F>(&mut self, keys: K, factory: F) -> &mut Self
    where
        K: IntoKeys,
        F: ServiceFactory,
    {
        let factory: Arc<dyn ServiceFactory> = Arc::new(factory);
        for key in keys.into_keys() {
            self.registry.push(key, Registration::new(factory.clone()));
        }
        self
    }

    fn push_typed<T: ?Sized + 'static>(&mut self, key: Key, factory: Arc<dyn ServiceFactory>) -> &mut Self {
        self.registry
            .push(key, Registration::with_impl(factory, std::any::type_name::<T>()));
        self
    }

    // ----- Concrete Type Registrations -----

    /// Registers an existing instance shared by the whole provider tree.
    ///
    /// ```rust
    /// # use strata_di::{ServiceCollection, Resolver};
    /// struct Config {
    ///     database_url: String
    /// }
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_singleton(Config {
    ///     database_url: "postgres://localhost".to_string()
    /// });
    ///
    /// let provider = services.build();
    /// assert_eq!(provider.get_required::<Config>().database_url, "postgres://localhost");
    /// ```
    pub fn add_singleton<T: Send + Sync + 'static>(&mut self, value: T) -> &mut Self {
        let factory = Arc::new(InstanceFactory::new(Arc::new(value)));
        self.push_typed::<T>(key_of_type::<T>(), factory)
    }

    /// Registers a factory whose result is cached in the root provider.
    pub fn add_singleton_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> T + Send + Sync + 'static,
    {
        self.add_factory(Lifetime::Singleton, factory)
    }

    /// Registers a factory whose result is cached once per scope.
    pub fn add_scoped_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> T + Send + Sync + 'static,
    {
        self.add_factory(Lifetime::Scoped, factory)
    }

    /// Registers a factory invoked on every resolution.
    pub fn add_transient_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> T + Send + Sync + 'static,
    {
        self.add_factory(Lifetime::Transient, factory)
    }

    /// Registers an infallible factory with the given lifetime.
    pub fn add_factory<T, F>(&mut self, lifetime: Lifetime, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> T + Send + Sync + 'static,
    {
        self.add_try_factory(lifetime, move |r| Ok(factory(r)))
    }

    /// Registers a fallible factory with the given lifetime.
    ///
    /// Errors propagate to the caller and are never cached.
    ///
    /// ```rust
    /// use strata_di::{DiError, Lifetime, Resolver, ServiceCollection};
    ///
    /// #[derive(Debug)]
    /// struct Pool;
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_try_factory::<Pool, _>(Lifetime::Singleton, |_| {
    ///     Err(DiError::construction("Pool", "database unreachable"))
    /// });
    ///
    /// let provider = services.build();
    /// let err = provider.get_required_service::<Pool>().unwrap_err();
    /// assert_eq!(err.to_string(), "Failed to construct Pool: database unreachable");
    /// ```
    pub fn add_try_factory<T, F>(&mut self, lifetime: Lifetime, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> DiResult<T> + Send + Sync + 'static,
    {
        let inner = factory_fn(move |_, r| Ok(Arc::new(factory(r)?) as AnyArc));
        self.push_typed::<T>(key_of_type::<T>(), lifetime.apply(inner))
    }

    /// Fallible singleton factory.
    pub fn add_singleton_try_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> DiResult<T> + Send + Sync + 'static,
    {
        self.add_try_factory(Lifetime::Singleton, factory)
    }

    /// Fallible scoped factory.
    pub fn add_scoped_try_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> DiResult<T> + Send + Sync + 'static,
    {
        self.add_try_factory(Lifetime::Scoped, factory)
    }

    /// Fallible transient factory.
    pub fn add_transient_try_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> DiResult<T> + Send + Sync + 'static,
    {
        self.add_try_factory(Lifetime::Transient, factory)
    }

    /// Scoped factory whose instances are disposed with their scope.
    pub fn add_scoped_disposable<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Dispose,
        F: Fn(&ResolverContext<'_>) -> T + Send + Sync + 'static,
    {
        let wrapped = scoped(factory_fn(move |_, r| Ok(Arc::new(factory(r)) as AnyArc)))
            .disposing::<T>();
        self.push_typed::<T>(key_of_type::<T>(), Arc::new(wrapped))
    }

    /// Scoped factory whose instances are disposed by the scope's `dispose_async`.
    pub fn add_scoped_async_disposable<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: AsyncDispose,
        F: Fn(&ResolverContext<'_>) -> T + Send + Sync + 'static,
    {
        let wrapped = scoped(factory_fn(move |_, r| Ok(Arc::new(factory(r)) as AnyArc)))
            .disposing_async::<T>();
        self.push_typed::<T>(key_of_type::<T>(), Arc::new(wrapped))
    }

    // ----- Trait Registrations -----

    /// Registers an existing trait-object instance.
    pub fn add_singleton_trait<T>(&mut self, value: Arc<T>) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        // Trait objects are stored as Arc<Arc<dyn Trait>>
        let factory = Arc::new(InstanceFactory::new(Arc::new(value)));
        self.push_typed::<T>(key_of_trait::<T>(), factory)
    }

    /// Registers a trait-object factory with the given lifetime.
    pub fn add_trait_factory<Trait, F>(&mut self, lifetime: Lifetime, factory: F) -> &mut Self
    where
        Trait: ?Sized + Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> Arc<Trait> + Send + Sync + 'static,
    {
        let inner = factory_fn(move |_, r| Ok(Arc::new(factory(r)) as AnyArc));
        self.push_typed::<Trait>(key_of_trait::<Trait>(), lifetime.apply(inner))
    }

    pub fn add_singleton_trait_factory<Trait, F>(&mut self, factory: F) -> &mut Self
    where
        Trait: ?Sized + Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> Arc<Trait> + Send + Sync + 'static,
    {
        self.add_trait_factory(Lifetime::Singleton, factory)
    }

    pub fn add_scoped_trait_factory<Trait, F>(&mut self, factory: F) -> &mut Self
    where
        Trait: ?Sized + Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> Arc<Trait> + Send + Sync + 'static,
    {
        self.add_trait_factory(Lifetime::Scoped, factory)
    }

    pub fn add_transient_trait_factory<Trait, F>(&mut self, factory: F) -> &mut Self
    where
        Trait: ?Sized + Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> Arc<Trait> + Send + Sync + 'static,
    {
        self.add_trait_factory(Lifetime::Transient, factory)
    }

    // ----- Auto-wired Registrations -----

    /// Registers `T` built by auto-wiring its declared parameters.
    ///
    /// Fails immediately with a configuration error if a parameter cannot
    /// be auto-wired.
    pub fn add_injectable<T: Injectable>(&mut self, lifetime: Lifetime) -> DiResult<&mut Self> {
        let factory = DerivedServiceFactory::for_type::<T>()?;
        Ok(self.push_typed::<T>(key_of_type::<T>(), lifetime.apply(factory)))
    }

    /// Registers auto-wired `T` under the trait key `Trait`.
    ///
    /// ```rust
    /// use strata_di::{Arguments, DiResult, Injectable, Lifetime, Parameter, Resolver, ServiceCollection};
    /// use std::sync::Arc;
    ///
    /// trait Clock: Send + Sync {
    ///     fn now(&self) -> u64;
    /// }
    ///
    /// struct FixedClock(Arc<u64>);
    ///
    /// impl Clock for FixedClock {
    ///     fn now(&self) -> u64 { *self.0 }
    /// }
    ///
    /// impl Injectable for FixedClock {
    ///     fn parameters() -> Vec<Parameter> {
    ///         vec![Parameter::of::<u64>("epoch")]
    ///     }
    ///
    ///     fn construct(args: &mut Arguments) -> DiResult<Self> {
    ///         Ok(FixedClock(args.next()?))
    ///     }
    /// }
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_singleton(1_700_000_000u64);
    /// services
    ///     .add_injectable_as::<FixedClock, dyn Clock>(Lifetime::Singleton, |c| c)
    ///     .unwrap();
    ///
    /// let provider = services.build();
    /// assert_eq!(provider.get_required_trait::<dyn Clock>().now(), 1_700_000_000);
    /// ```
    pub fn add_injectable_as<T, Trait>(
        &mut self,
        lifetime: Lifetime,
        cast: fn(Arc<T>) -> Arc<Trait>,
    ) -> DiResult<&mut Self>
    where
        T: Injectable,
        Trait: ?Sized + Send + Sync + 'static,
    {
        let factory = DerivedServiceFactory::for_trait::<T, Trait>(cast)?;
        Ok(self.push_typed::<T>(key_of_trait::<Trait>(), lifetime.apply(factory)))
    }

    // ----- Named Registrations -----

    /// Registers an instance under a name.
    ///
    /// ```rust
    /// use strata_di::{Resolver, ServiceCollection};
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_named_singleton("primary", 5432u16);
    /// services.add_named_singleton("replica", 5433u16);
    ///
    /// let provider = services.build();
    /// assert_eq!(*provider.get_required_named_service::<u16>("replica").unwrap(), 5433);
    /// assert!(provider.get_service::<u16>().unwrap().is_none());
    /// ```
    pub fn add_named_singleton<T: Send + Sync + 'static>(&mut self, name: &'static str, value: T) -> &mut Self {
        let factory = Arc::new(InstanceFactory::new(Arc::new(value)));
        self.push_typed::<T>(key_of_type::<T>().named(name), factory)
    }

    /// Registers a named factory with the given lifetime.
    pub fn add_named_factory<T, F>(&mut self, name: &'static str, lifetime: Lifetime, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> T + Send + Sync + 'static,
    {
        let inner = factory_fn(move |_, r| Ok(Arc::new(factory(r)) as AnyArc));
        self.push_typed::<T>(key_of_type::<T>().named(name), lifetime.apply(inner))
    }

    /// Registers a named trait-object instance.
    pub fn add_named_singleton_trait<T>(&mut self, name: &'static str, value: Arc<T>) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let factory = Arc::new(InstanceFactory::new(Arc::new(value)));
        self.push_typed::<T>(key_of_trait::<T>().named(name), factory)
    }

    // ----- Diagnostics -----

    /// Adds an observer notified of every factory invocation in the provider tree.
    pub fn add_observer(&mut self, observer: Arc<dyn DiObserver>) -> &mut Self {
        self.observers.add(observer);
        self
    }

    /// Lists the registrations made so far, in registration order per key.
    pub fn get_service_descriptors(&self) -> Vec<ServiceDescriptor> {
        self.registry
            .iter()
            .map(|(key, reg)| ServiceDescriptor::from_registration(key, reg, 0))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    pub(crate) fn into_parts(self) -> (Registry, Observers) {
        (self.registry, self.observers)
    }

    /// Builds the root provider.
    pub fn build(self) -> ServiceProvider {
        tracing::debug!(registrations = self.registry.len(), "building root provider");
        ServiceProvider::new_root(self.registry, self.observers)
    }
}
