//! Constructor auto-wiring.
//!
//! A service declares its constructor parameters as a list of
//! [`Parameter`]s. When a [`DerivedServiceFactory`] is built, each parameter
//! is turned into a [`DependencyResolver`] exactly once; resolution then
//! runs those resolvers in order and hands the values to the constructor
//! positionally through [`Arguments`].
//!
//! ```
//! use strata_di::{Arguments, DiResult, Injectable, Lifetime, Parameter, Resolver, ServiceCollection};
//! use std::sync::Arc;
//!
//! struct Logger;
//!
//! struct Repository {
//!     logger: Arc<Logger>,
//!     table: Arc<String>,
//! }
//!
//! impl Injectable for Repository {
//!     fn parameters() -> Vec<Parameter> {
//!         vec![
//!             Parameter::of::<Logger>("logger"),
//!             Parameter::of::<String>("table").default_value("users".to_string()),
//!         ]
//!     }
//!
//!     fn construct(args: &mut Arguments) -> DiResult<Self> {
//!         Ok(Repository {
//!             logger: args.next()?,
//!             table: args.next()?,
//!         })
//!     }
//! }
//!
//! let mut services = ServiceCollection::new();
//! services.add_singleton(Logger);
//! services.add_injectable::<Repository>(Lifetime::Transient).unwrap();
//!
//! let root = services.build();
//! let scope = root.create_scope();
//!
//! let a = root.get_required::<Repository>();
//! let b = scope.get_required::<Repository>();
//! assert!(!Arc::ptr_eq(&a, &b));
//! assert!(Arc::ptr_eq(&a.logger, &b.logger));
//! assert!(Arc::ptr_eq(&a.logger, &root.get_required::<Logger>()));
//! assert_eq!(a.table.as_str(), "users");
//! ```

use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::factory::{downcast_concrete, downcast_trait, AnyArc, ServiceFactory};
use crate::key::{key_of_trait, key_of_type, Key};
use crate::provider::ResolverContext;
use crate::traits::{Resolver, ResolverCore};

/// Declared type information of a constructor parameter.
#[derive(Debug, Clone)]
pub enum Annotation {
    /// The parameter requires this service
    Service(Key),
    /// The parameter accepts one of these services, or absence
    Nullable(Vec<Key>),
}

#[derive(Clone)]
struct DefaultValue {
    value: AnyArc,
    contract: TypeId,
    is_trait: bool,
}

/// One declared constructor parameter.
#[derive(Clone)]
pub struct Parameter {
    name: &'static str,
    annotation: Option<Annotation>,
    default: Option<DefaultValue>,
}

impl Parameter {
    /// A parameter with no type information. Building a factory over it fails.
    pub fn untyped(name: &'static str) -> Self {
        Self { name, annotation: None, default: None }
    }

    /// A parameter of concrete type `T`.
    pub fn of<T: 'static>(name: &'static str) -> Self {
        Self::of_key(name, key_of_type::<T>())
    }

    /// A parameter of trait-object type `T`, e.g. `dyn Logger`.
    pub fn of_trait<T: ?Sized + 'static>(name: &'static str) -> Self {
        Self::of_key(name, key_of_trait::<T>())
    }

    /// A parameter resolved through an explicit key, such as a named one.
    pub fn of_key(name: &'static str, key: Key) -> Self {
        Self {
            name,
            annotation: Some(Annotation::Service(key)),
            default: None,
        }
    }

    /// A parameter of type `T` that may be absent.
    pub fn nullable<T: 'static>(name: &'static str) -> Self {
        Self::union(name, vec![key_of_type::<T>()])
    }

    /// A trait-object parameter that may be absent.
    pub fn nullable_trait<T: ?Sized + 'static>(name: &'static str) -> Self {
        Self::union(name, vec![key_of_trait::<T>()])
    }

    /// A parameter accepting any of `keys`, or absence.
    ///
    /// Only a single alternative can be auto-wired; more than one is a
    /// configuration error when the factory is built.
    pub fn union(name: &'static str, keys: Vec<Key>) -> Self {
        Self {
            name,
            annotation: Some(Annotation::Nullable(keys)),
            default: None,
        }
    }

    /// Declares `value` as the fallback used when the service is absent.
    pub fn default_value<T: Send + Sync + 'static>(mut self, value: T) -> Self {
        self.default = Some(DefaultValue {
            value: Arc::new(value),
            contract: TypeId::of::<T>(),
            is_trait: false,
        });
        self
    }

    /// Declares a trait-object fallback for a trait-object parameter.
    pub fn default_trait<T: ?Sized + Send + Sync + 'static>(mut self, value: Arc<T>) -> Self {
        self.default = Some(DefaultValue {
            value: Arc::new(value),
            contract: TypeId::of::<T>(),
            is_trait: true,
        });
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn annotation(&self) -> Option<&Annotation> {
        self.annotation.as_ref()
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }
}

impl fmt::Debug for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parameter")
            .field("name", &self.name)
            .field("annotation", &self.annotation)
            .field("has_default", &self.default.is_some())
            .finish()
    }
}

/// How one constructor argument is obtained.
#[derive(Clone)]
pub enum DependencyResolver {
    /// Must resolve; absence fails with `NotFound`
    Required { key: Key },
    /// Resolves if registered, otherwise yields the fallback
    Optional { key: Key, fallback: Option<AnyArc> },
}

impl DependencyResolver {
    fn build(service: &'static str, parameter: &Parameter) -> DiResult<Self> {
        let missing = || DiError::MissingAnnotation { service, parameter: parameter.name };

        let (key, nullable) = match &parameter.annotation {
            None => return Err(missing()),
            Some(Annotation::Service(key)) => (key.clone(), false),
            Some(Annotation::Nullable(keys)) => match keys.as_slice() {
                [] => return Err(missing()),
                [key] => (key.clone(), true),
                _ => {
                    return Err(DiError::AmbiguousOptional {
                        service,
                        parameter: parameter.name,
                        alternatives: keys.iter().map(Key::display_name).collect(),
                    })
                }
            },
        };

        if let Some(default) = &parameter.default {
            if default.contract != key.type_id() || default.is_trait != key.is_trait() {
                return Err(DiError::InvalidDefault { service, parameter: parameter.name });
            }
            return Ok(DependencyResolver::Optional {
                key,
                fallback: Some(default.value.clone()),
            });
        }

        if nullable {
            Ok(DependencyResolver::Optional { key, fallback: None })
        } else {
            Ok(DependencyResolver::Required { key })
        }
    }

    pub fn key(&self) -> &Key {
        match self {
            DependencyResolver::Required { key } | DependencyResolver::Optional { key, .. } => key,
        }
    }

    pub fn is_required(&self) -> bool {
        matches!(self, DependencyResolver::Required { .. })
    }

    /// Produces this argument's value from `resolver`.
    pub fn resolve(&self, resolver: &dyn ResolverCore) -> DiResult<Option<AnyArc>> {
        match self {
            DependencyResolver::Required { key } => resolver.resolve_required(key).map(Some),
            DependencyResolver::Optional { key, fallback } => {
                Ok(resolver.resolve_single(key)?.or_else(|| fallback.clone()))
            }
        }
    }
}

impl fmt::Debug for DependencyResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DependencyResolver::Required { key } => {
                f.debug_struct("Required").field("key", key).finish()
            }
            DependencyResolver::Optional { key, fallback } => f
                .debug_struct("Optional")
                .field("key", key)
                .field("has_fallback", &fallback.is_some())
                .finish(),
        }
    }
}

/// Resolved constructor arguments, consumed in declaration order.
pub struct Arguments {
    service: &'static str,
    values: Vec<Option<AnyArc>>,
    position: usize,
}

impl Arguments {
    pub fn new(service: &'static str, values: Vec<Option<AnyArc>>) -> Self {
        Self { service, values, position: 0 }
    }

    fn take(&mut self) -> DiResult<Option<AnyArc>> {
        let index = self.position;
        let slot = self
            .values
            .get_mut(index)
            .ok_or(DiError::ArgumentOutOfRange { service: self.service, index })?;
        self.position += 1;
        Ok(slot.take())
    }

    /// Next argument as a concrete service that must be present.
    pub fn next<T: Send + Sync + 'static>(&mut self) -> DiResult<Arc<T>> {
        self.next_optional::<T>()?
            .ok_or(DiError::NotFound(std::any::type_name::<T>()))
    }

    /// Next argument as a concrete service that may be absent.
    pub fn next_optional<T: Send + Sync + 'static>(&mut self) -> DiResult<Option<Arc<T>>> {
        self.take()?.map(downcast_concrete::<T>).transpose()
    }

    /// Next argument as a trait-object service that must be present.
    pub fn next_trait<T: ?Sized + Send + Sync + 'static>(&mut self) -> DiResult<Arc<T>> {
        self.next_optional_trait::<T>()?
            .ok_or(DiError::NotFound(std::any::type_name::<T>()))
    }

    /// Next argument as a trait-object service that may be absent.
    pub fn next_optional_trait<T: ?Sized + Send + Sync + 'static>(&mut self) -> DiResult<Option<Arc<T>>> {
        self.take()?.map(downcast_trait::<T>).transpose()
    }

    pub fn remaining(&self) -> usize {
        self.values.len().saturating_sub(self.position)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A type that can be constructed by auto-wiring.
///
/// `parameters` declares the constructor's dependencies; `construct`
/// receives their resolved values in the same order.
pub trait Injectable: Sized + Send + Sync + 'static {
    fn parameters() -> Vec<Parameter>;

    fn construct(args: &mut Arguments) -> DiResult<Self>;
}

type Construct = Arc<dyn Fn(&mut Arguments) -> DiResult<AnyArc> + Send + Sync>;

/// Factory that resolves declared parameters and calls a constructor.
///
/// All configuration errors surface from the constructors of this type,
/// never during resolution.
#[derive(Clone)]
pub struct DerivedServiceFactory {
    service: &'static str,
    resolvers: Vec<DependencyResolver>,
    construct: Construct,
}

impl DerivedServiceFactory {
    /// Builds a factory for `service` from its parameter list and constructor.
    ///
    /// ```
    /// use strata_di::{DerivedServiceFactory, DiError, Parameter};
    /// use std::sync::Arc;
    ///
    /// let err = DerivedServiceFactory::new(
    ///     "Mailer",
    ///     vec![Parameter::untyped("transport")],
    ///     |_| Ok(Arc::new(()) as strata_di::AnyArc),
    /// )
    /// .err()
    /// .unwrap();
    ///
    /// assert!(matches!(err, DiError::MissingAnnotation { parameter: "transport", .. }));
    /// assert!(err.is_configuration());
    /// ```
    pub fn new<F>(service: &'static str, parameters: Vec<Parameter>, construct: F) -> DiResult<Self>
    where
        F: Fn(&mut Arguments) -> DiResult<AnyArc> + Send + Sync + 'static,
    {
        let resolvers = parameters
            .iter()
            .map(|parameter| DependencyResolver::build(service, parameter))
            .collect::<DiResult<Vec<_>>>()?;
        Ok(Self {
            service,
            resolvers,
            construct: Arc::new(construct),
        })
    }

    /// Builds a factory producing `T` from its [`Injectable`] declaration.
    pub fn for_type<T: Injectable>() -> DiResult<Self> {
        Self::new(std::any::type_name::<T>(), T::parameters(), |args| {
            Ok(Arc::new(T::construct(args)?) as AnyArc)
        })
    }

    /// Builds a factory producing `T` as the trait object `Trait`.
    pub fn for_trait<T, Trait>(cast: fn(Arc<T>) -> Arc<Trait>) -> DiResult<Self>
    where
        T: Injectable,
        Trait: ?Sized + Send + Sync + 'static,
    {
        Self::new(std::any::type_name::<T>(), T::parameters(), move |args| {
            let service = Arc::new(T::construct(args)?);
            Ok(Arc::new(cast(service)) as AnyArc)
        })
    }

    pub fn service_name(&self) -> &'static str {
        self.service
    }

    /// Per-parameter resolvers, in declaration order.
    pub fn resolvers(&self) -> &[DependencyResolver] {
        &self.resolvers
    }
}

impl ServiceFactory for DerivedServiceFactory {
    fn create(&self, _key: &Key, resolver: &ResolverContext<'_>) -> DiResult<AnyArc> {
        let values = self
            .resolvers
            .iter()
            .map(|dependency| dependency.resolve(resolver))
            .collect::<DiResult<Vec<_>>>()?;
        (self.construct)(&mut Arguments::new(self.service, values))
    }
}

impl fmt::Debug for DerivedServiceFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedServiceFactory")
            .field("service", &self.service)
            .field("resolvers", &self.resolvers)
            .finish()
    }
}
