//! # strata-di
//!
//! A dependency injection container built around a chain of registry
//! layers, one per scope.
//!
//! ## Features
//!
//! - **Layered scopes**: a child scope sees its own registrations first and
//!   falls back to its ancestors'; registering in a child never touches a parent
//! - **Multi-binding**: every registration for a key is kept, in order
//! - **Lifetimes**: singleton, scoped and transient, as composable factory wrappers
//! - **Auto-wiring**: constructors declare their parameters once, validated up front
//! - **Disposal**: LIFO disposal hooks per scope, sync and async
//! - **Circular dependency detection** with the offending path
//!
//! ## Quick Start
//!
//! ```rust
//! use strata_di::{ServiceCollection, Resolver};
//! use std::sync::Arc;
//!
//! struct Database {
//!     connection_string: String,
//! }
//!
//! struct UserService {
//!     db: Arc<Database>,
//! }
//!
//! let mut services = ServiceCollection::new();
//! services.add_singleton(Database {
//!     connection_string: "postgres://localhost".to_string(),
//! });
//! services.add_transient_factory::<UserService, _>(|resolver| UserService {
//!     db: resolver.get_required::<Database>(),
//! });
//!
//! let provider = services.build();
//! let user_service = provider.get_required::<UserService>();
//! assert_eq!(user_service.db.connection_string, "postgres://localhost");
//! ```
//!
//! ## Scopes
//!
//! ```rust
//! use strata_di::{ServiceCollection, Resolver};
//!
//! let mut services = ServiceCollection::new();
//! services.add_singleton("from root".to_string());
//! let root = services.build();
//!
//! root.with_scope(|scope| {
//!     scope.configure(|services| {
//!         services.add_singleton("from scope".to_string());
//!     });
//!     assert_eq!(scope.get_required::<String>().as_str(), "from scope");
//! });
//!
//! assert_eq!(root.get_required::<String>().as_str(), "from root");
//! ```
//!
//! ## Feature flags
//!
//! - `diagnostics`: enables `ServiceProvider::to_debug_string`
//! - `ahash`: uses `ahash` for registry layers and instance caches

pub mod collection;
pub mod derived;
pub mod descriptors;
pub mod error;
pub mod factory;
pub mod key;
pub mod lifetime;
pub mod observer;
pub mod provider;
pub mod traits;

mod internal;
mod registration;

pub use collection::ServiceCollection;
pub use derived::{Annotation, Arguments, DependencyResolver, DerivedServiceFactory, Injectable, Parameter};
pub use descriptors::ServiceDescriptor;
pub use error::{DiError, DiResult};
pub use factory::{factory_fn, AnyArc, FnFactory, ServiceFactory};
pub use key::{key_of_trait, key_of_type, IntoKeys, Key};
pub use lifetime::{scoped, singleton, FactoryId, Lifetime, Scoped, Singleton};
pub use observer::{DiObserver, LoggingObserver};
pub use provider::{ResolverContext, ScopeGuard, ServiceProvider};
pub use traits::{AsyncDispose, BoxFutureUnit, Dispose, Resolver, ResolverCore};
