//! Resolver context handed to factories.

use crate::error::DiResult;
use crate::factory::AnyArc;
use crate::internal::{Disposer, LifetimeCache};
use crate::key::Key;
use crate::traits::{BoxFutureUnit, ResolverCore};

use super::ServiceProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DisposalOwner {
    /// Hooks go to the requesting scope
    Scope,
    /// Hooks go to the root provider (singleton construction)
    Root,
}

/// Context passed to factories for resolving their dependencies.
///
/// Resolution always goes through the scope that made the request, so a
/// factory sees that scope's registrations and scoped instances. Disposal
/// hooks registered through the context go to the scope that owns the
/// instance under construction.
///
/// # Examples
///
/// ```
/// use strata_di::{ServiceCollection, Resolver};
/// use std::sync::Arc;
///
/// struct Database { url: String }
/// struct UserService { db: Arc<Database> }
///
/// let mut services = ServiceCollection::new();
/// services.add_singleton(Database { url: "postgres://localhost".to_string() });
/// services.add_transient_factory::<UserService, _>(|resolver| UserService {
///     db: resolver.get_required::<Database>(),
/// });
///
/// let provider = services.build();
/// assert_eq!(provider.get_required::<UserService>().db.url, "postgres://localhost");
/// ```
pub struct ResolverContext<'a> {
    provider: &'a ServiceProvider,
    owner: DisposalOwner,
}

impl<'a> ResolverContext<'a> {
    pub(crate) fn new(provider: &'a ServiceProvider) -> Self {
        Self {
            provider,
            owner: DisposalOwner::Scope,
        }
    }

    /// Same requesting scope, with disposal hooks routed to the root.
    pub(crate) fn for_singleton(&self) -> ResolverContext<'a> {
        Self {
            provider: self.provider,
            owner: DisposalOwner::Root,
        }
    }

    /// The scope that made the request.
    pub fn provider(&self) -> &'a ServiceProvider {
        self.provider
    }

    pub(crate) fn singleton_cache(&self) -> &'a LifetimeCache {
        &self.provider.inner.shared.singletons
    }

    pub(crate) fn scoped_cache(&self) -> &'a LifetimeCache {
        &self.provider.inner.scoped
    }
}

impl ResolverCore for ResolverContext<'_> {
    fn resolve_single(&self, key: &Key) -> DiResult<Option<AnyArc>> {
        self.provider.resolve_single(key)
    }

    fn resolve_all(&self, key: &Key) -> DiResult<Vec<AnyArc>> {
        self.provider.resolve_all(key)
    }

    fn push_sync_disposer(&self, f: Box<dyn FnOnce() + Send>) {
        match self.owner {
            DisposalOwner::Scope => self.provider.push_sync_disposer(f),
            DisposalOwner::Root => self.provider.push_root_disposer(Disposer::Sync(f)),
        }
    }

    fn push_async_disposer(&self, f: Box<dyn FnOnce() -> BoxFutureUnit + Send>) {
        match self.owner {
            DisposalOwner::Scope => self.provider.push_async_disposer(f),
            DisposalOwner::Root => self.provider.push_root_disposer(Disposer::Async(f)),
        }
    }
}
