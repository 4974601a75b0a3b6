//! Scope lifecycle: creation, the scoped-resource guard and disposal.

use std::ops::Deref;
use std::sync::atomic::Ordering;

use super::ServiceProvider;

impl ServiceProvider {
    /// Creates a child scope.
    ///
    /// The child gets a fresh, empty registry layer ahead of this provider's
    /// chain, its own scoped-instance cache and its own disposal hooks. It
    /// shares only the root's singleton cache with its ancestors.
    ///
    /// ```
    /// use strata_di::{ServiceCollection, Resolver};
    /// use std::sync::{Arc, Mutex};
    ///
    /// #[derive(Debug)]
    /// struct RequestId(String);
    ///
    /// let counter = Arc::new(Mutex::new(0));
    /// let counter_clone = counter.clone();
    ///
    /// let mut collection = ServiceCollection::new();
    /// collection.add_scoped_factory::<RequestId, _>(move |_| {
    ///     let mut c = counter_clone.lock().unwrap();
    ///     *c += 1;
    ///     RequestId(format!("req-{}", *c))
    /// });
    ///
    /// let provider = collection.build();
    /// let scope1 = provider.create_scope();
    /// let scope2 = provider.create_scope();
    ///
    /// let req1a = scope1.get_required::<RequestId>();
    /// let req1b = scope1.get_required::<RequestId>();
    /// let req2 = scope2.get_required::<RequestId>();
    ///
    /// assert!(Arc::ptr_eq(&req1a, &req1b));
    /// assert!(!Arc::ptr_eq(&req1a, &req2));
    /// ```
    pub fn create_scope(&self) -> ServiceProvider {
        let child = ServiceProvider::from_parts(
            self.inner.chain.child(),
            self.inner.shared.clone(),
            false,
        );
        tracing::debug!(depth = child.depth(), "scope created");
        child
    }

    /// Runs this scope's synchronous disposal hooks and marks it disposed.
    ///
    /// Sync hooks run in LIFO order. Async hooks cannot run here; they stay
    /// queued until [`dispose_async`](Self::dispose_async) is called. On the
    /// root this also disposes singletons. Child scopes are not affected.
    /// Calling it again does nothing.
    pub fn dispose(&self) {
        if self.inner.disposed.swap(true, Ordering::AcqRel) {
            return;
        }

        let mut sync = self.inner.disposers.lock().take_sync();
        sync.run_all_sync_reverse();
        let mut pending = self.inner.disposers.lock().pending_async();
        self.inner.scoped.clear();

        if self.inner.is_root {
            let shared = &self.inner.shared;
            shared.root_disposed.store(true, Ordering::Release);
            let mut singletons = shared.singleton_disposers.lock().take_sync();
            singletons.run_all_sync_reverse();
            pending += shared.singleton_disposers.lock().pending_async();
            shared.singletons.clear();
        }

        if pending > 0 {
            tracing::debug!(pending, "async disposal hooks left for dispose_async()");
        }
        tracing::debug!(depth = self.depth(), "scope disposed");
    }

    /// Runs this scope's disposal hooks, async hooks first, then sync hooks.
    ///
    /// Each group runs in LIFO order. After a prior [`dispose`](Self::dispose)
    /// only the async hooks it left queued remain to run. On the root this
    /// also disposes singletons, after the root's own scoped instances.
    ///
    /// ```
    /// use strata_di::{AsyncDispose, Resolver, ServiceCollection};
    /// use async_trait::async_trait;
    /// use std::sync::Arc;
    /// use std::sync::atomic::{AtomicBool, Ordering};
    ///
    /// struct Client(Arc<AtomicBool>);
    ///
    /// #[async_trait]
    /// impl AsyncDispose for Client {
    ///     async fn dispose(&self) {
    ///         self.0.store(true, Ordering::SeqCst);
    ///     }
    /// }
    ///
    /// # #[tokio::main]
    /// # async fn main() {
    /// let closed = Arc::new(AtomicBool::new(false));
    /// let provider = ServiceCollection::new().build();
    /// provider.register_async_disposer(Arc::new(Client(closed.clone())));
    ///
    /// provider.dispose_async().await;
    /// assert!(closed.load(Ordering::SeqCst));
    /// # }
    /// ```
    pub async fn dispose_async(&self) {
        if self.inner.async_disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.inner.disposed.store(true, Ordering::Release);

        let mut bag = std::mem::take(&mut *self.inner.disposers.lock());
        bag.run_all_async_reverse().await;
        bag.run_all_sync_reverse();
        self.inner.scoped.clear();

        if self.inner.is_root {
            let shared = &self.inner.shared;
            shared.root_disposed.store(true, Ordering::Release);
            shared.root_async_disposed.store(true, Ordering::Release);
            let mut singletons = std::mem::take(&mut *shared.singleton_disposers.lock());
            singletons.run_all_async_reverse().await;
            singletons.run_all_sync_reverse();
            shared.singletons.clear();
        }

        tracing::debug!(depth = self.depth(), "scope disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::Acquire)
    }

    /// Enters this scope; it is disposed when the guard drops.
    ///
    /// The guard runs [`dispose`](Self::dispose), so async hooks stay queued
    /// for a later [`dispose_async`](Self::dispose_async).
    ///
    /// ```
    /// use strata_di::{Resolver, ServiceCollection};
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_singleton(1u16);
    /// let root = services.build();
    ///
    /// let scope = root.create_scope();
    /// {
    ///     let active = scope.enter();
    ///     assert_eq!(*active.get_required::<u16>(), 1);
    /// }
    /// assert!(scope.is_disposed());
    /// assert!(!root.is_disposed());
    /// ```
    pub fn enter(&self) -> ScopeGuard {
        ScopeGuard {
            provider: self.clone(),
        }
    }

    /// Runs `f` with this scope, then disposes it.
    pub fn using<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&ServiceProvider) -> R,
    {
        let guard = self.enter();
        f(&guard)
    }

    /// Creates a child scope, runs `f` with it, then disposes the child.
    pub fn with_scope<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&ServiceProvider) -> R,
    {
        self.create_scope().using(f)
    }
}

/// Active-scope guard returned by [`ServiceProvider::enter`].
///
/// Dereferences to the provider and disposes it on drop, including when
/// unwinding.
pub struct ScopeGuard {
    provider: ServiceProvider,
}

impl ScopeGuard {
    /// Disposes now rather than at end of scope.
    pub fn exit(self) {}
}

impl Deref for ScopeGuard {
    type Target = ServiceProvider;

    fn deref(&self) -> &ServiceProvider {
        &self.provider
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        self.provider.dispose();
    }
}

#[cfg(test)]
mod tests {
    use crate::{Dispose, Resolver, ServiceCollection};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Counted(Arc<AtomicUsize>);

    impl Dispose for Counted {
        fn dispose(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn guard_disposes_on_unwind() {
        let count = Arc::new(AtomicUsize::new(0));
        let root = ServiceCollection::new().build();
        let scope = root.create_scope();
        scope.register_disposer(Arc::new(Counted(count.clone())));

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            scope.using(|_| panic!("boom"));
        }));

        assert!(result.is_err());
        assert!(scope.is_disposed());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn sync_hooks_registered_after_dispose_run_immediately() {
        let count = Arc::new(AtomicUsize::new(0));
        let scope = ServiceCollection::new().build().create_scope();
        scope.dispose();

        scope.register_disposer(Arc::new(Counted(count.clone())));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
