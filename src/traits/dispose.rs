//! Disposal traits for resource cleanup.

use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by asynchronous disposal hooks.
pub type BoxFutureUnit = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Trait for synchronous resource disposal.
///
/// Implement this for services that need structured teardown (flushing
/// caches, closing connections). Register the instance with
/// `Resolver::register_disposer` or attach the hook to a lifetime wrapper
/// with `Scoped::disposing`; it runs when the owning scope is disposed.
///
/// # Examples
///
/// ```
/// use strata_di::{Dispose, ServiceCollection, Resolver};
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// static CLOSED: AtomicUsize = AtomicUsize::new(0);
///
/// struct Connection;
///
/// impl Dispose for Connection {
///     fn dispose(&self) {
///         CLOSED.fetch_add(1, Ordering::SeqCst);
///     }
/// }
///
/// let mut services = ServiceCollection::new();
/// services.add_scoped_disposable::<Connection, _>(|_| Connection);
///
/// let provider = services.build();
/// let scope = provider.create_scope();
/// scope.get_required::<Connection>();
/// scope.get_required::<Connection>();
///
/// scope.dispose();
/// scope.dispose();
/// assert_eq!(CLOSED.load(Ordering::SeqCst), 1);
/// ```
pub trait Dispose: Send + Sync + 'static {
    /// Perform synchronous cleanup of resources.
    fn dispose(&self);
}

/// Trait for asynchronous resource disposal.
///
/// Async hooks run from `ServiceProvider::dispose_async`, before sync hooks,
/// in LIFO order.
///
/// # Examples
///
/// ```
/// use strata_di::{AsyncDispose, ServiceCollection, Resolver};
/// use async_trait::async_trait;
/// use std::sync::Arc;
///
/// struct DatabaseClient {
///     connection_id: String,
/// }
///
/// #[async_trait]
/// impl AsyncDispose for DatabaseClient {
///     async fn dispose(&self) {
///         println!("Closing database connection: {}", self.connection_id);
///     }
/// }
///
/// let mut services = ServiceCollection::new();
/// services.add_singleton_factory::<DatabaseClient, _>(|resolver| {
///     let client = Arc::new(DatabaseClient { connection_id: "conn_123".to_string() });
///     resolver.register_async_disposer(client);
///     DatabaseClient { connection_id: "conn_123".to_string() }
/// });
/// ```
#[async_trait::async_trait]
pub trait AsyncDispose: Send + Sync + 'static {
    /// Perform asynchronous cleanup of resources.
    async fn dispose(&self);
}
