/// Memory release integration tests
///
/// Cached instances must be released once the scope that owns them is
/// disposed or dropped, and parent scopes must not be kept alive by the
/// instances they handed out.

use strata_di::{Resolver, ServiceCollection, ServiceProvider};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Weak};

#[derive(Debug)]
struct TestService {
    dropped: Arc<AtomicU32>,
}

impl Drop for TestService {
    fn drop(&mut self) {
        self.dropped.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_scoped_instances_released_on_dispose() {
    let dropped = Arc::new(AtomicU32::new(0));
    let counter = dropped.clone();

    let mut services = ServiceCollection::new();
    services.add_scoped_factory::<TestService, _>(move |_| TestService {
        dropped: counter.clone(),
    });
    let provider = services.build();

    let scope = provider.create_scope();
    let weak: Weak<TestService> = Arc::downgrade(&scope.get_required::<TestService>());
    assert!(weak.upgrade().is_some());

    scope.dispose();
    assert!(weak.upgrade().is_none());
    assert_eq!(dropped.load(Ordering::SeqCst), 1);
}

#[test]
fn test_scoped_instances_released_on_drop() {
    let dropped = Arc::new(AtomicU32::new(0));
    let counter = dropped.clone();

    let mut services = ServiceCollection::new();
    services.add_scoped_factory::<TestService, _>(move |_| TestService {
        dropped: counter.clone(),
    });
    let provider = services.build();

    let scopes: Vec<ServiceProvider> = (0..3)
        .map(|_| {
            let scope = provider.create_scope();
            scope.get_required::<TestService>();
            scope
        })
        .collect();
    assert_eq!(dropped.load(Ordering::SeqCst), 0);

    drop(scopes);
    assert_eq!(dropped.load(Ordering::SeqCst), 3);
}

#[test]
fn test_singletons_live_until_root_disposal() {
    let dropped = Arc::new(AtomicU32::new(0));
    let counter = dropped.clone();

    let mut services = ServiceCollection::new();
    services.add_singleton_factory::<TestService, _>(move |_| TestService {
        dropped: counter.clone(),
    });
    let root = services.build();

    root.with_scope(|scope| {
        scope.get_required::<TestService>();
    });
    assert_eq!(dropped.load(Ordering::SeqCst), 0);

    root.dispose();
    assert_eq!(dropped.load(Ordering::SeqCst), 1);
}

#[test]
fn test_transient_instances_are_not_retained() {
    let dropped = Arc::new(AtomicU32::new(0));
    let counter = dropped.clone();

    let mut services = ServiceCollection::new();
    services.add_transient_factory::<TestService, _>(move |_| TestService {
        dropped: counter.clone(),
    });
    let provider = services.build();

    for _ in 0..10 {
        provider.get_required::<TestService>();
    }
    assert_eq!(dropped.load(Ordering::SeqCst), 10);
}

#[test]
fn test_dropping_child_releases_its_layer() {
    let marker = Arc::new(());
    let root = ServiceCollection::new().build();

    let child = root.create_scope();
    let held = marker.clone();
    child.configure(move |services| {
        services.add_singleton(held);
    });
    assert_eq!(Arc::strong_count(&marker), 2);

    drop(child);
    assert_eq!(Arc::strong_count(&marker), 1);
    assert!(!root.is_disposed());
}
