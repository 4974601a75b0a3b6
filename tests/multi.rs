use strata_di::{
    factory_fn, key_of_trait, key_of_type, scoped, singleton, AnyArc, Lifetime, Resolver,
    ServiceCollection,
};
use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
use std::sync::Arc;

trait Plugin: Send + Sync {
    fn name(&self) -> &str;
}

struct Named(&'static str);

impl Plugin for Named {
    fn name(&self) -> &str {
        self.0
    }
}

fn plugin(name: &'static str) -> Arc<dyn Plugin> {
    Arc::new(Named(name))
}

fn names(plugins: &[Arc<dyn Plugin>]) -> Vec<String> {
    plugins.iter().map(|p| p.name().to_string()).collect()
}

#[test]
fn test_multi_binding_basics() {
    let mut sc = ServiceCollection::new();
    sc.add_singleton_trait(plugin("PluginA"));
    sc.add_singleton_trait(plugin("PluginB"));
    sc.add_singleton_trait(plugin("PluginC"));

    let sp = sc.build();
    let plugins = sp.get_trait_services::<dyn Plugin>().unwrap();
    assert_eq!(names(&plugins), vec!["PluginA", "PluginB", "PluginC"]);

    let again = sp.get_trait_services::<dyn Plugin>().unwrap();
    assert!(Arc::ptr_eq(&plugins[0], &again[0]));
    assert!(Arc::ptr_eq(&plugins[2], &again[2]));

    // First registration wins for single resolution
    assert_eq!(sp.get_required_trait::<dyn Plugin>().name(), "PluginA");
}

#[test]
fn test_multi_binding_mixed_lifetimes() {
    trait Handler: Send + Sync {
        fn id(&self) -> i32;
    }

    struct Fixed;
    impl Handler for Fixed {
        fn id(&self) -> i32 {
            1
        }
    }

    struct Counting(i32);
    impl Handler for Counting {
        fn id(&self) -> i32 {
            self.0
        }
    }

    let counter = Arc::new(AtomicI32::new(100));
    let counter_clone = counter.clone();

    let mut sc = ServiceCollection::new();
    sc.add_singleton_trait(Arc::new(Fixed) as Arc<dyn Handler>);
    sc.add_transient_trait_factory::<dyn Handler, _>(move |_| {
        Arc::new(Counting(counter_clone.fetch_add(1, Ordering::SeqCst)))
    });

    let sp = sc.build();
    let first: Vec<i32> = sp.get_trait_services::<dyn Handler>().unwrap().iter().map(|h| h.id()).collect();
    let second: Vec<i32> = sp.get_trait_services::<dyn Handler>().unwrap().iter().map(|h| h.id()).collect();

    assert_eq!(first, vec![1, 100]);
    assert_eq!(second, vec![1, 101]);
}

#[test]
fn test_resolve_all_spans_layers_innermost_first() {
    let mut sc = ServiceCollection::new();
    sc.add_singleton_trait(plugin("root-1"));
    sc.add_singleton_trait(plugin("root-2"));
    let root = sc.build();

    let child = root.create_scope();
    child.configure(|services| {
        services.add_singleton_trait(plugin("child-1"));
        services.add_singleton_trait(plugin("child-2"));
    });
    let grandchild = child.create_scope();
    grandchild.configure(|services| {
        services.add_singleton_trait(plugin("grandchild"));
    });

    assert_eq!(
        names(&grandchild.get_trait_services::<dyn Plugin>().unwrap()),
        vec!["grandchild", "child-1", "child-2", "root-1", "root-2"]
    );
    assert_eq!(
        names(&child.get_trait_services::<dyn Plugin>().unwrap()),
        vec!["child-1", "child-2", "root-1", "root-2"]
    );
    assert_eq!(grandchild.get_required_trait::<dyn Plugin>().name(), "grandchild");
    assert_eq!(root.get_required_trait::<dyn Plugin>().name(), "root-1");
}

#[test]
fn test_empty_multi_binding() {
    let sp = ServiceCollection::new().build();
    assert!(sp.get_trait_services::<dyn Plugin>().unwrap().is_empty());
    assert!(sp.get_trait_service::<dyn Plugin>().unwrap().is_none());
}

#[test]
fn test_fan_out_registration_serves_every_key() {
    struct Impl;
    impl Plugin for Impl {
        fn name(&self) -> &str {
            "impl"
        }
    }

    let mut sc = ServiceCollection::new();
    sc.register(
        vec![key_of_trait::<dyn Plugin>(), key_of_type::<Impl>()],
        Lifetime::Singleton.apply(factory_fn(|key, _| {
            if key.is_trait() {
                Ok(Arc::new(Arc::new(Impl) as Arc<dyn Plugin>) as AnyArc)
            } else {
                Ok(Arc::new(Impl) as AnyArc)
            }
        })),
    );

    let sp = sc.build();
    assert_eq!(sp.get_required_trait::<dyn Plugin>().name(), "impl");
    assert!(sp.get_service::<Impl>().unwrap().is_some());
    assert_eq!(sp.descriptors().len(), 2);
}

#[test]
fn test_named_bindings_are_separate_keys() {
    let mut sc = ServiceCollection::new();
    sc.add_named_singleton_trait("primary", plugin("db-primary"));
    sc.add_named_singleton_trait("replica", plugin("db-replica"));
    sc.add_named_factory::<String, _>("greeting", Lifetime::Transient, |_| "hi".to_string());

    let sp = sc.build();
    let primary = sp.get_named_trait_service::<dyn Plugin>("primary").unwrap().unwrap();
    let replica = sp.get_named_trait_service::<dyn Plugin>("replica").unwrap().unwrap();
    assert_eq!(primary.name(), "db-primary");
    assert_eq!(replica.name(), "db-replica");

    assert!(sp.get_trait_service::<dyn Plugin>().unwrap().is_none());
    assert!(sp.get_named_service::<String>("missing").unwrap().is_none());
    assert_eq!(sp.get_required_named_service::<String>("greeting").unwrap().as_str(), "hi");
}

#[test]
fn test_fan_out_aliases_share_one_instance() {
    let builds = Arc::new(AtomicUsize::new(0));
    let counter = builds.clone();

    let sp = ServiceCollection::new().build();
    sp.register(
        [key_of_type::<u8>().named("read"), key_of_type::<u8>().named("write")],
        scoped(factory_fn(move |_, _| {
            Ok(Arc::new(counter.fetch_add(1, Ordering::SeqCst) as u8) as AnyArc)
        })),
    );

    let scope = sp.create_scope();
    let read = scope.get_required_named_service::<u8>("read").unwrap();
    let write = scope.get_required_named_service::<u8>("write").unwrap();
    assert!(Arc::ptr_eq(&read, &write));
    assert_eq!(builds.load(Ordering::SeqCst), 1);

    // Another scope gets its own shared instance
    let other = sp.create_scope().get_required_named_service::<u8>("write").unwrap();
    assert!(!Arc::ptr_eq(&read, &other));
    assert_eq!(builds.load(Ordering::SeqCst), 2);
}

#[test]
fn test_fan_out_to_trait_and_concrete_builds_each_shape() {
    struct Impl;
    impl Plugin for Impl {
        fn name(&self) -> &str {
            "impl"
        }
    }

    let builds = Arc::new(AtomicUsize::new(0));
    let counter = builds.clone();

    let mut sc = ServiceCollection::new();
    sc.register(
        [key_of_trait::<dyn Plugin>(), key_of_type::<Impl>()],
        singleton(factory_fn(move |key, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            if key.is_trait() {
                Ok(Arc::new(Arc::new(Impl) as Arc<dyn Plugin>) as AnyArc)
            } else {
                Ok(Arc::new(Impl) as AnyArc)
            }
        })),
    );
    let sp = sc.build();

    sp.get_required_trait::<dyn Plugin>();
    sp.get_required::<Impl>();
    sp.get_required_trait::<dyn Plugin>();
    assert_eq!(builds.load(Ordering::SeqCst), 2);
}
