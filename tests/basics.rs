use strata_di::{
    factory_fn, key_of_type, scoped, singleton, AnyArc, DiError, Lifetime, Resolver,
    ServiceCollection,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[test]
fn test_concrete_singleton() {
    let mut sc = ServiceCollection::new();
    sc.add_singleton(42usize);
    sc.add_singleton("hello".to_string());

    let sp = sc.build();

    let num1 = sp.get_required::<usize>();
    let num2 = sp.get_required::<usize>();
    let str1 = sp.get_required::<String>();
    let str2 = sp.get_required::<String>();

    assert_eq!(*num1, 42);
    assert_eq!(*str1, "hello");
    assert!(Arc::ptr_eq(&num1, &num2));
    assert!(Arc::ptr_eq(&str1, &str2));
}

#[test]
fn test_factory_with_dependencies() {
    #[derive(Debug)]
    struct Config {
        port: u16,
    }

    #[derive(Debug)]
    struct Server {
        config: Arc<Config>,
        name: String,
    }

    let mut sc = ServiceCollection::new();
    sc.add_singleton(Config { port: 8080 });
    sc.add_singleton_factory::<Server, _>(|r| Server {
        config: r.get_required::<Config>(),
        name: "MyServer".to_string(),
    });

    let sp = sc.build();
    let server = sp.get_required::<Server>();

    assert_eq!(server.config.port, 8080);
    assert_eq!(server.name, "MyServer");
}

#[test]
fn test_transient_creates_new_instances() {
    let counter = Arc::new(Mutex::new(0));
    let counter_clone = counter.clone();

    let mut sc = ServiceCollection::new();
    sc.add_transient_factory::<String, _>(move |_| {
        let mut c = counter_clone.lock().unwrap();
        *c += 1;
        format!("instance-{}", *c)
    });

    let sp = sc.build();

    let a = sp.get_required::<String>();
    let b = sp.get_required::<String>();
    let c = sp.get_required::<String>();

    assert_eq!(*a, "instance-1");
    assert_eq!(*b, "instance-2");
    assert_eq!(*c, "instance-3");
    assert!(!Arc::ptr_eq(&a, &b));
    assert!(!Arc::ptr_eq(&b, &c));
}

#[test]
fn test_missing_service_optional_vs_required() {
    struct UnregisteredType;

    let sp = ServiceCollection::new().build();

    assert!(sp.get_service::<UnregisteredType>().unwrap().is_none());
    assert!(sp.get_services::<UnregisteredType>().unwrap().is_empty());
    match sp.get_required_service::<UnregisteredType>() {
        Err(DiError::NotFound(name)) => assert!(name.ends_with("UnregisteredType")),
        other => panic!("expected NotFound, got {:?}", other.map(|_| ())),
    }
}

#[test]
#[should_panic(expected = "Failed to resolve")]
fn test_get_required_panics_when_missing() {
    let sp = ServiceCollection::new().build();
    sp.get_required::<u64>();
}

#[test]
fn test_first_registration_answers_single_resolution() {
    let mut sc = ServiceCollection::new();
    sc.add_singleton(1usize);
    sc.add_singleton(2usize);

    let sp = sc.build();
    assert_eq!(*sp.get_required::<usize>(), 1);

    let all: Vec<usize> = sp.get_services::<usize>().unwrap().iter().map(|v| **v).collect();
    assert_eq!(all, vec![1, 2]);
}

#[test]
fn test_complex_dependency_graph() {
    struct A {
        value: i32,
    }

    struct B {
        a: Arc<A>,
    }

    struct C {
        a: Arc<A>,
        b: Arc<B>,
    }

    let mut sc = ServiceCollection::new();
    sc.add_singleton(A { value: 100 });
    sc.add_singleton_factory::<B, _>(|r| B {
        a: r.get_required::<A>(),
    });
    sc.add_singleton_factory::<C, _>(|r| C {
        a: r.get_required::<A>(),
        b: r.get_required::<B>(),
    });

    let sp = sc.build();
    let c = sp.get_required::<C>();

    assert_eq!(c.a.value, 100);
    assert_eq!(c.b.a.value, 100);
    assert!(Arc::ptr_eq(&c.a, &c.b.a));
}

#[test]
fn test_raw_wrappers_match_helper_lifetimes() {
    let built = Arc::new(AtomicUsize::new(0));
    let sp = ServiceCollection::new().build();

    let counter = built.clone();
    sp.register(
        key_of_type::<u32>(),
        scoped(factory_fn(move |_, _| {
            Ok(Arc::new(counter.fetch_add(1, Ordering::SeqCst) as u32) as AnyArc)
        })),
    );

    let scope_a = sp.create_scope();
    let scope_b = sp.create_scope();
    let a1 = scope_a.get_required::<u32>();
    let a2 = scope_a.get_required::<u32>();
    let b1 = scope_b.get_required::<u32>();

    assert!(Arc::ptr_eq(&a1, &a2));
    assert!(!Arc::ptr_eq(&a1, &b1));
    assert_eq!(built.load(Ordering::SeqCst), 2);

    let descriptor = sp.descriptors().into_iter().next().unwrap();
    assert_eq!(descriptor.lifetime, Lifetime::Scoped);
}

#[test]
fn test_failed_singleton_is_retried() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = attempts.clone();

    let mut sc = ServiceCollection::new();
    sc.register(
        key_of_type::<String>(),
        singleton(factory_fn(move |_, _| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(DiError::construction("String", "first attempt fails"))
            } else {
                Ok(Arc::new("ready".to_string()) as AnyArc)
            }
        })),
    );
    let sp = sc.build();

    let err = sp.get_required_service::<String>().unwrap_err();
    assert!(matches!(err, DiError::Construction { service: "String", .. }));

    let first = sp.get_required::<String>();
    let second = sp.get_required::<String>();
    assert_eq!(first.as_str(), "ready");
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[test]
fn test_nested_not_found_propagates_unchanged() {
    struct Missing;
    struct Needs;

    let mut sc = ServiceCollection::new();
    sc.add_transient_try_factory::<Needs, _>(|r| {
        r.get_required_service::<Missing>()?;
        Ok(Needs)
    });

    let sp = sc.build();
    match sp.get_required_service::<Needs>() {
        Err(DiError::NotFound(name)) => assert!(name.ends_with("Missing")),
        other => panic!("expected nested NotFound, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_wrong_storage_is_a_type_mismatch() {
    let sp = ServiceCollection::new().build();
    sp.register(
        key_of_type::<u64>(),
        factory_fn(|_, _| Ok(Arc::new("not a number") as AnyArc)),
    );

    assert!(matches!(sp.get_service::<u64>(), Err(DiError::TypeMismatch("u64"))));
}
