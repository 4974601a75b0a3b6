/// Unit tests for ServiceDescriptor methods

use strata_di::{key_of_type, Key, Lifetime, ServiceCollection, ServiceDescriptor};
use std::any::TypeId;
use std::sync::Arc;

#[test]
fn test_service_descriptor_service_name_unnamed() {
    let descriptor = ServiceDescriptor {
        key: Key::Type(TypeId::of::<String>(), "alloc::string::String"),
        lifetime: Lifetime::Singleton,
        impl_type_name: None,
        depth: 0,
    };

    assert_eq!(descriptor.service_name(), None);
    assert!(!descriptor.is_named());
    assert_eq!(descriptor.type_name(), "alloc::string::String");
    assert!(!descriptor.is_inherited());
}

#[test]
fn test_service_descriptor_service_name_named() {
    let descriptor = ServiceDescriptor {
        key: Key::TypeNamed(TypeId::of::<u32>(), "u32", "database_port"),
        lifetime: Lifetime::Transient,
        impl_type_name: Some("u32"),
        depth: 2,
    };

    assert_eq!(descriptor.service_name(), Some("database_port"));
    assert!(descriptor.is_named());
    assert_eq!(descriptor.type_name(), "u32");
    assert!(descriptor.is_inherited());
}

#[test]
fn test_provider_descriptors_walk_the_chain() {
    trait Logger: Send + Sync {}
    struct Console;
    impl Logger for Console {}

    let mut services = ServiceCollection::new();
    services.add_singleton(1u8);
    services.add_singleton_trait(Arc::new(Console) as Arc<dyn Logger>);
    let root = services.build();

    let scope = root.create_scope();
    scope.configure(|services| {
        services.add_scoped_factory::<u16, _>(|_| 2);
    });

    let descriptors = scope.descriptors();
    assert_eq!(descriptors.len(), 3);

    assert_eq!(descriptors[0].key, key_of_type::<u16>());
    assert_eq!(descriptors[0].lifetime, Lifetime::Scoped);
    assert_eq!(descriptors[0].depth, 0);

    assert!(descriptors[1..].iter().all(|d| d.is_inherited()));
    assert_eq!(descriptors[1].impl_type_name, Some("u8"));
    assert!(descriptors[2].key.is_trait());

    assert_eq!(root.descriptors().len(), 2);
}

#[test]
fn test_collection_descriptors_keep_registration_order() {
    let mut services = ServiceCollection::new();
    services.add_transient_factory::<u8, _>(|_| 1);
    services.add_singleton(2u8);
    services.add_named_singleton("port", 3u16);

    let descriptors = services.get_service_descriptors();
    let lifetimes: Vec<_> = descriptors.iter().map(|d| d.lifetime).collect();
    assert_eq!(lifetimes, vec![Lifetime::Transient, Lifetime::Singleton, Lifetime::Singleton]);
    assert_eq!(descriptors[2].service_name(), Some("port"));
}
