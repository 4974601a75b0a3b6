/// Property-based tests for service resolution
///
/// These tests check the layering rules over arbitrary scope chains: the
/// nearest layer holding a key answers single resolution, and resolving all
/// yields every registration innermost layer first.

use strata_di::{Resolver, ServiceCollection, ServiceProvider};
use proptest::prelude::*;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
struct Tagged(String);

/// Builds a chain where layer `i` registers `layers[i]` values, root first.
fn build_chain(layers: &[Vec<u8>]) -> Vec<ServiceProvider> {
    let mut services = ServiceCollection::new();
    for v in &layers[0] {
        services.add_singleton(Tagged(format!("0:{}", v)));
    }
    let mut chain = vec![services.build()];

    for (depth, values) in layers.iter().enumerate().skip(1) {
        let scope = chain[depth - 1].create_scope();
        let values = values.clone();
        scope.configure(move |services| {
            for v in values {
                services.add_singleton(Tagged(format!("{}:{}", depth, v)));
            }
        });
        chain.push(scope);
    }
    chain
}

fn expected_all(layers: &[Vec<u8>]) -> Vec<Tagged> {
    layers
        .iter()
        .enumerate()
        .rev()
        .flat_map(|(depth, values)| values.iter().map(move |v| Tagged(format!("{}:{}", depth, v))))
        .collect()
}

proptest! {
    #[test]
    fn nearest_layer_answers_single_resolution(
        layers in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..4), 1..6)
    ) {
        let chain = build_chain(&layers);
        let innermost = chain.last().unwrap();

        let expected = expected_all(&layers).into_iter().next();
        let actual = innermost.get_service::<Tagged>().unwrap().map(|t| (*t).clone());
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn resolve_all_is_innermost_first_in_registration_order(
        layers in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..4), 1..6)
    ) {
        let chain = build_chain(&layers);
        let innermost = chain.last().unwrap();

        let actual: Vec<Tagged> = innermost
            .get_services::<Tagged>()
            .unwrap()
            .iter()
            .map(|t| (**t).clone())
            .collect();
        prop_assert_eq!(actual, expected_all(&layers));
    }

    #[test]
    fn ancestors_never_see_descendant_registrations(
        layers in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..4), 1..6)
    ) {
        let chain = build_chain(&layers);
        for (depth, scope) in chain.iter().enumerate() {
            prop_assert_eq!(scope.depth(), depth + 1);
            let visible = scope.get_services::<Tagged>().unwrap().len();
            prop_assert_eq!(visible, expected_all(&layers[..=depth]).len());
        }
    }

    #[test]
    fn singleton_resolution_consistency(value in "\\PC{0,50}", depth in 0usize..5) {
        let mut services = ServiceCollection::new();
        services.add_singleton_factory::<Tagged, _>({
            let value = value.clone();
            move |_| Tagged(value.clone())
        });
        let root = services.build();

        let mut scope = root.clone();
        for _ in 0..depth {
            scope = scope.create_scope();
        }

        let from_scope = scope.get_required::<Tagged>();
        let from_root = root.get_required::<Tagged>();
        prop_assert!(Arc::ptr_eq(&from_scope, &from_root));
        prop_assert_eq!(&from_root.0, &value);
    }

    #[test]
    fn optional_resolution_behavior(register_service in any::<bool>()) {
        let mut services = ServiceCollection::new();
        if register_service {
            services.add_singleton(Tagged("present".to_string()));
        }
        let provider = services.build();

        let optional = provider.get_service::<Tagged>().unwrap();
        let required = provider.get_required_service::<Tagged>();
        prop_assert_eq!(optional.is_some(), register_service);
        prop_assert_eq!(required.is_ok(), register_service);
    }
}
