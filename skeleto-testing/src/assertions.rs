// Assertions over resolution orders and registries

use skeleto_core::{ComponentDescriptor, InstanceRegistry};

fn position(order: &[String], name: &str) -> usize {
    order
        .iter()
        .position(|n| n == name)
        .unwrap_or_else(|| panic!("Expected '{}' in order {:?}", name, order))
}

/// Assert that `before` appears earlier than `after` in `order`
pub fn assert_precedes(order: &[String], before: &str, after: &str) {
    let (b, a) = (position(order, before), position(order, after));
    assert!(
        b < a,
        "Expected '{}' before '{}', got positions {} and {} in {:?}",
        before,
        after,
        b,
        a,
        order
    );
}

/// Assert that every dependency of every descriptor comes before it
pub fn assert_topological(order: &[String], descriptors: &[ComponentDescriptor]) {
    assert_eq!(
        order.len(),
        descriptors.len(),
        "Expected {} components in order, got {:?}",
        descriptors.len(),
        order
    );
    for descriptor in descriptors {
        for dependency in &descriptor.dependencies {
            assert_precedes(order, dependency, &descriptor.name);
        }
    }
}

/// Assert the registry published exactly `expected`, in that order
pub fn assert_order(registry: &InstanceRegistry, expected: &[&str]) {
    let actual = registry.names();
    assert_eq!(actual, expected, "Expected registry order {:?}, got {:?}", expected, actual);
}

/// Assert that every resolved component was instantiated
pub fn assert_complete(registry: &InstanceRegistry) {
    assert!(
        registry.is_complete(),
        "Expected {} instances, registry holds {}: {:?}",
        registry.expected(),
        registry.len(),
        registry.names()
    );
}

pub fn assert_warning_count(registry: &InstanceRegistry, expected: usize) {
    let actual = registry.warnings().len();
    assert_eq!(
        actual,
        expected,
        "Expected {} warnings, got {}: {:?}",
        expected,
        actual,
        registry.warnings()
    );
}
