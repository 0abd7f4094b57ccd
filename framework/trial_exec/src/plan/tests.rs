use super::*;
use pretty_assertions::assert_eq;
use trial_discovery::{
    AssemblyInfo, CollectionBehavior, CollectionPolicy, Discoverer, DiscoveryOptions, MethodInfo,
    StaticModule, TestMarker, TypeInfo,
};
use trial_ir::{OrdererKind, UnitKind};

fn shared_module() -> StaticModule {
    let mut info = AssemblyInfo::new("tests", "/bin/tests");
    info.behavior = CollectionBehavior {
        policy: CollectionPolicy::PerAssembly,
        disable_parallelization: false,
    };
    StaticModule::new(info)
        .with_type(
            TypeInfo::new("Ns.B"),
            vec![
                MethodInfo::new("Y").marked(TestMarker::fact()),
                MethodInfo::new("X").marked(TestMarker::fact()),
            ],
        )
        .with_type(
            TypeInfo::new("Ns.A"),
            vec![MethodInfo::new("Z").marked(TestMarker::fact())],
        )
}

fn names(assembly: &AssemblyGroup) -> Vec<String> {
    assembly
        .collections
        .iter()
        .flat_map(|c| &c.classes)
        .flat_map(|k| &k.methods)
        .flat_map(|m| &m.units)
        .map(|u| u.display_name.clone())
        .collect()
}

#[test]
fn test_group_keeps_first_appearance() {
    let units = Discoverer::new(&shared_module(), DiscoveryOptions::default()).discover_all();
    let mut units_interleaved = units.clone();
    // Moving a unit to the end must not split its class group.
    units_interleaved.rotate_left(1);

    let plan = group(units_interleaved);

    assert_eq!(plan.len(), 1);
    let assembly = &plan[0];
    assert_eq!(assembly.collections.len(), 1);
    assert_eq!(assembly.collections[0].unit_count(), 3);
    let classes: Vec<&str> = assembly.collections[0]
        .classes
        .iter()
        .map(|k| k.class.name.as_str())
        .collect();
    assert_eq!(classes, vec!["Ns.B", "Ns.A"]);
    assert_eq!(names(assembly), vec!["Ns.B.X", "Ns.B.Y", "Ns.A.Z"]);
}

#[test]
fn test_unordered_config_preserves_grouped_order() {
    let units = Discoverer::new(&shared_module(), DiscoveryOptions::default()).discover_all();
    let mut plan = group(units);
    order(&mut plan[0], &OrderingConfig::unordered());
    assert_eq!(names(&plan[0]), vec!["Ns.B.Y", "Ns.B.X", "Ns.A.Z"]);
}

#[test]
fn test_default_order_ignores_input_order() {
    let units = Discoverer::new(&shared_module(), DiscoveryOptions::default()).discover_all();
    let mut reversed = units.clone();
    reversed.reverse();

    let mut forward = group(units);
    let mut backward = group(reversed);
    order(&mut forward[0], &OrderingConfig::default());
    order(&mut backward[0], &OrderingConfig::default());

    assert_eq!(names(&forward[0]), names(&backward[0]));
    assert!(forward[0].collections[0]
        .classes
        .iter()
        .flat_map(|k| &k.methods)
        .flat_map(|m| &m.units)
        .all(|u| u.kind == UnitKind::Fact));
}

#[test]
fn test_case_ordering_leaves_other_levels() {
    let units = Discoverer::new(&shared_module(), DiscoveryOptions::default()).discover_all();
    let mut plan = group(units);
    let config = OrderingConfig {
        test_cases: OrdererKind::Default,
        ..OrderingConfig::unordered()
    };
    order(&mut plan[0], &config);
    // Classes and methods untouched by an unordered config.
    assert_eq!(names(&plan[0]), vec!["Ns.B.Y", "Ns.B.X", "Ns.A.Z"]);
}
