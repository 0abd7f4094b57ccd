use super::*;
use pretty_assertions::assert_eq;

fn class(name: &str, namespace: Option<&str>) -> TestClass {
    let assembly = Arc::new(TestAssembly::new("tests", "/tmp/tests.dll", None));
    let collection = Arc::new(TestCollection {
        unique_id: unique_id::for_collection(&assembly.unique_id, "c", None),
        display_name: "c".into(),
        assembly,
        definition: None,
        disable_parallelization: false,
        fixtures: Vec::new(),
        hooks: Vec::new(),
        test_case_orderer: None,
    });
    TestClass {
        unique_id: unique_id::for_class(&collection.unique_id, name),
        name: name.into(),
        namespace: namespace.map(str::to_string),
        collection,
        traits: Traits::new(),
    }
}

#[test]
fn test_simple_name_strips_namespace() {
    assert_eq!(class("Ns.Inner.Foo", Some("Ns.Inner")).simple_name(), "Foo");
    assert_eq!(class("Foo", None).simple_name(), "Foo");
    // A namespace that is not actually a prefix leaves the name alone.
    assert_eq!(class("Other.Foo", Some("Ns")).simple_name(), "Other.Foo");
}

#[test]
fn test_qualified_method_name() {
    let method = TestMethod {
        unique_id: unique_id::hash(["m"]),
        name: "Works".into(),
        class: Arc::new(class("Ns.Foo", Some("Ns"))),
        parameters: Vec::new(),
        traits: Traits::new(),
        skip: None,
        data_sources: Vec::new(),
    };
    assert_eq!(method.qualified_name(), "Ns.Foo.Works");
}

#[test]
fn test_assembly_identity_includes_config() {
    let plain = TestAssembly::new("a", "/a.dll", None);
    let configured = TestAssembly::new("a", "/a.dll", Some("a.json".into()));
    assert_ne!(plain.unique_id, configured.unique_id);
}
