use std::sync::Arc;

use super::*;
use trial_ir::{unique_id, TestAssembly, TestClass, TestCollection, TestMethod, Traits, UnitKind};

fn subject<'a>(class: &'a str, method: &'a str, traits: &'a Traits) -> FilterSubject<'a> {
    let (namespace, simple) = class.rsplit_once('.').unwrap_or(("", class));
    FilterSubject {
        assembly_name: "asm1",
        namespace: (!namespace.is_empty()).then_some(namespace),
        class_name: class,
        class_simple_name: simple,
        method_name: method,
        traits,
    }
}

#[test]
fn test_empty_filters_always_pass() {
    let filters = TestFilters::new();
    let none = Traits::new();
    let some = Traits::new().with("a", "b");
    assert!(filters.is_empty());
    assert!(filters.passes_subject(&subject("Ns.Foo", "Bar", &none)));
    assert!(filters.passes_subject(&subject("Foo", "Bar", &some)));
}

#[test]
fn test_include_class_or_method_is_or() {
    let mut filters = TestFilters::new();
    filters.include_class("Ns.Foo").unwrap();
    filters.include_method("Ns.Other.Only").unwrap();
    let t = Traits::new();

    assert!(filters.passes_subject(&subject("Ns.Foo", "Anything", &t)));
    assert!(filters.passes_subject(&subject("Ns.Other", "Only", &t)));
    assert!(!filters.passes_subject(&subject("Ns.Other", "Else", &t)));
}

#[test]
fn test_method_wildcards() {
    let mut filters = TestFilters::new();
    filters.include_method("*.Name?ne").unwrap();
    let t = Traits::new();

    assert!(filters.passes_subject(&subject("Ns.Foo", "NameOne", &t)));
    assert!(filters.passes_subject(&subject("Ns.Foo", "nameone", &t)));
    assert!(!filters.passes_subject(&subject("Ns.Foo", "NameTwo", &t)));
}

#[test]
fn test_exclude_method_fires() {
    let mut filters = TestFilters::new();
    filters.exclude_method("Ns.Foo.Slow").unwrap();
    let t = Traits::new();

    assert!(!filters.passes_subject(&subject("Ns.Foo", "Slow", &t)));
    assert!(filters.passes_subject(&subject("Ns.Foo", "Fast", &t)));
}

#[test]
fn test_namespace_prefix() {
    let mut filters = TestFilters::new();
    filters.include_namespace("Ns.Inner").unwrap();
    let t = Traits::new();

    assert!(filters.passes_subject(&subject("Ns.Inner.Foo", "M", &t)));
    assert!(filters.passes_subject(&subject("ns.inner.Deeper.Foo", "M", &t)));
    assert!(!filters.passes_subject(&subject("Ns.InnerSibling.Foo", "M", &t)));
    assert!(!filters.passes_subject(&subject("Foo", "M", &t)));
}

#[test]
fn test_excluded_namespace() {
    let mut filters = TestFilters::new();
    filters.exclude_namespace("Ns.Slow").unwrap();
    let t = Traits::new();

    assert!(!filters.passes_subject(&subject("Ns.Slow.Foo", "M", &t)));
    assert!(filters.passes_subject(&subject("Ns.Fast.Foo", "M", &t)));
    assert!(filters.passes_subject(&subject("Foo", "M", &t)));
}

#[test]
fn test_include_trait_rejects_units_without_traits() {
    let mut filters = TestFilters::new();
    filters.include_trait("Category", "Unit").unwrap();
    let none = Traits::new();
    let other = Traits::new().with("Category", "Integration");
    let matching = Traits::new().with("category", "UNIT");

    assert!(!filters.passes_subject(&subject("Ns.Foo", "M", &none)));
    assert!(!filters.passes_subject(&subject("Ns.Foo", "M", &other)));
    assert!(filters.passes_subject(&subject("Ns.Foo", "M", &matching)));
}

#[test]
fn test_exclude_trait_passes_units_without_traits() {
    let mut filters = TestFilters::new();
    filters.exclude_trait_text("Category=Slow").unwrap();
    let none = Traits::new();
    let slow = Traits::new().with("Category", "Slow");

    assert!(filters.passes_subject(&subject("Ns.Foo", "M", &none)));
    assert!(!filters.passes_subject(&subject("Ns.Foo", "M", &slow)));
}

#[test]
fn test_mutation_after_evaluation_recompiles() {
    let mut filters = TestFilters::new();
    filters.include_method("Ns.Foo.A*").unwrap();
    let t = Traits::new();

    assert!(!filters.passes_subject(&subject("Ns.Foo", "Beta", &t)));
    filters.include_method("Ns.Foo.B*").unwrap();
    assert!(filters.passes_subject(&subject("Ns.Foo", "Beta", &t)));
    assert!(filters.passes_subject(&subject("Ns.Foo", "Alpha", &t)));
}

#[test]
fn test_concurrent_evaluation() {
    let mut filters = TestFilters::new();
    filters.include_method("*.Keep*").unwrap();
    let t = Traits::new();

    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                for _ in 0..100 {
                    assert!(filters.passes_subject(&subject("Ns.Foo", "KeepMe", &t)));
                    assert!(!filters.passes_subject(&subject("Ns.Foo", "Drop", &t)));
                }
            });
        }
    });
}

#[test]
fn test_invalid_trait_text() {
    let mut filters = TestFilters::new();
    assert!(matches!(
        filters.include_trait_text("novalue"),
        Err(FilterError::InvalidTrait(_))
    ));
    assert!(matches!(
        filters.include_trait_text("=x"),
        Err(FilterError::InvalidTrait(_))
    ));
}

#[test]
fn test_simple_and_query_are_exclusive() {
    let mut simple_first = TestFilters::new();
    simple_first.include_class("Foo").unwrap();
    assert!(matches!(
        simple_first.add_query("/a"),
        Err(FilterError::QueryAfterSimple)
    ));

    let mut query_first = TestFilters::new();
    query_first.add_query("/a").unwrap();
    assert!(matches!(
        query_first.exclude_trait("a", "b"),
        Err(FilterError::SimpleAfterQuery)
    ));
}

#[test]
fn test_queries_combine_with_or() {
    let mut filters = TestFilters::new();
    filters.add_query("/asm1/Ns/Foo").unwrap();
    filters.add_query("/asm1/Ns/Bar").unwrap();
    let t = Traits::new();

    assert!(filters.passes_subject(&subject("Ns.Foo", "M", &t)));
    assert!(filters.passes_subject(&subject("Ns.Bar", "M", &t)));
    assert!(!filters.passes_subject(&subject("Ns.Baz", "M", &t)));
}

#[test]
fn test_passes_reads_test_unit() {
    let assembly = Arc::new(TestAssembly::new("asm1", "/asm1.dll", None));
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
    let class = Arc::new(TestClass {
        unique_id: unique_id::for_class(&collection.unique_id, "Ns.Foo"),
        name: "Ns.Foo".into(),
        namespace: Some("Ns".into()),
        collection,
        traits: Traits::new(),
    });
    let method = Arc::new(TestMethod {
        unique_id: unique_id::for_method(&class.unique_id, "Bar"),
        name: "Bar".into(),
        class,
        parameters: Vec::new(),
        traits: Traits::new(),
        skip: None,
        data_sources: Vec::new(),
    });
    let unit = TestUnit {
        unique_id: unique_id::for_test_case(&method.unique_id, None),
        display_name: "Ns.Foo.Bar".into(),
        method,
        skip_reason: None,
        traits: Traits::new(),
        arguments: None,
        serialized_arguments: None,
        kind: UnitKind::Fact,
    };

    let mut filters = TestFilters::new();
    filters.add_query("/asm1/ns/foo/bar").unwrap();
    assert!(filters.passes(&unit));
}
