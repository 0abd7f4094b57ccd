use super::*;
use proptest::prelude::*;

#[test]
fn test_hash_is_deterministic() {
    let a = hash(["assembly.dll", "MyClass"]);
    let b = hash(["assembly.dll", "MyClass"]);
    assert_eq!(a, b);
}

#[test]
fn test_separator_escaping() {
    assert_ne!(hash(["a", "b"]), hash(["ab"]));
    assert_ne!(hash(["a", ""]), hash(["a"]));
    assert_ne!(hash(["", "a"]), hash(["a", ""]));
}

#[test]
fn test_absent_part_differs_from_empty() {
    let absent = hash_optional([Some("x"), None]);
    let empty = hash_optional([Some("x"), Some("")]);
    assert_ne!(absent, empty);
}

#[test]
fn test_rendered_form() {
    let id = hash(["anything"]);
    assert_eq!(id.as_str().len(), ID_LEN);
    assert!(id.as_str().starts_with(ID_VERSION));
    assert!(id
        .as_str()
        .chars()
        .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
}

#[test]
fn test_known_vector_is_stable() {
    // Locks the encoding: changing it would silently re-key every stored ID.
    let no_parts: [&str; 0] = [];
    let id = hash(no_parts);
    assert_eq!(
        id.as_str(),
        "01e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    );
}

#[test]
fn test_typed_constructors_nest() {
    let assembly = for_assembly("/tmp/tests.dll", None);
    let collection = for_collection(&assembly, "Test collection for Foo", None);
    let class = for_class(&collection, "Ns.Foo");
    let method = for_method(&class, "Bar");
    let case = for_test_case(&method, None);
    let row = for_test_case(&method, Some("[1]"));
    assert_ne!(case, row);
    assert_ne!(for_test(&case, 0), for_test(&case, 1));
    assert_ne!(
        for_assembly("/tmp/tests.dll", Some("xunit.json")),
        assembly
    );
}

#[test]
fn test_serde_is_transparent() {
    let id = hash(["x"]);
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, format!("\"{id}\""));
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 256, ..ProptestConfig::default() })]

    #[test]
    fn concatenation_never_collides(a in ".{0,8}", b in ".{0,8}") {
        let joined = format!("{a}{b}");
        prop_assert_ne!(hash([a.as_str(), b.as_str()]), hash([joined.as_str()]));
    }

    #[test]
    fn hashing_is_pure(parts in proptest::collection::vec(".{0,12}", 0..5)) {
        let first = hash(parts.iter().map(String::as_str));
        let second = hash(parts.iter().map(String::as_str));
        prop_assert_eq!(first, second);
    }
}
