use super::*;
use pretty_assertions::assert_eq;

fn params(names: &[&str]) -> Vec<Parameter> {
    names.iter().map(|n| Parameter::new(*n)).collect()
}

#[test]
fn test_matching_arguments() {
    let name = format_arguments(
        "Ns.Math.Add",
        &params(&["x", "y"]),
        &[Value::Int(1), Value::str("two")],
    );
    assert_eq!(name, "Ns.Math.Add(x: 1, y: \"two\")");
}

#[test]
fn test_missing_required_argument() {
    let name = format_arguments("M", &params(&["x", "y"]), &[Value::Int(1)]);
    assert_eq!(name, "M(x: 1, y: ???)");
}

#[test]
fn test_missing_optional_argument_is_omitted() {
    let mut parameters = params(&["x", "y"]);
    parameters[1].optional = true;
    let name = format_arguments("M", &parameters, &[Value::Int(1)]);
    assert_eq!(name, "M(x: 1)");
}

#[test]
fn test_surplus_arguments() {
    let name = format_arguments("M", &params(&["x"]), &[Value::Int(1), Value::Bool(true)]);
    assert_eq!(name, "M(x: 1, ???: true)");
}

#[test]
fn test_no_parameters() {
    assert_eq!(format_arguments("M", &[], &[]), "M()");
}

#[test]
fn test_long_string_is_truncated() {
    let long = "a".repeat(60);
    let name = format_arguments("M", &params(&["s"]), &[Value::str(long)]);
    assert_eq!(name, format!("M(s: \"{}\"...)", "a".repeat(50)));
}
