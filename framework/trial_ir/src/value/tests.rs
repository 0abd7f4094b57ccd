use super::*;
use pretty_assertions::assert_eq;

#[test]
fn test_display_scalars() {
    assert_eq!(Value::Null.to_string(), "null");
    assert_eq!(Value::from(42).to_string(), "42");
    assert_eq!(Value::UInt(7).to_string(), "7");
    assert_eq!(Value::Float(1.5).to_string(), "1.5");
    assert_eq!(Value::from(true).to_string(), "true");
    assert_eq!(Value::Char('x').to_string(), "'x'");
}

#[test]
fn test_display_strings_are_quoted_and_escaped() {
    assert_eq!(Value::from("hi").to_string(), "\"hi\"");
    assert_eq!(Value::from("a\"b\n").to_string(), "\"a\\\"b\\n\"");
}

#[test]
fn test_display_long_string_truncates() {
    let long = "x".repeat(60);
    let rendered = Value::str(long).to_string();
    assert_eq!(rendered, format!("\"{}\"...", "x".repeat(50)));
}

#[test]
fn test_display_compound() {
    let array = Value::Array(vec![Value::from(1), Value::from("two"), Value::Null]);
    assert_eq!(array.to_string(), "[1, \"two\", null]");

    let member = Value::Enum {
        type_name: "Color".into(),
        member: "Red".into(),
    };
    assert_eq!(member.to_string(), "Color.Red");
    assert_eq!(Value::opaque("System.IntPtr").to_string(), "System.IntPtr");
}

#[test]
fn test_serialize_arguments_is_stable() {
    let args = vec![Value::from(1), Value::from("a")];
    let first = serialize_arguments(&args).unwrap();
    let second = serialize_arguments(&args).unwrap();
    assert_eq!(first, second);
    assert_ne!(
        first,
        serialize_arguments(&[Value::from(2), Value::from("a")]).unwrap()
    );
}

#[test]
fn test_opaque_is_not_serializable() {
    let args = vec![
        Value::from(1),
        Value::Array(vec![Value::opaque("Handle")]),
    ];
    assert!(!args[1].is_serializable());
    match serialize_arguments(&args) {
        Err(ArgumentSerializationError::NotSerializable { type_name }) => {
            assert_eq!(type_name, "Handle");
        }
        other => panic!("expected NotSerializable, got {other:?}"),
    }
}

#[test]
fn test_serde_rejects_opaque_directly() {
    assert!(serde_json::to_string(&Value::opaque("Handle")).is_err());
}

#[test]
fn test_non_finite_floats_serialize_distinctly() {
    let encoded: Vec<String> = [f64::NAN, f64::INFINITY, f64::NEG_INFINITY, 0.0, -0.0]
        .into_iter()
        .map(|x| serialize_arguments(&[Value::Float(x)]).unwrap())
        .collect();
    assert_eq!(encoded[0], r#"[{"type":"float","value":"NaN"}]"#);
    assert_eq!(encoded[1], r#"[{"type":"float","value":"Infinity"}]"#);
    assert_eq!(encoded[2], r#"[{"type":"float","value":"-Infinity"}]"#);
    for (i, a) in encoded.iter().enumerate() {
        for b in &encoded[i + 1..] {
            assert_ne!(a, b);
        }
    }
    // The tag keeps a non-finite float apart from a string of the same text.
    assert_ne!(
        encoded[0],
        serialize_arguments(&[Value::from("NaN")]).unwrap()
    );
    assert_ne!(encoded[0], serialize_arguments(&[Value::Null]).unwrap());
}
