//! Theory argument values.
//!
//! Arguments must serialize for identity hashing and cross-process transport.
//! [`Value::Opaque`] stands in for a value the framework can display by type
//! name but cannot serialize; its presence forces delayed enumeration.

use std::fmt;

use serde::ser::Error as _;
use serde::{Serialize, Serializer};

/// Longest string argument rendered in full in a display name.
const MAX_STRING_DISPLAY: usize = 50;

/// A single theory argument.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    /// Non-finite values encode as the strings `NaN`, `Infinity` and `-Infinity`.
    #[serde(serialize_with = "float_value")]
    Float(f64),
    Char(char),
    Str(String),
    Array(Vec<Value>),
    /// A named member of an enumeration type.
    Enum { type_name: String, member: String },
    /// A value that only has a runtime representation.
    #[serde(serialize_with = "reject_opaque")]
    Opaque { type_name: String },
}

#[expect(
    clippy::ptr_arg,
    reason = "serde passes variant fields by reference to their declared type"
)]
fn reject_opaque<S: Serializer>(type_name: &String, _serializer: S) -> Result<S::Ok, S::Error> {
    Err(S::Error::custom(format!(
        "value of type '{type_name}' is not serializable"
    )))
}

#[allow(
    clippy::trivially_copy_pass_by_ref,
    reason = "serde passes variant fields by reference"
)]
fn float_value<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    // JSON has no literal for these; serde_json would write `null` for all three.
    if value.is_finite() {
        serializer.serialize_f64(*value)
    } else if value.is_nan() {
        serializer.serialize_str("NaN")
    } else if value.is_sign_positive() {
        serializer.serialize_str("Infinity")
    } else {
        serializer.serialize_str("-Infinity")
    }
}

impl Value {
    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    pub fn opaque(type_name: impl Into<String>) -> Self {
        Value::Opaque {
            type_name: type_name.into(),
        }
    }

    /// Type name of the first non-serializable value, searching arrays.
    pub fn opaque_type(&self) -> Option<&str> {
        match self {
            Value::Opaque { type_name } => Some(type_name),
            Value::Array(items) => items.iter().find_map(Value::opaque_type),
            _ => None,
        }
    }

    #[inline]
    pub fn is_serializable(&self) -> bool {
        self.opaque_type().is_none()
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::UInt(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Char(c) => write!(f, "'{}'", c.escape_debug()),
            Value::Str(s) => {
                if s.chars().count() > MAX_STRING_DISPLAY {
                    let head: String = s.chars().take(MAX_STRING_DISPLAY).collect();
                    write!(f, "\"{}\"...", head.escape_debug())
                } else {
                    write!(f, "\"{}\"", s.escape_debug())
                }
            }
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Enum { type_name, member } => write!(f, "{type_name}.{member}"),
            Value::Opaque { type_name } => f.write_str(type_name),
        }
    }
}

/// Failure to serialize a theory argument list.
#[derive(Debug, thiserror::Error)]
pub enum ArgumentSerializationError {
    #[error("value of type '{type_name}' is not serializable")]
    NotSerializable { type_name: String },
    #[error("failed to encode arguments: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Encode an argument list for identity hashing and transport.
pub fn serialize_arguments(arguments: &[Value]) -> Result<String, ArgumentSerializationError> {
    if let Some(type_name) = arguments.iter().find_map(Value::opaque_type) {
        return Err(ArgumentSerializationError::NotSerializable {
            type_name: type_name.to_string(),
        });
    }
    Ok(serde_json::to_string(arguments)?)
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
