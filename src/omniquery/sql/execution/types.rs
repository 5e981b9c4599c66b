//! Core dynamic value types.
//!
//! [`Value`] is the tagged variant flowing through the expression
//! evaluator and row projection: every operator, function argument,
//! and projected column is a `Value`. [`ValueKind`] is the flat tag
//! used by operator dispatch tables and by schema field definitions.

use chrono::{DateTime, Utc};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// The kind tag of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Error,
    Bool,
    Int,
    Number,
    String,
    Time,
    ByteSlice,
    StringSlice,
    Map,
    Struct,
    Slice,
    Row,
}

impl ValueKind {
    /// Type name for error messages and SHOW output.
    pub fn type_name(&self) -> &'static str {
        match self {
            ValueKind::Null => "NULL",
            ValueKind::Error => "ERROR",
            ValueKind::Bool => "BOOLEAN",
            ValueKind::Int => "INTEGER",
            ValueKind::Number => "NUMBER",
            ValueKind::String => "STRING",
            ValueKind::Time => "TIME",
            ValueKind::ByteSlice => "BYTES",
            ValueKind::StringSlice => "STRING_ARRAY",
            ValueKind::Map => "MAP",
            ValueKind::Struct => "STRUCT",
            ValueKind::Slice => "ARRAY",
            ValueKind::Row => "ROW",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// A value in a row field.
///
/// `Null` and `Error` are terminal: operators propagate them rather
/// than failing. `Error` carries a message and marks a row-local data
/// failure (type mismatch, bad pattern); it is not a Rust-level error.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// SQL NULL
    Null,
    /// Row-local evaluation failure with a message
    Error(String),
    /// Boolean value (true/false)
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit floating point number
    Number(f64),
    /// UTF-8 string
    String(String),
    /// Instant in time
    Time(DateTime<Utc>),
    /// Raw byte payload
    ByteSlice(Vec<u8>),
    /// Array of strings
    StringSlice(Vec<String>),
    /// Map of string keys to values
    Map(HashMap<String, Value>),
    /// Opaque structured payload
    Struct(serde_json::Value),
    /// Ordered array of values
    Slice(Vec<Value>),
    /// One output row, values in column order
    Row(Vec<Value>),
}

impl Value {
    /// Convenience constructor for an [`Value::Error`] value.
    pub fn error(message: impl Into<String>) -> Self {
        Value::Error(message.into())
    }

    /// The kind tag of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Error(_) => ValueKind::Error,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Number(_) => ValueKind::Number,
            Value::String(_) => ValueKind::String,
            Value::Time(_) => ValueKind::Time,
            Value::ByteSlice(_) => ValueKind::ByteSlice,
            Value::StringSlice(_) => ValueKind::StringSlice,
            Value::Map(_) => ValueKind::Map,
            Value::Struct(_) => ValueKind::Struct,
            Value::Slice(_) => ValueKind::Slice,
            Value::Row(_) => ValueKind::Row,
        }
    }

    /// Type name for error messages and debugging.
    pub fn type_name(&self) -> &'static str {
        self.kind().type_name()
    }

    /// True only for [`Value::Null`]. An empty string is not nil.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// True only for [`Value::Error`].
    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    /// The error message, when this is an error value.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Value::Error(msg) => Some(msg),
            _ => None,
        }
    }

    /// True for the kinds usable in arithmetic without coercion.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Number(_))
    }

    /// Lossy conversion to f64. `None` when the kind has no numeric
    /// reading (strings parse, times yield epoch milliseconds).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Number(f) => Some(*f),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            Value::Time(t) => Some(t.timestamp_millis() as f64),
            _ => None,
        }
    }

    /// Lossy conversion to i64, truncating floats.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Number(f) if f.is_finite() => Some(*f as i64),
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .ok()
                .or_else(|| s.trim().parse::<f64>().ok().map(|f| f as i64)),
            Value::Time(t) => Some(t.timestamp_millis()),
            _ => None,
        }
    }

    /// Lossy conversion to bool. Strings parse `"true"`/`"false"`
    /// (case-insensitive); integers read non-zero as true.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Int(i) => Some(*i != 0),
            Value::String(s) => parse_bool_str(s),
            _ => None,
        }
    }

    /// Can this value stand in for `to` in a binary operation?
    pub fn can_coerce(&self, to: ValueKind) -> bool {
        match to {
            ValueKind::Number => self.as_f64().is_some(),
            ValueKind::Int => self.as_i64().is_some(),
            ValueKind::Bool => self.as_bool().is_some(),
            ValueKind::String => true,
            other => self.kind() == other,
        }
    }

    /// String form used when a value is written somewhere stringly.
    /// Always succeeds; complex kinds render their display form.
    pub fn to_display_string(&self) -> String {
        self.to_string()
    }
}

/// Parse a boolean-like string: `"true"`/`"false"`, case-insensitive.
pub(crate) fn parse_bool_str(s: &str) -> Option<bool> {
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Cross-kind value equality.
///
/// Exact equality within a kind; Int/Number compare numerically;
/// String compares against Bool when it parses as a boolean. Any other
/// cross-kind pairing is simply not equal — no error.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Int(x), Value::Number(y)) | (Value::Number(y), Value::Int(x)) => *x as f64 == *y,
        (Value::String(s), Value::Bool(v)) | (Value::Bool(v), Value::String(s)) => {
            parse_bool_str(s) == Some(*v)
        }
        _ if a.kind() == b.kind() => a == b,
        _ => false,
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Error(msg) => write!(f, "ERROR({})", msg),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Number(v) => write!(f, "{}", v),
            Value::String(s) => write!(f, "{}", s),
            Value::Time(t) => write!(f, "{}", t.format("%Y-%m-%d %H:%M:%S%.3f")),
            Value::ByteSlice(b) => write!(f, "[{} bytes]", b.len()),
            Value::StringSlice(items) => {
                write!(f, "[")?;
                for (i, s) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", s)?;
                }
                write!(f, "]")
            }
            Value::Map(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
            Value::Struct(v) => write!(f, "{}", v),
            Value::Slice(items) | Value::Row(items) => {
                write!(f, "[")?;
                for (i, v) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            }
        }
    }
}

/// Serialization into output sinks. Times render as ISO strings,
/// errors as their message, rows and slices as sequences.
impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Error(msg) => serializer.serialize_str(msg),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Number(v) => serializer.serialize_f64(*v),
            Value::String(s) => serializer.serialize_str(s),
            Value::Time(t) => {
                serializer.serialize_str(&t.format("%Y-%m-%d %H:%M:%S%.3f").to_string())
            }
            Value::ByteSlice(b) => serializer.serialize_bytes(b),
            Value::StringSlice(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for s in items {
                    seq.serialize_element(s)?;
                }
                seq.end()
            }
            Value::Map(map) => {
                let mut m = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map {
                    m.serialize_entry(k, v)?;
                }
                m.end()
            }
            Value::Struct(v) => v.serialize(serializer),
            Value::Slice(items) | Value::Row(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for v in items {
                    seq.serialize_element(v)?;
                }
                seq.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_per_value() {
        assert_eq!(Value::Int(3).kind(), ValueKind::Int);
        assert_eq!(Value::Number(3.0).kind(), ValueKind::Number);
        assert_eq!(Value::error("boom").kind(), ValueKind::Error);
        assert_eq!(Value::Null.kind(), ValueKind::Null);
    }

    #[test]
    fn test_null_is_not_empty_string() {
        assert!(Value::Null.is_null());
        assert!(!Value::String(String::new()).is_null());
        assert!(!values_equal(&Value::Null, &Value::String(String::new())));
    }

    #[test]
    fn test_values_equal_same_kind() {
        assert!(values_equal(&Value::Int(42), &Value::Int(42)));
        assert!(values_equal(&Value::Null, &Value::Null));
        assert!(!values_equal(&Value::Int(42), &Value::Int(41)));
        assert!(values_equal(
            &Value::String("bob".into()),
            &Value::String("bob".into())
        ));
    }

    #[test]
    fn test_values_equal_numeric_promotion() {
        assert!(values_equal(&Value::Int(4), &Value::Number(4.0)));
        assert!(values_equal(&Value::Number(4.0), &Value::Int(4)));
        assert!(!values_equal(&Value::Int(4), &Value::Number(4.5)));
    }

    #[test]
    fn test_values_equal_bool_string() {
        assert!(values_equal(&Value::String("true".into()), &Value::Bool(true)));
        assert!(values_equal(&Value::Bool(false), &Value::String("FALSE".into())));
        assert!(!values_equal(&Value::String("yes".into()), &Value::Bool(true)));
    }

    #[test]
    fn test_values_equal_cross_kind_is_false() {
        assert!(!values_equal(&Value::Null, &Value::Int(0)));
        assert!(!values_equal(&Value::Bool(true), &Value::Int(1)));
        assert!(!values_equal(
            &Value::String("x".into()),
            &Value::StringSlice(vec!["x".into()])
        ));
    }

    #[test]
    fn test_nan_not_equal_to_itself() {
        let nan = Value::Number(f64::NAN);
        assert!(!values_equal(&nan, &nan));
    }

    #[test]
    fn test_coercion() {
        assert_eq!(Value::String("1.5".into()).as_f64(), Some(1.5));
        assert_eq!(Value::String("abc".into()).as_f64(), None);
        assert_eq!(Value::Int(7).as_f64(), Some(7.0));
        assert_eq!(Value::Number(7.9).as_i64(), Some(7));
        assert_eq!(Value::String("True".into()).as_bool(), Some(true));
        assert!(Value::String("10".into()).can_coerce(ValueKind::Number));
        assert!(!Value::String("ten".into()).can_coerce(ValueKind::Number));
        assert!(Value::Int(1).can_coerce(ValueKind::Number));
    }
}
