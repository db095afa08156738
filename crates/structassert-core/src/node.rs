//! Node model shared by every matcher.
//!
//! A node is a `serde_json::Value` with insertion-ordered maps: a scalar
//! (string, number, bool, null), a sequence, or a mapping. JSON parses
//! straight into it and XML is normalised into mappings of tag-named children.
//!
//! Matching distinguishes *sequential* containers (positional, keys
//! `0..n-1`) from *associative* ones (keyed). A JSON array is always
//! sequential; an object is sequential only when its keys are exactly
//! `"0"`, `"1"`, ... in order.

use std::borrow::Cow;
use std::fmt;

use serde_json::Value;

/// The canonical tree every matcher operates on.
pub type Node = Value;

/// Container classification used to pick a matching algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// String, number, bool or null.
    Scalar,
    /// A container with no entries; compatible with both container shapes.
    Empty,
    /// Array, or object keyed `"0".."n-1"` in order.
    Sequential,
    /// Any other object.
    Associative,
}

impl Shape {
    pub fn of(node: &Value) -> Shape {
        match node {
            Value::Array(items) if items.is_empty() => Shape::Empty,
            Value::Array(_) => Shape::Sequential,
            Value::Object(map) if map.is_empty() => Shape::Empty,
            Value::Object(map) => {
                let positional = map
                    .keys()
                    .enumerate()
                    .all(|(i, key)| *key == i.to_string());
                if positional {
                    Shape::Sequential
                } else {
                    Shape::Associative
                }
            }
            _ => Shape::Scalar,
        }
    }

    pub fn is_container(self) -> bool {
        !matches!(self, Shape::Scalar)
    }
}

/// Runtime type of a node as named by the type-rule language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    String,
    Integer,
    Float,
    Boolean,
    Array,
    Null,
}

impl ValueType {
    pub fn of(node: &Value) -> ValueType {
        match node {
            Value::String(_) => ValueType::String,
            Value::Number(n) if n.is_i64() || n.is_u64() => ValueType::Integer,
            Value::Number(_) => ValueType::Float,
            Value::Bool(_) => ValueType::Boolean,
            Value::Array(_) | Value::Object(_) => ValueType::Array,
            Value::Null => ValueType::Null,
        }
    }

    /// Case-insensitive lookup; `double` is an alias of `float`.
    pub fn from_name(name: &str) -> Option<ValueType> {
        match name.trim().to_ascii_lowercase().as_str() {
            "string" => Some(ValueType::String),
            "integer" => Some(ValueType::Integer),
            "float" | "double" => Some(ValueType::Float),
            "boolean" => Some(ValueType::Boolean),
            "array" => Some(ValueType::Array),
            "null" => Some(ValueType::Null),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ValueType::String => "string",
            ValueType::Integer => "integer",
            ValueType::Float => "float",
            ValueType::Boolean => "boolean",
            ValueType::Array => "array",
            ValueType::Null => "null",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Look up a direct child by key. Sequences accept decimal indices.
pub fn child<'v>(node: &'v Value, key: &str) -> Option<&'v Value> {
    match node {
        Value::Object(map) => map.get(key),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

/// Canonical decimal text of a number: integral floats print without a
/// fractional part so that `1.0` and `1` share the text `"1"`.
pub fn number_text(n: &serde_json::Number) -> String {
    if n.is_i64() || n.is_u64() {
        return n.to_string();
    }
    match n.as_f64() {
        Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

/// Whether a string reads as a decimal number (optional surrounding
/// whitespace, sign, fraction and exponent).
pub fn is_numeric_str(s: &str) -> bool {
    let trimmed = s.trim();
    !trimmed.is_empty()
        && trimmed
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
        && trimmed.parse::<f64>().is_ok()
}

/// Scalar equality used by containment.
///
/// Numbers compare by canonical text, and a number equals a numeric string
/// with the same text (`1` ~ `"1"`, but `1` ≁ `"1.0"`). Everything else
/// compares by identity.
pub fn is_equal_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => number_text(x) == number_text(y),
        (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
            is_numeric_str(s) && number_text(n) == *s
        }
        _ => a == b,
    }
}

/// Loose equality between a node and the text of an `=value` filter.
///
/// Numbers and numeric strings compare numerically with numeric text
/// (`1.5 = "1.50"`, `5 = "5.0"`). Booleans equal `true`/`false`, or
/// otherwise the truthiness of the text, where `""` and `"0"` are false.
/// Null equals `""` and `null`. Anything else compares by text.
pub fn loose_equals(node: &Value, expected: &str) -> bool {
    match node {
        Value::Bool(b) => match expected.trim() {
            "true" => *b,
            "false" => !*b,
            other => *b == !(other.is_empty() || other == "0"),
        },
        Value::Null => expected.is_empty() || expected == "null",
        Value::Number(_) if is_numeric_str(expected) => numeric_eq(value_as_f64(node), expected),
        Value::String(s) if is_numeric_str(s) && is_numeric_str(expected) => {
            numeric_eq(value_as_f64(node), expected)
        }
        _ => value_text(node) == expected,
    }
}

fn numeric_eq(actual: f64, expected: &str) -> bool {
    expected
        .trim()
        .parse::<f64>()
        .map_or(false, |expected| actual == expected)
}

/// Text form of a node for string-based filters.
///
/// Null is the empty string, booleans are `true`/`false`, containers render
/// as compact JSON.
pub fn value_text(node: &Value) -> Cow<'_, str> {
    match node {
        Value::String(s) => Cow::Borrowed(s.as_str()),
        Value::Number(n) => Cow::Owned(number_text(n)),
        Value::Bool(b) => Cow::Borrowed(if *b { "true" } else { "false" }),
        Value::Null => Cow::Borrowed(""),
        Value::Array(_) | Value::Object(_) => Cow::Owned(node.to_string()),
    }
}

/// Numeric reading of a node for `>N` / `<N` filters. Non-numeric strings
/// read as zero; containers read as one when non-empty.
pub fn value_as_f64(node: &Value) -> f64 {
    match node {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Null => 0.0,
        Value::Array(items) => f64::from(u8::from(!items.is_empty())),
        Value::Object(map) => f64::from(u8::from(!map.is_empty())),
    }
}

/// Emptiness for the `empty` filter: null, false, zero, `""`, `"0"` and
/// empty containers.
pub fn is_empty_value(node: &Value) -> bool {
    match node {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty() || s == "0",
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

/// Short human-readable rendering used in diagnostics.
pub fn repr(node: &Value) -> String {
    node.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_shape_classification() {
        assert_eq!(Shape::of(&json!([1, 2])), Shape::Sequential);
        assert_eq!(Shape::of(&json!({"0": "a", "1": "b"})), Shape::Sequential);
        assert_eq!(Shape::of(&json!({"1": "a", "0": "b"})), Shape::Associative);
        assert_eq!(Shape::of(&json!({"0": "a", "2": "b"})), Shape::Associative);
        assert_eq!(Shape::of(&json!({"00": "a"})), Shape::Associative);
        assert_eq!(Shape::of(&json!({"a": 1})), Shape::Associative);
        assert_eq!(Shape::of(&json!([])), Shape::Empty);
        assert_eq!(Shape::of(&json!({})), Shape::Empty);
        assert_eq!(Shape::of(&json!("x")), Shape::Scalar);
    }

    #[test]
    fn test_value_type_names() {
        assert_eq!(ValueType::of(&json!(5)), ValueType::Integer);
        assert_eq!(ValueType::of(&json!(5.5)), ValueType::Float);
        assert_eq!(ValueType::of(&json!({"a": 1})), ValueType::Array);
        assert_eq!(ValueType::from_name("DOUBLE"), Some(ValueType::Float));
        assert_eq!(ValueType::from_name(" Integer "), Some(ValueType::Integer));
        assert_eq!(ValueType::from_name("object"), None);
    }

    #[test]
    fn test_numeric_coercion() {
        assert!(is_equal_value(&json!(1), &json!("1")));
        assert!(is_equal_value(&json!("1"), &json!(1)));
        assert!(!is_equal_value(&json!(1), &json!("1.0")));
        assert!(is_equal_value(&json!(1), &json!(1.0)));
        assert!(!is_equal_value(&json!("1"), &json!("1.0")));
        assert!(!is_equal_value(&json!(true), &json!("1")));
        assert!(!is_equal_value(&json!(1), &json!("abc")));
        assert!(is_equal_value(&json!(null), &json!(null)));
    }

    #[test]
    fn test_loose_equality() {
        assert!(loose_equals(&json!(1.5), "1.50"));
        assert!(loose_equals(&json!(5), "5.0"));
        assert!(loose_equals(&json!("2.0"), "2"));
        assert!(!loose_equals(&json!(5), "6"));
        assert!(!loose_equals(&json!(5), "five"));

        assert!(loose_equals(&json!(true), "1"));
        assert!(loose_equals(&json!(true), "true"));
        assert!(loose_equals(&json!(false), "0"));
        assert!(loose_equals(&json!(false), ""));
        assert!(!loose_equals(&json!(true), "false"));
        assert!(!loose_equals(&json!(false), "yes"));

        assert!(loose_equals(&json!(null), ""));
        assert!(loose_equals(&json!(null), "null"));
        assert!(loose_equals(&json!("abc"), "abc"));
        assert!(!loose_equals(&json!("abc"), "ABC"));
    }

    #[test]
    fn test_is_numeric_str() {
        assert!(is_numeric_str("12"));
        assert!(is_numeric_str(" -1.5e3 "));
        assert!(!is_numeric_str("inf"));
        assert!(!is_numeric_str("NaN"));
        assert!(!is_numeric_str(""));
        assert!(!is_numeric_str("0x1A"));
    }

    #[test]
    fn test_emptiness() {
        for empty in [json!(null), json!(false), json!(0), json!(""), json!("0"), json!([]), json!({})] {
            assert!(is_empty_value(&empty), "{empty} should be empty");
        }
        for full in [json!(true), json!(1), json!("a"), json!([0]), json!({"a": null})] {
            assert!(!is_empty_value(&full), "{full} should not be empty");
        }
    }

    #[test]
    fn test_child_lookup() {
        let data = json!({"items": ["a", "b"]});
        assert_eq!(child(&data, "items"), Some(&json!(["a", "b"])));
        assert_eq!(child(&data["items"], "1"), Some(&json!("b")));
        assert_eq!(child(&data["items"], "x"), None);
        assert_eq!(child(&json!(3), "a"), None);
    }
}
