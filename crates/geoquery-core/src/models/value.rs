//! Schema-less property values.
//!
//! Feature properties are not guaranteed to share keys or types across a
//! collection, so each value carries its own tag.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered property map of a feature
pub type Properties = IndexMap<String, PropertyValue>;

/// A single property value
///
/// `Json` holds nested objects and arrays (for example device telemetry
/// payloads) without interpreting them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "serde_json::Value", into = "serde_json::Value")]
pub enum PropertyValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Json(serde_json::Value),
}

impl PropertyValue {
    /// Parse a value typed by a user (CLI argument, config entry)
    pub fn parse_literal(input: &str) -> Self {
        let trimmed = input.trim();

        if trimmed.eq_ignore_ascii_case("null") {
            return PropertyValue::Null;
        }
        if trimmed.eq_ignore_ascii_case("true") {
            return PropertyValue::Bool(true);
        }
        if trimmed.eq_ignore_ascii_case("false") {
            return PropertyValue::Bool(false);
        }
        if let Ok(i) = trimmed.parse::<i64>() {
            return PropertyValue::Int(i);
        }
        // Only accept digit-bearing floats so words like "nan" stay strings
        if trimmed.chars().any(|c| c.is_ascii_digit()) {
            if let Ok(f) = trimmed.parse::<f64>() {
                return PropertyValue::Float(f);
            }
        }

        PropertyValue::Str(input.to_string())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, PropertyValue::Null)
    }

    /// Numeric view of `Int` and `Float` values
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Int(i) => Some(*i as f64),
            PropertyValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Equality where `Int` and `Float` compare by numeric value
    pub fn loosely_equals(&self, other: &PropertyValue) -> bool {
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => self == other,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Null => write!(f, "null"),
            PropertyValue::Bool(b) => write!(f, "{}", b),
            PropertyValue::Int(i) => write!(f, "{}", i),
            PropertyValue::Float(x) => match serde_json::Number::from_f64(*x) {
                Some(n) => write!(f, "{}", n),
                None => write!(f, "{}", x),
            },
            PropertyValue::Str(s) => write!(f, "{}", s),
            PropertyValue::Json(v) => write!(f, "{}", v),
        }
    }
}

impl From<serde_json::Value> for PropertyValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => PropertyValue::Null,
            serde_json::Value::Bool(b) => PropertyValue::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => PropertyValue::Int(i),
                None => n.as_f64().map_or(PropertyValue::Null, PropertyValue::Float),
            },
            serde_json::Value::String(s) => PropertyValue::Str(s),
            other => PropertyValue::Json(other),
        }
    }
}

impl From<PropertyValue> for serde_json::Value {
    fn from(value: PropertyValue) -> Self {
        match value {
            PropertyValue::Null => serde_json::Value::Null,
            PropertyValue::Bool(b) => serde_json::Value::Bool(b),
            PropertyValue::Int(i) => serde_json::Value::from(i),
            PropertyValue::Float(f) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            PropertyValue::Str(s) => serde_json::Value::String(s),
            PropertyValue::Json(v) => v,
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Str(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::Str(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Int(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Float(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_keeps_integer_and_float_apart() {
        assert_eq!(PropertyValue::from(json!(3)), PropertyValue::Int(3));
        assert_eq!(PropertyValue::from(json!(3.5)), PropertyValue::Float(3.5));
        assert_eq!(PropertyValue::from(json!(true)), PropertyValue::Bool(true));
        assert_eq!(PropertyValue::from(json!(null)), PropertyValue::Null);
        assert_eq!(
            PropertyValue::from(json!({"switch": "on"})),
            PropertyValue::Json(json!({"switch": "on"}))
        );
    }

    #[test]
    fn test_properties_deserialize_in_source_order() {
        let props: Properties =
            serde_json::from_str(r#"{"zeta": 1, "alpha": "a", "mid": null}"#).unwrap();

        let keys: Vec<&str> = props.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
        assert_eq!(props["mid"], PropertyValue::Null);
    }

    #[test]
    fn test_display() {
        assert_eq!(PropertyValue::Int(9).to_string(), "9");
        assert_eq!(PropertyValue::Float(5.0).to_string(), "5.0");
        assert_eq!(PropertyValue::Str("10".into()).to_string(), "10");
        assert_eq!(PropertyValue::Bool(false).to_string(), "false");
        assert_eq!(PropertyValue::Json(json!([1, 2])).to_string(), "[1,2]");
    }

    #[test]
    fn test_parse_literal() {
        assert_eq!(PropertyValue::parse_literal("42"), PropertyValue::Int(42));
        assert_eq!(PropertyValue::parse_literal("4.5"), PropertyValue::Float(4.5));
        assert_eq!(PropertyValue::parse_literal("TRUE"), PropertyValue::Bool(true));
        assert_eq!(PropertyValue::parse_literal("null"), PropertyValue::Null);
        assert_eq!(PropertyValue::parse_literal("nan"), PropertyValue::Str("nan".into()));
        assert_eq!(PropertyValue::parse_literal("plug-7"), PropertyValue::Str("plug-7".into()));
    }

    #[test]
    fn test_loosely_equals() {
        assert!(PropertyValue::Int(1).loosely_equals(&PropertyValue::Float(1.0)));
        assert!(PropertyValue::Str("a".into()).loosely_equals(&PropertyValue::Str("a".into())));
        assert!(!PropertyValue::Str("1".into()).loosely_equals(&PropertyValue::Int(1)));
    }
}
