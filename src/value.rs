//! Dynamic option values
//!
//! A [`Value`] is what an option holds once it has been cleaned and validated.
//! It mirrors the JSON data model with two additions: timezone-aware
//! datetimes and nested option containers.

use std::cmp::Ordering;
use std::fmt;
use std::ops::Index;

use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde_json::Value as JsonValue;

use crate::container::OptionContainer;

/// Kind of a [`Value`], used by type validation and error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Bool,
    Integer,
    Float,
    String,
    DateTime,
    List,
    Map,
    Container,
}

impl ValueKind {
    /// Returns the name used in messages and schema files
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "boolean",
            ValueKind::Integer => "integer",
            ValueKind::Float => "float",
            ValueKind::String => "string",
            ValueKind::DateTime => "datetime",
            ValueKind::List => "list",
            ValueKind::Map => "map",
            ValueKind::Container => "container",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single option value
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    DateTime(DateTime<FixedOffset>),
    List(Vec<Value>),
    Map(IndexMap<String, Value>),
    Container(Box<OptionContainer>),
}

static NULL: Value = Value::Null;

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Integer(_) => ValueKind::Integer,
            Value::Float(_) => ValueKind::Float,
            Value::String(_) => ValueKind::String,
            Value::DateTime(_) => ValueKind::DateTime,
            Value::List(_) => ValueKind::List,
            Value::Map(_) => ValueKind::Map,
            Value::Container(_) => ValueKind::Container,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Integers widen to floats here; nothing else does.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<&DateTime<FixedOffset>> {
        match self {
            Value::DateTime(dt) => Some(dt),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_container(&self) -> Option<&OptionContainer> {
        match self {
            Value::Container(container) => Some(container),
            _ => None,
        }
    }

    /// Order two values of compatible kinds.
    ///
    /// Numbers compare across integer/float, strings lexicographically and
    /// datetimes by instant. Anything else is unordered.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Integer(a), Value::Float(b)) => compare_int_float(*a, *b),
            (Value::Float(a), Value::Integer(b)) => {
                compare_int_float(*b, *a).map(Ordering::reverse)
            }
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::DateTime(a), Value::DateTime(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Convert a JSON value. Numbers become integers when they fit in `i64`.
    pub fn from_json(json: JsonValue) -> Self {
        match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => n.as_f64().map(Value::Float).unwrap_or(Value::Null),
            },
            JsonValue::String(s) => Value::String(s),
            JsonValue::Array(items) => Value::List(items.into_iter().map(Value::from_json).collect()),
            JsonValue::Object(map) => Value::Map(
                map.into_iter()
                    .map(|(k, v)| (k, Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Convert to JSON. Datetimes become RFC 3339 strings, containers objects.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Null => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::Integer(i) => JsonValue::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Value::String(s) => JsonValue::String(s.clone()),
            Value::DateTime(dt) => {
                JsonValue::String(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            Value::List(items) => JsonValue::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(map) => JsonValue::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
            Value::Container(container) => container.to_json(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{:?}", x),
            Value::String(s) => write!(f, "{}", s),
            Value::DateTime(dt) => write!(f, "{}", dt.to_rfc3339()),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
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
            Value::Container(container) => write!(f, "{}", container),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Container(container) => container.serialize(serializer),
            other => other.to_json().serialize(serializer),
        }
    }
}

/// Exact integer/float ordering; `as f64` would round integers above 2^53.
fn compare_int_float(int: i64, float: f64) -> Option<Ordering> {
    const TWO_63: f64 = 9_223_372_036_854_775_808.0;

    if float.is_nan() {
        return None;
    }
    if float >= TWO_63 {
        return Some(Ordering::Less);
    }
    if float < -TWO_63 {
        return Some(Ordering::Greater);
    }

    let whole = float.trunc();
    match int.cmp(&(whole as i64)) {
        Ordering::Equal => 0.0_f64.partial_cmp(&(float - whole)),
        other => Some(other),
    }
}

/// Missing keys and non-indexable values yield `Value::Null`.
impl Index<&str> for Value {
    type Output = Value;

    fn index(&self, key: &str) -> &Value {
        match self {
            Value::Map(map) => map.get(key).unwrap_or(&NULL),
            Value::Container(container) => container.get(key).unwrap_or(&NULL),
            _ => &NULL,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        Value::DateTime(dt)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(dt: DateTime<Utc>) -> Self {
        Value::DateTime(dt.fixed_offset())
    }
}

impl From<OptionContainer> for Value {
    fn from(container: OptionContainer) -> Self {
        Value::Container(Box::new(container))
    }
}

impl From<JsonValue> for Value {
    fn from(json: JsonValue) -> Self {
        Value::from_json(json)
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(map: IndexMap<String, Value>) -> Self {
        Value::Map(map)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_names() {
        assert_eq!(Value::from(1).kind(), ValueKind::Integer);
        assert_eq!(Value::from(1.5).kind().as_str(), "float");
        assert_eq!(Value::from("x").kind().to_string(), "string");
        assert_eq!(Value::from(None::<i64>).kind(), ValueKind::Null);
    }

    #[test]
    fn test_from_json_prefers_integers() {
        let value = Value::from_json(json!({"port": 8080, "ratio": 0.5, "tags": ["a"]}));
        assert_eq!(value["port"], Value::Integer(8080));
        assert_eq!(value["ratio"], Value::Float(0.5));
        assert_eq!(value["tags"], Value::List(vec![Value::from("a")]));
        assert!(value["missing"].is_null());
    }

    #[test]
    fn test_compare_mixed_numbers() {
        assert_eq!(Value::from(1).compare(&Value::from(1.5)), Some(Ordering::Less));
        assert_eq!(Value::from(2.0).compare(&Value::from(2)), Some(Ordering::Equal));
        assert_eq!(Value::from("b").compare(&Value::from("a")), Some(Ordering::Greater));
        assert_eq!(Value::from("1").compare(&Value::from(1)), None);
    }

    #[test]
    fn test_compare_large_integers_exactly() {
        let max = Value::from(i64::MAX);
        let two_63 = Value::from(9_223_372_036_854_775_808.0);
        assert_eq!(max.compare(&two_63), Some(Ordering::Less));
        assert_eq!(two_63.compare(&max), Some(Ordering::Greater));

        let near = Value::from(9_007_199_254_740_993_i64);
        assert_eq!(near.compare(&Value::from(9_007_199_254_740_992.0)), Some(Ordering::Greater));
        assert_eq!(Value::from(-2).compare(&Value::from(-1.5)), Some(Ordering::Less));
        assert_eq!(Value::from(-1).compare(&Value::from(-1.5)), Some(Ordering::Greater));
        assert_eq!(Value::from(i64::MIN).compare(&Value::from(-1e19)), Some(Ordering::Greater));
        assert_eq!(Value::from(1).compare(&Value::from(f64::NAN)), None);
    }

    #[test]
    fn test_datetime_to_json() {
        let dt = DateTime::parse_from_rfc3339("2016-05-09T16:00:00+03:00").unwrap();
        assert_eq!(Value::from(dt).to_json(), json!("2016-05-09T16:00:00+03:00"));
    }

    #[test]
    fn test_display() {
        let value = Value::from(vec![Value::from(1), Value::from("two"), Value::Null]);
        assert_eq!(value.to_string(), "[1, two, null]");
        assert_eq!(Value::from(3.0).to_string(), "3.0");
    }
}
