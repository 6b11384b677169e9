//! Types module: defines the operand values predicates compare against.
//!
//! This module provides the Value enum and its conversion into native BSON.

use std::collections::BTreeMap;
use bson::{Bson, Document};
use serde::{Serialize, Deserialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
    Array(Vec<Value>),
    Object(BTreeMap<String, Value>),
}

impl Value {
    /// Name of the value's type, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Double(_) => "double",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Converts this value into its native BSON representation.
    pub fn to_bson(&self) -> Bson {
        match self {
            Value::Null => Bson::Null,
            Value::Bool(b) => Bson::Boolean(*b),
            Value::Int(i) => Bson::Int64(*i),
            Value::Double(d) => Bson::Double(*d),
            Value::String(s) => Bson::String(s.clone()),
            Value::Array(vals) => Bson::Array(vals.iter().map(Value::to_bson).collect()),
            Value::Object(map) => {
                let mut doc = Document::new();
                for (k, v) in map {
                    doc.insert(k.clone(), v.to_bson());
                }
                Bson::Document(doc)
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Double(d)
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

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(vals: Vec<T>) -> Self {
        Value::Array(vals.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json;

    #[test]
    fn test_value_type_name() {
        assert_eq!(Value::Int(1).type_name(), "int");
        assert_eq!(Value::from("abc").type_name(), "string");
        assert_eq!(Value::Null.type_name(), "null");
        assert_eq!(Value::from(vec![1, 2]).type_name(), "array");
    }

    #[test]
    fn test_value_to_bson() {
        assert_eq!(Value::Int(123).to_bson(), Bson::Int64(123));
        assert_eq!(Value::from(true).to_bson(), Bson::Boolean(true));
        assert_eq!(Value::from(None::<i64>).to_bson(), Bson::Null);
        assert_eq!(
            Value::from(vec!["a", "b"]).to_bson(),
            Bson::Array(vec![Bson::String("a".into()), Bson::String("b".into())])
        );
        let mut map = BTreeMap::new();
        map.insert("unit".to_string(), Value::from("C"));
        assert_eq!(Value::Object(map).to_bson(), Bson::Document(bson::doc! { "unit": "C" }));
    }

    #[test]
    fn test_as_str() {
        assert_eq!(Value::from("x").as_str(), Some("x"));
        assert_eq!(Value::Int(1).as_str(), None);
    }

    #[test]
    fn test_serialization_deserialization() {
        let val = Value::Array(vec![
            Value::Int(1),
            Value::from("foo"),
            Value::Bool(false),
            Value::Null,
        ]);
        let json = serde_json::to_string(&val).unwrap();
        let deser: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(val, deser);
    }
}
