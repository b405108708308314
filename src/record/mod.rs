//! Record value model: what the engine hands back to the HTTP layer.
//!
//! A record maps field names to a [`FieldValue`], which is one of null, a plain
//! scalar, an expanded lookup `{id, name}` or a nested child record set. Keys are
//! kept sorted so serialized records have a stable field order.

mod materialize;

pub use materialize::{materialize, RawCell, RawRow};

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Clone, Debug, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Json(Value),
}

impl Scalar {
    /// Canonical text used to match raw foreign keys against target keys, so an
    /// integer key and its text rendering compare equal.
    pub fn match_key(&self) -> String {
        self.to_string()
    }

    pub fn to_json(&self) -> Value {
        match self {
            Scalar::Bool(b) => Value::Bool(*b),
            Scalar::Int(n) => Value::Number((*n).into()),
            Scalar::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Scalar::Text(s) => Value::String(s.clone()),
            Scalar::Json(v) => v.clone(),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Int(n) => write!(f, "{}", n),
            Scalar::Float(x) => write!(f, "{}", x),
            Scalar::Text(s) => f.write_str(s),
            Scalar::Json(v) => write!(f, "{}", v),
        }
    }
}

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Scalar::Bool(b) => serializer.serialize_bool(*b),
            Scalar::Int(n) => serializer.serialize_i64(*n),
            Scalar::Float(x) => serializer.serialize_f64(*x),
            Scalar::Text(s) => serializer.serialize_str(s),
            Scalar::Json(v) => v.serialize(serializer),
        }
    }
}

/// An expanded lookup: the raw key plus the referenced row's display value.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LookupRef {
    pub id: Scalar,
    pub name: Option<Scalar>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Null,
    Scalar(Scalar),
    Lookup(LookupRef),
    Children(Vec<Record>),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            FieldValue::Scalar(s) => Some(s),
            _ => None,
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Null => serializer.serialize_none(),
            FieldValue::Scalar(s) => s.serialize(serializer),
            FieldValue::Lookup(l) => l.serialize(serializer),
            FieldValue::Children(rows) => rows.serialize(serializer),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Record {
    fields: BTreeMap<String, FieldValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, value: FieldValue) -> Option<FieldValue> {
        self.fields.insert(field.into(), value)
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The field as a bindable key value: a scalar, or the raw id of an expanded lookup.
    pub fn key_value(&self, field: &str) -> Option<Value> {
        match self.fields.get(field)? {
            FieldValue::Scalar(s) => Some(s.to_json()),
            FieldValue::Lookup(l) => Some(l.id.to_json()),
            FieldValue::Null | FieldValue::Children(_) => None,
        }
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}
