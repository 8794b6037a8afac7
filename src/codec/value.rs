//! Cache Value Module
//!
//! The dynamic value tree moved through the codecs.

use std::collections::BTreeMap;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Number, Value as JsonValue};

use crate::error::{CacheError, Result};

// == Cache Value ==
/// A value stored in or loaded from the cache.
///
/// Maps keep their keys sorted, which makes the structured-text encoding canonical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CacheValue {
    Null,
    Bytes(Vec<u8>),
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    List(Vec<CacheValue>),
    Map(BTreeMap<String, CacheValue>),
}

impl CacheValue {
    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            CacheValue::Null => "null",
            CacheValue::Bytes(_) => "bytes",
            CacheValue::Text(_) => "text",
            CacheValue::Integer(_) => "integer",
            CacheValue::Float(_) => "float",
            CacheValue::Boolean(_) => "boolean",
            CacheValue::List(_) => "list",
            CacheValue::Map(_) => "map",
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CacheValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            CacheValue::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            CacheValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            CacheValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CacheValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[CacheValue]> {
        match self {
            CacheValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, CacheValue>> {
        match self {
            CacheValue::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Looks up a field of a map value.
    pub fn get(&self, field: &str) -> Option<&CacheValue> {
        self.as_map().and_then(|map| map.get(field))
    }

    // == JSON Conversion ==
    /// Converts to a JSON value, stringifying leaves JSON cannot represent.
    ///
    /// Bytes become lossy UTF-8 text and non-finite floats become their
    /// textual form (`NaN`, `inf`, `-inf`).
    pub fn to_json(&self) -> JsonValue {
        match self {
            CacheValue::Null => JsonValue::Null,
            CacheValue::Bytes(b) => JsonValue::String(String::from_utf8_lossy(b).into_owned()),
            CacheValue::Text(s) => JsonValue::String(s.clone()),
            CacheValue::Integer(i) => JsonValue::Number((*i).into()),
            CacheValue::Float(f) => Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or_else(|| JsonValue::String(f.to_string())),
            CacheValue::Boolean(b) => JsonValue::Bool(*b),
            CacheValue::List(items) => JsonValue::Array(items.iter().map(Self::to_json).collect()),
            CacheValue::Map(map) => JsonValue::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }

    // == Serde Bridge ==
    /// Builds a value from any serializable Rust type.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        serde_json::to_value(value)
            .map(Self::from)
            .map_err(|e| CacheError::Encode(e.to_string()))
    }

    /// Converts the value into a deserializable Rust type.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.to_json()).map_err(|e| CacheError::Decode(e.to_string()))
    }
}

impl From<JsonValue> for CacheValue {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => CacheValue::Null,
            JsonValue::Bool(b) => CacheValue::Boolean(b),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    CacheValue::Integer(i)
                } else if let Some(f) = n.as_f64() {
                    CacheValue::Float(f)
                } else {
                    CacheValue::Text(n.to_string())
                }
            }
            JsonValue::String(s) => CacheValue::Text(s),
            JsonValue::Array(items) => CacheValue::List(items.into_iter().map(Self::from).collect()),
            JsonValue::Object(map) => {
                CacheValue::Map(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

impl From<&str> for CacheValue {
    fn from(value: &str) -> Self {
        CacheValue::Text(value.to_string())
    }
}

impl From<String> for CacheValue {
    fn from(value: String) -> Self {
        CacheValue::Text(value)
    }
}

impl From<i64> for CacheValue {
    fn from(value: i64) -> Self {
        CacheValue::Integer(value)
    }
}

impl From<i32> for CacheValue {
    fn from(value: i32) -> Self {
        CacheValue::Integer(i64::from(value))
    }
}

impl From<f64> for CacheValue {
    fn from(value: f64) -> Self {
        CacheValue::Float(value)
    }
}

impl From<bool> for CacheValue {
    fn from(value: bool) -> Self {
        CacheValue::Boolean(value)
    }
}

impl From<Vec<u8>> for CacheValue {
    fn from(value: Vec<u8>) -> Self {
        CacheValue::Bytes(value)
    }
}

impl From<&[u8]> for CacheValue {
    fn from(value: &[u8]) -> Self {
        CacheValue::Bytes(value.to_vec())
    }
}

impl From<Vec<CacheValue>> for CacheValue {
    fn from(value: Vec<CacheValue>) -> Self {
        CacheValue::List(value)
    }
}

impl From<BTreeMap<String, CacheValue>> for CacheValue {
    fn from(value: BTreeMap<String, CacheValue>) -> Self {
        CacheValue::Map(value)
    }
}

impl<T: Into<CacheValue>> From<Option<T>> for CacheValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(CacheValue::Null, Into::into)
    }
}

impl<K: Into<String>, V: Into<CacheValue>> FromIterator<(K, V)> for CacheValue {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        CacheValue::Map(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
