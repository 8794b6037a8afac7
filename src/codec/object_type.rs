//! Object Type Module
//!
//! The logical type descriptor a cache client is declared with.

use std::fmt;
use std::str::FromStr;

use crate::codec::RecordSchema;
use crate::error::{CacheError, Result};

// == Object Type ==
/// Declared shape of the values of a cache client, driving codec selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ObjectType {
    Bytes,
    Text,
    Integer,
    Float,
    Boolean,
    /// Structured list, stored as structured text
    List,
    /// Structured map, stored as structured text
    Map,
    /// Schema-validated record, or list of records when the schema is `many`
    Record(RecordSchema),
    /// Opaque value tree, stored in binary form
    #[default]
    Object,
}

impl ObjectType {
    pub fn record(schema: RecordSchema) -> Self {
        ObjectType::Record(schema)
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectType::Bytes => f.write_str("bytes"),
            ObjectType::Text => f.write_str("str"),
            ObjectType::Integer => f.write_str("int"),
            ObjectType::Float => f.write_str("float"),
            ObjectType::Boolean => f.write_str("bool"),
            ObjectType::List => f.write_str("list"),
            ObjectType::Map => f.write_str("dict"),
            ObjectType::Record(schema) => write!(f, "{schema}"),
            ObjectType::Object => f.write_str("object"),
        }
    }
}

// == Parsing ==
/// Parses a type name such as `int`, `dict` or `record(name:str,age:int)`.
///
/// `records(...)` declares a list of records.
impl FromStr for ObjectType {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim();
        let simple = match name.to_ascii_lowercase().as_str() {
            "bytes" => Some(ObjectType::Bytes),
            "str" | "text" => Some(ObjectType::Text),
            "int" | "integer" => Some(ObjectType::Integer),
            "float" => Some(ObjectType::Float),
            "bool" | "boolean" => Some(ObjectType::Boolean),
            "list" => Some(ObjectType::List),
            "dict" | "map" => Some(ObjectType::Map),
            "object" => Some(ObjectType::Object),
            _ => None,
        };
        if let Some(object_type) = simple {
            return Ok(object_type);
        }

        let unsupported = || CacheError::UnsupportedType(name.to_string());
        let (head, rest) = name.split_once('(').ok_or_else(unsupported)?;
        let body = rest.strip_suffix(')').ok_or_else(unsupported)?;

        match head.trim().to_ascii_lowercase().as_str() {
            "record" => RecordSchema::parse_fields("record", body).map(ObjectType::Record),
            "records" => RecordSchema::parse_fields("records", body)
                .map(|schema| ObjectType::Record(schema.many())),
            _ => Err(unsupported()),
        }
    }
}
