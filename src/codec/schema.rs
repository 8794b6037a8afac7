//! Record Schema Module
//!
//! Field sets used to validate structured records and lists of records.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::codec::CacheValue;
use crate::error::{CacheError, Result};

// == Field Kind ==
/// Accepted shape of a record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Str,
    Int,
    Float,
    Bool,
    List,
    Dict,
    Any,
}

impl FieldKind {
    /// Checks a field value, returning its normalized form.
    ///
    /// Integers are accepted for float fields and widened.
    fn check(self, value: &CacheValue) -> Option<CacheValue> {
        match (self, value) {
            (FieldKind::Any, v) => Some(v.clone()),
            (FieldKind::Str, CacheValue::Text(_))
            | (FieldKind::Int, CacheValue::Integer(_))
            | (FieldKind::Float, CacheValue::Float(_))
            | (FieldKind::Bool, CacheValue::Boolean(_))
            | (FieldKind::List, CacheValue::List(_))
            | (FieldKind::Dict, CacheValue::Map(_)) => Some(value.clone()),
            (FieldKind::Float, CacheValue::Integer(i)) => Some(CacheValue::Float(*i as f64)),
            _ => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            FieldKind::Str => "str",
            FieldKind::Int => "int",
            FieldKind::Float => "float",
            FieldKind::Bool => "bool",
            FieldKind::List => "list",
            FieldKind::Dict => "dict",
            FieldKind::Any => "any",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldKind {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "str" | "text" => Ok(FieldKind::Str),
            "int" | "integer" => Ok(FieldKind::Int),
            "float" => Ok(FieldKind::Float),
            "bool" | "boolean" => Ok(FieldKind::Bool),
            "list" => Ok(FieldKind::List),
            "dict" | "map" => Ok(FieldKind::Dict),
            "any" => Ok(FieldKind::Any),
            other => Err(CacheError::UnsupportedType(format!(
                "unknown field kind '{other}'"
            ))),
        }
    }
}

// == Field Spec ==
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    /// Optional fields accept a missing or null value
    pub optional: bool,
}

// == Record Schema ==
/// Defined field set of a schema-validated record.
///
/// Unknown fields are dropped during validation, so the canonical form of a
/// record only ever contains the declared fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSchema {
    name: String,
    fields: Vec<FieldSpec>,
    many: bool,
}

impl RecordSchema {
    /// Creates an empty schema for a single record.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            many: false,
        }
    }

    /// Adds a required field.
    pub fn field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push(FieldSpec {
            name: name.into(),
            kind,
            optional: false,
        });
        self
    }

    /// Adds a field that may be missing or null.
    pub fn optional_field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push(FieldSpec {
            name: name.into(),
            kind,
            optional: true,
        });
        self
    }

    /// Turns the schema into a list-of-records schema.
    pub fn many(mut self) -> Self {
        self.many = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn is_many(&self) -> bool {
        self.many
    }

    // == Validate ==
    /// Validates a value against the schema and returns its normalized form.
    pub fn validate(&self, value: &CacheValue) -> Result<CacheValue> {
        if !self.many {
            return self.validate_record(value, &self.name);
        }

        let items = value.as_list().ok_or_else(|| {
            CacheError::Validation(format!(
                "{}: expected a list of records, got {}",
                self.name,
                value.kind()
            ))
        })?;

        items
            .iter()
            .enumerate()
            .map(|(i, item)| self.validate_record(item, &format!("{}[{i}]", self.name)))
            .collect::<Result<Vec<_>>>()
            .map(CacheValue::List)
    }

    fn validate_record(&self, value: &CacheValue, path: &str) -> Result<CacheValue> {
        let map = value.as_map().ok_or_else(|| {
            CacheError::Validation(format!("{path}: expected a record, got {}", value.kind()))
        })?;

        let mut out = BTreeMap::new();
        for spec in &self.fields {
            let normalized = match map.get(&spec.name) {
                None | Some(CacheValue::Null) if spec.optional => CacheValue::Null,
                None => {
                    return Err(CacheError::Validation(format!(
                        "{path}.{}: field required",
                        spec.name
                    )))
                }
                Some(field) => spec.kind.check(field).ok_or_else(|| {
                    CacheError::Validation(format!(
                        "{path}.{}: expected {}, got {}",
                        spec.name,
                        spec.kind,
                        field.kind()
                    ))
                })?,
            };
            out.insert(spec.name.clone(), normalized);
        }

        Ok(CacheValue::Map(out))
    }

    // == Parse Fields ==
    /// Parses a comma separated `name:kind` list; a trailing `?` marks a field optional.
    pub(crate) fn parse_fields(name: &str, body: &str) -> Result<Self> {
        let mut schema = RecordSchema::new(name);

        for part in body.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (field, kind) = part.split_once(':').ok_or_else(|| {
                CacheError::UnsupportedType(format!("field '{part}' must be written as name:kind"))
            })?;
            let field = field.trim();
            if field.is_empty() {
                return Err(CacheError::UnsupportedType(format!(
                    "field '{part}' has no name"
                )));
            }

            let kind = kind.trim();
            schema = match kind.strip_suffix('?') {
                Some(kind) => schema.optional_field(field, kind.trim().parse()?),
                None => schema.field(field, kind.parse()?),
            };
        }

        if schema.fields.is_empty() {
            return Err(CacheError::UnsupportedType(format!(
                "{name} type needs at least one field"
            )));
        }

        Ok(schema)
    }
}

impl fmt::Display for RecordSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<String> = self
            .fields
            .iter()
            .map(|spec| {
                let marker = if spec.optional { "?" } else { "" };
                format!("{}:{}{marker}", spec.name, spec.kind)
            })
            .collect();
        write!(f, "{}({})", self.name, fields.join(","))
    }
}
