//! Codec Registry Module
//!
//! Maps each object type to the codec that turns values into payload bytes and back.

use serde_json::Value as JsonValue;

use crate::codec::{CacheValue, ObjectType, RecordSchema};
use crate::error::{CacheError, Result};

/// Payload written for `true` by the boolean codec.
pub const TRUE_SENTINEL: &[u8] = b"1";
/// Payload written for `false`; any other payload reads back as `true`.
pub const FALSE_SENTINEL: &[u8] = b"0";

// == Value Codec ==
/// Encodes values of one object type to bytes and decodes them back.
pub trait ValueCodec: Send + Sync {
    fn encode(&self, value: &CacheValue) -> Result<Vec<u8>>;

    fn decode(&self, payload: &[u8]) -> Result<CacheValue>;
}

// == Codec Lookup ==
/// Resolves the codec for an object type.
///
/// Clients call this once at construction and keep the result.
pub fn codec_for(object_type: &ObjectType) -> Box<dyn ValueCodec> {
    match object_type {
        ObjectType::Record(schema) => Box::new(RecordCodec {
            schema: schema.clone(),
        }),
        ObjectType::Bytes => Box::new(BytesCodec),
        ObjectType::Text => Box::new(TextCodec),
        ObjectType::Integer => Box::new(IntegerCodec),
        ObjectType::Float => Box::new(FloatCodec),
        ObjectType::Boolean => Box::new(BooleanCodec),
        ObjectType::List => Box::new(StructuredCodec { map: false }),
        ObjectType::Map => Box::new(StructuredCodec { map: true }),
        ObjectType::Object => Box::new(ObjectCodec),
    }
}

/// Encodes `value` as `object_type`.
pub fn encode(object_type: &ObjectType, value: &CacheValue) -> Result<Vec<u8>> {
    codec_for(object_type).encode(value)
}

/// Decodes `payload` as `object_type`.
pub fn decode(object_type: &ObjectType, payload: &[u8]) -> Result<CacheValue> {
    codec_for(object_type).decode(payload)
}

fn mismatch(expected: &str, value: &CacheValue) -> CacheError {
    CacheError::Encode(format!("expected {expected} value, got {}", value.kind()))
}

fn payload_text<'a>(payload: &'a [u8], what: &str) -> Result<&'a str> {
    std::str::from_utf8(payload)
        .map_err(|e| CacheError::Decode(format!("{what} payload is not UTF-8 text: {e}")))
}

// == Record ==
struct RecordCodec {
    schema: RecordSchema,
}

impl ValueCodec for RecordCodec {
    fn encode(&self, value: &CacheValue) -> Result<Vec<u8>> {
        let normalized = self.schema.validate(value)?;
        serde_json::to_vec(&normalized.to_json()).map_err(|e| CacheError::Encode(e.to_string()))
    }

    fn decode(&self, payload: &[u8]) -> Result<CacheValue> {
        let json: JsonValue = serde_json::from_slice(payload).map_err(|e| {
            CacheError::Validation(format!("{}: invalid JSON: {e}", self.schema.name()))
        })?;
        self.schema.validate(&CacheValue::from(json))
    }
}

// == Bytes ==
struct BytesCodec;

impl ValueCodec for BytesCodec {
    fn encode(&self, value: &CacheValue) -> Result<Vec<u8>> {
        value
            .as_bytes()
            .map(<[u8]>::to_vec)
            .ok_or_else(|| mismatch("bytes", value))
    }

    fn decode(&self, payload: &[u8]) -> Result<CacheValue> {
        Ok(CacheValue::Bytes(payload.to_vec()))
    }
}

// == Text ==
struct TextCodec;

impl ValueCodec for TextCodec {
    fn encode(&self, value: &CacheValue) -> Result<Vec<u8>> {
        value
            .as_text()
            .map(|s| s.as_bytes().to_vec())
            .ok_or_else(|| mismatch("text", value))
    }

    fn decode(&self, payload: &[u8]) -> Result<CacheValue> {
        payload_text(payload, "text").map(CacheValue::from)
    }
}

// == Integer ==
struct IntegerCodec;

impl ValueCodec for IntegerCodec {
    fn encode(&self, value: &CacheValue) -> Result<Vec<u8>> {
        value
            .as_integer()
            .map(|i| i.to_string().into_bytes())
            .ok_or_else(|| mismatch("integer", value))
    }

    fn decode(&self, payload: &[u8]) -> Result<CacheValue> {
        let text = payload_text(payload, "integer")?;
        text.trim()
            .parse::<i64>()
            .map(CacheValue::Integer)
            .map_err(|e| CacheError::Decode(format!("invalid integer '{text}': {e}")))
    }
}

// == Float ==
struct FloatCodec;

impl ValueCodec for FloatCodec {
    fn encode(&self, value: &CacheValue) -> Result<Vec<u8>> {
        value
            .as_float()
            .map(|f| f.to_string().into_bytes())
            .ok_or_else(|| mismatch("float", value))
    }

    fn decode(&self, payload: &[u8]) -> Result<CacheValue> {
        let text = payload_text(payload, "float")?;
        text.trim()
            .parse::<f64>()
            .map(CacheValue::Float)
            .map_err(|e| CacheError::Decode(format!("invalid float '{text}': {e}")))
    }
}

// == Boolean ==
struct BooleanCodec;

impl ValueCodec for BooleanCodec {
    fn encode(&self, value: &CacheValue) -> Result<Vec<u8>> {
        match value.as_bool() {
            Some(true) => Ok(TRUE_SENTINEL.to_vec()),
            Some(false) => Ok(FALSE_SENTINEL.to_vec()),
            None => Err(mismatch("boolean", value)),
        }
    }

    fn decode(&self, payload: &[u8]) -> Result<CacheValue> {
        Ok(CacheValue::Boolean(payload != FALSE_SENTINEL))
    }
}

// == Structured List / Map ==
struct StructuredCodec {
    map: bool,
}

impl StructuredCodec {
    fn expected(&self) -> &'static str {
        if self.map {
            "map"
        } else {
            "list"
        }
    }

    fn accepts(&self, value: &CacheValue) -> bool {
        if self.map {
            matches!(value, CacheValue::Map(_))
        } else {
            matches!(value, CacheValue::List(_))
        }
    }
}

impl ValueCodec for StructuredCodec {
    fn encode(&self, value: &CacheValue) -> Result<Vec<u8>> {
        if !self.accepts(value) {
            return Err(mismatch(self.expected(), value));
        }
        serde_json::to_vec(&value.to_json()).map_err(|e| CacheError::Encode(e.to_string()))
    }

    fn decode(&self, payload: &[u8]) -> Result<CacheValue> {
        let json: JsonValue = serde_json::from_slice(payload)
            .map_err(|e| CacheError::Decode(format!("invalid JSON payload: {e}")))?;
        let value = CacheValue::from(json);
        if !self.accepts(&value) {
            return Err(CacheError::Decode(format!(
                "expected JSON {}, got {}",
                self.expected(),
                value.kind()
            )));
        }
        Ok(value)
    }
}

// == Opaque Object ==
struct ObjectCodec;

impl ValueCodec for ObjectCodec {
    fn encode(&self, value: &CacheValue) -> Result<Vec<u8>> {
        Ok(bincode::serialize(value)?)
    }

    fn decode(&self, payload: &[u8]) -> Result<CacheValue> {
        bincode::deserialize(payload)
            .map_err(|e| CacheError::Decode(format!("invalid object payload: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::FieldKind;

    fn person_type() -> ObjectType {
        ObjectType::Record(
            RecordSchema::new("Person")
                .field("name", FieldKind::Str)
                .field("age", FieldKind::Int),
        )
    }

    fn alice() -> CacheValue {
        [("name", CacheValue::from("Alice")), ("age", 30.into())]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_record_encodes_canonical_json() {
        let bytes = encode(&person_type(), &alice()).unwrap();
        assert_eq!(bytes, br#"{"age":30,"name":"Alice"}"#.to_vec());
        assert_eq!(decode(&person_type(), &bytes).unwrap(), alice());
    }

    #[test]
    fn test_record_decode_validation_error() {
        let result = decode(&person_type(), br#"{"name":"Alice"}"#);
        assert!(matches!(result, Err(CacheError::Validation(_))));

        let result = decode(&person_type(), b"not json");
        assert!(matches!(result, Err(CacheError::Validation(_))));
    }

    #[test]
    fn test_record_encode_validation_error() {
        let result = encode(&person_type(), &CacheValue::from("Alice"));
        assert!(matches!(result, Err(CacheError::Validation(_))));
    }

    #[test]
    fn test_bytes_identity() {
        let bytes = encode(&ObjectType::Bytes, &CacheValue::from(b"some bytes".to_vec())).unwrap();
        assert_eq!(bytes, b"some bytes");
        assert_eq!(
            decode(&ObjectType::Bytes, b"\x00\xff").unwrap(),
            CacheValue::Bytes(vec![0, 255])
        );
    }

    #[test]
    fn test_text_rejects_invalid_utf8() {
        let result = decode(&ObjectType::Text, &[0xff, 0xfe]);
        assert!(matches!(result, Err(CacheError::Decode(_))));
    }

    #[test]
    fn test_integer_payloads() {
        assert_eq!(encode(&ObjectType::Integer, &12345.into()).unwrap(), b"12345");
        assert_eq!(
            decode(&ObjectType::Integer, b" -42\n").unwrap(),
            CacheValue::Integer(-42)
        );
        assert!(matches!(
            decode(&ObjectType::Integer, b"twelve"),
            Err(CacheError::Decode(_))
        ));
    }

    #[test]
    fn test_float_payloads() {
        assert_eq!(encode(&ObjectType::Float, &123.45.into()).unwrap(), b"123.45");
        assert_eq!(decode(&ObjectType::Float, b"7").unwrap(), CacheValue::Float(7.0));
        assert!(matches!(
            decode(&ObjectType::Float, b"1.2.3"),
            Err(CacheError::Decode(_))
        ));
    }

    #[test]
    fn test_boolean_sentinels() {
        assert_eq!(encode(&ObjectType::Boolean, &true.into()).unwrap(), TRUE_SENTINEL);
        assert_eq!(encode(&ObjectType::Boolean, &false.into()).unwrap(), FALSE_SENTINEL);
        assert_eq!(decode(&ObjectType::Boolean, b"0").unwrap(), CacheValue::Boolean(false));
        assert_eq!(decode(&ObjectType::Boolean, b"1").unwrap(), CacheValue::Boolean(true));
        // Anything other than the false sentinel reads as true
        assert_eq!(decode(&ObjectType::Boolean, b"").unwrap(), CacheValue::Boolean(true));
        assert_eq!(decode(&ObjectType::Boolean, b"00").unwrap(), CacheValue::Boolean(true));
    }

    #[test]
    fn test_list_round_trip_and_stringified_leaves() {
        let value = CacheValue::List(vec![
            1.into(),
            "two".into(),
            3.0.into(),
            false.into(),
            [("nested", "dict")].into_iter().collect(),
        ]);
        let bytes = encode(&ObjectType::List, &value).unwrap();
        assert_eq!(decode(&ObjectType::List, &bytes).unwrap(), value);

        let with_bytes = CacheValue::List(vec![CacheValue::Bytes(b"raw".to_vec())]);
        let bytes = encode(&ObjectType::List, &with_bytes).unwrap();
        assert_eq!(bytes, br#"["raw"]"#.to_vec());
    }

    #[test]
    fn test_structured_shape_checks() {
        let map: CacheValue = [("a", 1)].into_iter().collect();
        assert!(matches!(
            encode(&ObjectType::List, &map),
            Err(CacheError::Encode(_))
        ));
        assert!(matches!(
            decode(&ObjectType::Map, b"[1,2]"),
            Err(CacheError::Decode(_))
        ));
    }

    #[test]
    fn test_type_mismatch_on_encode() {
        let result = encode(&ObjectType::Integer, &CacheValue::from("12"));
        assert!(matches!(result, Err(CacheError::Encode(ref m)) if m.contains("integer")));
    }

    #[test]
    fn test_object_preserves_variants() {
        let value = CacheValue::List(vec![
            CacheValue::Bytes(vec![1, 2, 3]),
            CacheValue::Float(f64::INFINITY),
            CacheValue::Integer(1),
            CacheValue::Null,
        ]);
        let bytes = encode(&ObjectType::Object, &value).unwrap();
        assert_eq!(decode(&ObjectType::Object, &bytes).unwrap(), value);
    }

    #[test]
    fn test_object_decode_garbage() {
        let result = decode(&ObjectType::Object, b"\xff\xff\xff\xff");
        assert!(matches!(result, Err(CacheError::Decode(_))));
    }
}
