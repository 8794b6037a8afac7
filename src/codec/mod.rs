//! Codec Module
//!
//! Type-driven serialization: a declared object type selects how values are
//! encoded to payload bytes and decoded back.

mod object_type;
mod registry;
mod schema;
mod value;


// Re-export public types
pub use object_type::ObjectType;
pub use registry::{codec_for, decode, encode, ValueCodec, FALSE_SENTINEL, TRUE_SENTINEL};
pub use schema::{FieldKind, FieldSpec, RecordSchema};
pub use value::CacheValue;
