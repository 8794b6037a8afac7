//! Typecache - A typed caching facade
//!
//! Stores values of one declared type under namespaced keys, with a default
//! expiration policy, on local disk, in memory, in Redis or in a document
//! store.

pub mod backend;
pub mod cache;
pub mod codec;
pub mod config;
pub mod error;
pub mod key;

pub use backend::CacheBackend;
pub use cache::{Cache, CacheStats};
pub use codec::{CacheValue, FieldKind, ObjectType, RecordSchema};
pub use config::{CacheConfig, SecretUrl, TtlPolicy};
pub use error::{CacheError, Result};
