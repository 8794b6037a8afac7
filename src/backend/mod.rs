//! Backend Module
//!
//! The uniform get/set/delete contract every cache store satisfies, the
//! stores shipped with the crate, and selection of a store from configuration.

mod disk;
pub mod document;
mod entry;
mod lru;
mod memory;
#[cfg(feature = "mongodb")]
mod mongo;
mod redis;

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;
use url::Url;

use crate::config::{CacheConfig, SecretUrl};
use crate::error::{CacheError, Result};

// Re-export public types
pub use disk::DiskBackend;
pub use document::{DocumentBackend, DocumentCollection, DocumentUrl, MemoryCollection};
pub use entry::{current_timestamp, current_timestamp_ms, CacheEntry};
pub use lru::LruTracker;
pub use memory::MemoryBackend;
#[cfg(feature = "mongodb")]
pub use mongo::MongoCollection;
pub use self::redis::RedisBackend;

// == Backend Capability ==
/// Byte-level cache store.
///
/// Keys are physical keys. `ttl` is in seconds; `None` or zero means the
/// entry never expires. Stores without native expiration must delete an
/// expired entry on the `get` that observes it and report it absent.
pub trait CacheBackend: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &'static str;

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Inserts or replaces the value and expiration of `key`.
    fn set(&self, key: &str, value: &[u8], ttl: Option<u64>) -> Result<()>;

    /// Removes `key`; removing an absent key is not an error.
    fn delete(&self, key: &str) -> Result<()>;

    /// Removes every expired entry, returning how many were removed.
    ///
    /// Stores with native expiration have nothing to sweep.
    fn purge_expired(&self) -> Result<usize> {
        Ok(0)
    }
}

// == Backend Location ==
/// Where a cache URL points.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Location {
    Disk(PathBuf),
    Memory(Url),
    Redis,
    Document,
}

impl Location {
    fn detect(url: &SecretUrl) -> Result<Self> {
        let raw = url.expose_secret().trim();
        if raw.is_empty() {
            return Err(CacheError::Configuration("cache_url is empty".to_string()));
        }

        // Document-store URLs may list several hosts, which the URL parser rejects
        if let Some((scheme, _)) = raw.split_once("://") {
            if scheme.to_ascii_lowercase().starts_with("mongo") {
                return Ok(Location::Document);
            }
        }

        let parsed = match Url::parse(raw) {
            // Single letter schemes are Windows drive letters
            Ok(parsed) if parsed.scheme().len() > 1 => parsed,
            Ok(_) | Err(url::ParseError::RelativeUrlWithoutBase) => {
                return Ok(Location::Disk(PathBuf::from(raw)))
            }
            Err(e) => {
                return Err(CacheError::Configuration(format!(
                    "invalid cache url {}: {e}",
                    url.redacted()
                )))
            }
        };

        match parsed.scheme() {
            "file" => parsed.to_file_path().map(Location::Disk).map_err(|()| {
                CacheError::Configuration(format!("invalid file url {}", url.redacted()))
            }),
            "memory" => Ok(Location::Memory(parsed)),
            "redis" | "rediss" | "redis+unix" | "unix" => Ok(Location::Redis),
            scheme => Err(CacheError::Configuration(format!(
                "unsupported cache url scheme '{scheme}'"
            ))),
        }
    }
}

// == Open ==
/// Constructs the backend selected by `config`.
///
/// Without a `cache_url` the local disk store at `cache_dir` is used. A URL
/// selects the store by scheme; plain paths and `file://` URLs select a disk
/// store at that path.
pub fn open(config: &CacheConfig) -> Result<Arc<dyn CacheBackend>> {
    let Some(url) = &config.cache_url else {
        return Ok(Arc::new(DiskBackend::open(&config.cache_dir)?));
    };

    match Location::detect(url)? {
        Location::Disk(path) => Ok(Arc::new(DiskBackend::open(path)?)),
        Location::Memory(parsed) => {
            info!("Initializing in-memory cache");
            Ok(Arc::new(MemoryBackend::from_url(&parsed)?))
        }
        Location::Redis => Ok(Arc::new(RedisBackend::open(url)?)),
        Location::Document => open_document(url),
    }
}

#[cfg(feature = "mongodb")]
fn open_document(url: &SecretUrl) -> Result<Arc<dyn CacheBackend>> {
    let target = DocumentUrl::parse(url)?;
    let collection = MongoCollection::connect(url, &target)?;
    Ok(Arc::new(DocumentBackend::new(collection)?))
}

#[cfg(not(feature = "mongodb"))]
fn open_document(url: &SecretUrl) -> Result<Arc<dyn CacheBackend>> {
    DocumentUrl::parse(url)?;
    Err(CacheError::Configuration(format!(
        "document store url {} requires the `mongodb` feature",
        url.redacted()
    )))
}
