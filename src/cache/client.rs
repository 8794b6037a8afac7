//! Cache Client Module
//!
//! The typed cache facade: key namespacing, codec dispatch and TTL policy over
//! a lazily opened backend.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::debug;

use crate::backend::{self, CacheBackend};
use crate::cache::stats::{CacheStats, StatsRecorder};
use crate::codec::{codec_for, CacheValue, ObjectType, ValueCodec};
use crate::config::{CacheConfig, WritePlan};
use crate::error::{CacheError, Result};
use crate::key::physical_key;

// == Cache ==
/// Cache client for values of one declared object type.
///
/// The codec is chosen when the client is built. The backend is opened on
/// first use and kept until the client is dropped; configuration errors
/// therefore surface on the first `get`, `set` or `delete`.
///
/// # Example
/// ```no_run
/// use typecache::{Cache, CacheConfig, CacheValue, ObjectType};
///
/// let cache = Cache::new(CacheConfig::new(ObjectType::Text).with_prefix("myapp"));
/// cache.set("greeting", &CacheValue::from("Hello, World!"), None)?;
/// assert_eq!(cache.get("greeting")?, Some(CacheValue::from("Hello, World!")));
/// # Ok::<(), typecache::CacheError>(())
/// ```
pub struct Cache {
    config: CacheConfig,
    codec: Box<dyn ValueCodec>,
    backend: OnceCell<Arc<dyn CacheBackend>>,
    stats: StatsRecorder,
}

impl Cache {
    // == Constructors ==
    /// Creates a client; the backend is selected from `config` on first use.
    ///
    /// A relative `cache_dir` is resolved against the working directory now.
    pub fn new(config: CacheConfig) -> Self {
        Self::with_cell(config, OnceCell::new())
    }

    /// Creates a client over an already constructed backend.
    ///
    /// Several clients may share one backend; their prefixes keep them apart.
    pub fn with_backend(config: CacheConfig, backend: Arc<dyn CacheBackend>) -> Self {
        Self::with_cell(config, OnceCell::with_value(backend))
    }

    /// Builds a client from environment variables, see [`CacheConfig::from_env`].
    pub fn from_env() -> Result<Self> {
        CacheConfig::from_env().map(Self::new)
    }

    fn with_cell(config: CacheConfig, backend: OnceCell<Arc<dyn CacheBackend>>) -> Self {
        let config = config.with_absolute_dir();
        Self {
            codec: codec_for(&config.object_type),
            config,
            backend,
            stats: StatsRecorder::default(),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn object_type(&self) -> &ObjectType {
        &self.config.object_type
    }

    // == Backend ==
    /// Returns the backend, opening it on first call.
    ///
    /// Concurrent first calls construct the backend once.
    pub fn backend(&self) -> Result<&Arc<dyn CacheBackend>> {
        self.backend.get_or_try_init(|| backend::open(&self.config))
    }

    /// Physical key used for `key`. Diagnostic only; all operations take logical keys.
    pub fn cache_key(&self, key: &str) -> String {
        physical_key(key, &self.config.cache_prefix)
    }

    // == Get ==
    /// Reads and decodes the value stored under `key`.
    ///
    /// Returns `Ok(None)` when the key was never written, was deleted, or has expired.
    pub fn get(&self, key: &str) -> Result<Option<CacheValue>> {
        let physical = self.cache_key(key);
        debug!("Getting cache for '{}'", physical);

        let Some(payload) = self.backend()?.get(&physical)? else {
            self.stats.record_miss();
            return Ok(None);
        };

        self.stats.record_hit();
        self.codec.decode(&payload).map(Some)
    }

    // == Get Or Fail ==
    /// Like [`Cache::get`], failing with [`CacheError::NotFound`] when absent.
    pub fn get_or_fail(&self, key: &str) -> Result<CacheValue> {
        self.get(key)?
            .ok_or_else(|| CacheError::NotFound(key.to_string()))
    }

    // == Set ==
    /// Encodes and stores `value` under `key`.
    ///
    /// `ex` overrides the configured TTL in seconds. Nothing is written when
    /// caching is disabled (`cache_ttl == 0`) or when `ex` is zero.
    pub fn set(&self, key: &str, value: &CacheValue, ex: Option<u64>) -> Result<()> {
        let physical = self.cache_key(key);

        let WritePlan::Write { ttl } = self.config.cache_ttl.resolve(ex) else {
            debug!("Caching disabled, skipping '{}'", physical);
            self.stats.record_skipped_write();
            return Ok(());
        };

        let payload = self.codec.encode(value)?;
        debug!("Setting cache for '{}' with TTL {:?}", physical, ttl);
        self.backend()?.set(&physical, &payload, ttl)?;
        self.stats.record_write();
        Ok(())
    }

    // == Delete ==
    /// Removes `key`; deleting an absent key succeeds.
    pub fn delete(&self, key: &str) -> Result<()> {
        let physical = self.cache_key(key);
        debug!("Deleting cache for '{}'", physical);

        self.backend()?.delete(&physical)?;
        self.stats.record_delete();
        Ok(())
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot()
    }
}

impl fmt::Debug for Cache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("config", &self.config)
            .field(
                "backend",
                &self.backend.get().map(|backend| backend.name()),
            )
            .finish_non_exhaustive()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;

    fn memory_cache(config: CacheConfig) -> (Arc<MemoryBackend>, Cache) {
        let backend = Arc::new(MemoryBackend::new());
        let cache = Cache::with_backend(config, backend.clone());
        (backend, cache)
    }

    #[test]
    fn test_new_does_not_open_backend() {
        let config = CacheConfig::new(ObjectType::Text).with_url("ftp://nowhere");
        let cache = Cache::new(config);

        // The bad URL only surfaces on first use
        assert!(matches!(
            cache.get("key"),
            Err(CacheError::Configuration(_))
        ));
        assert!(matches!(
            cache.set("key", &"value".into(), None),
            Err(CacheError::Configuration(_))
        ));
    }

    #[test]
    fn test_get_missing_returns_none() {
        let (_backend, cache) = memory_cache(CacheConfig::new(ObjectType::Text));

        assert_eq!(cache.get("nonexistent").unwrap(), None);
        assert!(matches!(
            cache.get_or_fail("nonexistent"),
            Err(CacheError::NotFound(ref key)) if key == "nonexistent"
        ));
    }

    #[test]
    fn test_set_and_get_with_prefix() {
        let (backend, cache) =
            memory_cache(CacheConfig::new(ObjectType::Text).with_prefix("myapp"));

        cache.set("key", &"value".into(), None).unwrap();

        assert_eq!(cache.cache_key("key"), "myapp:key");
        assert_eq!(backend.get("myapp:key").unwrap(), Some(b"value".to_vec()));
        assert_eq!(backend.get("key").unwrap(), None);
        assert_eq!(cache.get_or_fail("key").unwrap(), CacheValue::from("value"));
    }

    #[test]
    fn test_disabled_cache_skips_writes() {
        let (backend, cache) = memory_cache(CacheConfig::new(ObjectType::Text).with_ttl(0));

        cache.set("disabled", &"value".into(), None).unwrap();
        cache.set("disabled", &"value".into(), Some(300)).unwrap();

        assert!(backend.is_empty());
        assert_eq!(cache.get("disabled").unwrap(), None);
        assert_eq!(cache.stats().skipped_writes, 2);
    }

    #[test]
    fn test_disabled_cache_does_not_delete_existing_entry() {
        let backend = Arc::new(MemoryBackend::new());
        let writer = Cache::with_backend(CacheConfig::new(ObjectType::Text), backend.clone());
        let disabled = Cache::with_backend(CacheConfig::new(ObjectType::Text).with_ttl(0), backend);

        writer.set("key", &"old".into(), None).unwrap();
        disabled.set("key", &"new".into(), None).unwrap();

        assert_eq!(disabled.get("key").unwrap(), Some("old".into()));
    }

    #[test]
    fn test_zero_per_call_ttl_skips_write() {
        let (backend, cache) = memory_cache(CacheConfig::new(ObjectType::Integer));

        cache.set("n", &1.into(), Some(0)).unwrap();
        assert!(backend.is_empty());
    }

    #[test]
    fn test_encode_error_writes_nothing() {
        let (backend, cache) = memory_cache(CacheConfig::new(ObjectType::Integer));

        let result = cache.set("n", &"twelve".into(), None);
        assert!(matches!(result, Err(CacheError::Encode(_))));
        assert!(backend.is_empty());
    }

    #[test]
    fn test_decode_error_propagates() {
        let (backend, cache) = memory_cache(CacheConfig::new(ObjectType::Integer));

        backend.set("n", b"not a number", None).unwrap();
        assert!(matches!(cache.get("n"), Err(CacheError::Decode(_))));
    }

    #[test]
    fn test_delete() {
        let (_backend, cache) = memory_cache(CacheConfig::new(ObjectType::Boolean));

        cache.set("flag", &false.into(), None).unwrap();
        assert_eq!(cache.get("flag").unwrap(), Some(CacheValue::Boolean(false)));

        cache.delete("flag").unwrap();
        cache.delete("flag").unwrap();
        assert_eq!(cache.get("flag").unwrap(), None);
    }

    #[test]
    fn test_stats_track_operations() {
        let (_backend, cache) = memory_cache(CacheConfig::new(ObjectType::Text));

        cache.set("a", &"1".into(), None).unwrap();
        cache.get("a").unwrap();
        cache.get("b").unwrap();
        cache.delete("a").unwrap();

        let stats = cache.stats();
        assert_eq!(stats.writes, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.deletes, 1);
    }

    #[test]
    fn test_backend_is_opened_once() {
        let dir = tempfile::TempDir::new().unwrap();
        let cache = Cache::new(CacheConfig::default().with_dir(dir.path()));

        let first = Arc::clone(cache.backend().unwrap());
        let second = Arc::clone(cache.backend().unwrap());
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_concurrent_first_use() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = CacheConfig::new(ObjectType::Integer).with_dir(dir.path());
        let cache = Arc::new(Cache::new(config));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || cache.set(&format!("n{i}"), &i.into(), None))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap().unwrap();
        }

        for i in 0..8 {
            assert_eq!(cache.get(&format!("n{i}")).unwrap(), Some(CacheValue::Integer(i)));
        }
    }

    #[test]
    fn test_new_resolves_cache_dir() {
        let cache = Cache::new(CacheConfig::default());

        assert!(cache.config().cache_dir.is_absolute());
        assert_eq!(
            cache.config().cache_dir,
            std::env::current_dir().unwrap().join(crate::config::DEFAULT_CACHE_DIR)
        );
    }

    #[test]
    fn test_debug_hides_secret() {
        let cache = Cache::new(CacheConfig::default().with_url("redis://:hunter2@localhost:6379"));
        assert!(!format!("{cache:?}").contains("hunter2"));
    }
}
