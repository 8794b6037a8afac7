//! Redis Backend Module
//!
//! Remote key-value store with native expiration, over the `redis` driver.

use parking_lot::Mutex;
use redis::{Client, Commands, Connection, RedisError, RedisResult};
use tracing::debug;

use crate::backend::CacheBackend;
use crate::config::SecretUrl;
use crate::error::{CacheError, Result};

// == Redis Backend ==
/// Cache store backed by a Redis server.
///
/// The connection is opened on first use and kept for the lifetime of the
/// backend. A dropped connection is reopened by the next call; failed calls
/// are not retried.
pub struct RedisBackend {
    client: Client,
    connection: Mutex<Option<Connection>>,
}

impl RedisBackend {
    /// Creates the backend from a `redis://` style URL without connecting.
    pub fn open(url: &SecretUrl) -> Result<Self> {
        let client = Client::open(url.expose_secret()).map_err(|e| {
            CacheError::Configuration(format!("invalid redis url {}: {e}", url.redacted()))
        })?;
        debug!("Initializing remote cache from {}", url.redacted());

        Ok(Self {
            client,
            connection: Mutex::new(None),
        })
    }

    fn with_connection<T>(&self, op: impl FnOnce(&mut Connection) -> RedisResult<T>) -> Result<T> {
        let mut guard = self.connection.lock();
        let mut conn = match guard.take() {
            Some(conn) => conn,
            None => self.client.get_connection().map_err(redis_error)?,
        };

        match op(&mut conn) {
            // Broken connections are not put back
            Err(e) if e.is_connection_dropped() || e.is_io_error() => Err(redis_error(e)),
            result => {
                *guard = Some(conn);
                result.map_err(redis_error)
            }
        }
    }
}

fn redis_error(err: RedisError) -> CacheError {
    CacheError::backend("redis", err)
}

impl CacheBackend for RedisBackend {
    fn name(&self) -> &'static str {
        "redis"
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.with_connection(|conn| conn.get::<_, Option<Vec<u8>>>(key))
    }

    fn set(&self, key: &str, value: &[u8], ttl: Option<u64>) -> Result<()> {
        self.with_connection(|conn| match ttl.filter(|t| *t > 0) {
            Some(seconds) => conn.set_ex::<_, _, ()>(key, value, seconds),
            None => conn.set::<_, _, ()>(key, value),
        })
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.with_connection(|conn| conn.del::<_, ()>(key))
    }
}
