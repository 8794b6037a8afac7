//! Disk Backend Module
//!
//! Local cache store keeping one file per key under a directory.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::backend::{CacheBackend, CacheEntry};
use crate::error::{CacheError, Result};

/// Extension of entry files inside the cache directory.
const ENTRY_EXTENSION: &str = "entry";

/// On-disk layout of one entry file.
#[derive(Debug, Serialize, Deserialize)]
struct DiskRecord {
    key: String,
    entry: CacheEntry,
}

// == Disk Backend ==
/// Cache store persisting entries as files.
///
/// File names are the SHA-256 of the physical key, and each file also records
/// the key itself. Writes go through a temporary file renamed into place, so
/// readers never observe a partial entry. Expiration is enforced lazily.
#[derive(Debug)]
pub struct DiskBackend {
    dir: PathBuf,
    /// Serializes file replacement and removal within the process
    writes: Mutex<()>,
}

impl DiskBackend {
    /// Opens the store, creating the directory if needed.
    ///
    /// The directory is resolved to an absolute path once, so later changes of
    /// the working directory do not move the store.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        fs::create_dir_all(dir.as_ref())?;
        let dir = fs::canonicalize(dir.as_ref())?;
        info!("Initializing local cache in {}", dir.display());
        Ok(Self {
            dir,
            writes: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        let digest = Sha256::digest(key.as_bytes());
        self.dir
            .join(format!("{}.{ENTRY_EXTENSION}", hex::encode(digest)))
    }

    fn read_record(path: &Path) -> Result<Option<DiskRecord>> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        bincode::deserialize(&bytes).map(Some).map_err(|e| {
            CacheError::backend("disk", format!("corrupt entry {}: {e}", path.display()))
        })
    }

    /// Removes the entry at `path` if it still holds an expired record for
    /// `key`, returning the value of a record written since the expiry was seen.
    fn evict_expired(&self, path: &Path, key: &str) -> Result<Option<Vec<u8>>> {
        let _writes = self.writes.lock();
        match Self::read_record(path)? {
            Some(record) if record.key != key => Ok(None),
            Some(record) if !record.entry.is_expired() => Ok(Some(record.entry.value)),
            Some(_) => {
                Self::remove_file(path)?;
                debug!("Evicted expired entry '{}'", key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn remove_file(path: &Path) -> Result<()> {
        match fs::remove_file(path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

impl CacheBackend for DiskBackend {
    fn name(&self) -> &'static str {
        "disk"
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.entry_path(key);
        let Some(record) = Self::read_record(&path)? else {
            return Ok(None);
        };

        if record.key != key {
            warn!("Digest collision on '{}', treating as a miss", key);
            return Ok(None);
        }
        if record.entry.is_expired() {
            return self.evict_expired(&path, key);
        }

        Ok(Some(record.entry.value))
    }

    fn set(&self, key: &str, value: &[u8], ttl: Option<u64>) -> Result<()> {
        let record = DiskRecord {
            key: key.to_string(),
            entry: CacheEntry::new(value.to_vec(), ttl),
        };
        let bytes = bincode::serialize(&record)?;

        let mut file = NamedTempFile::new_in(&self.dir)?;
        file.write_all(&bytes)?;

        let _writes = self.writes.lock();
        file.persist(self.entry_path(key)).map_err(|e| e.error)?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let _writes = self.writes.lock();
        Self::remove_file(&self.entry_path(key))
    }

    fn purge_expired(&self) -> Result<usize> {
        let _writes = self.writes.lock();
        let mut removed = 0;
        for dir_entry in fs::read_dir(&self.dir)? {
            let path = dir_entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(ENTRY_EXTENSION) {
                continue;
            }

            if let Some(record) = Self::read_record(&path)? {
                if record.entry.is_expired() {
                    Self::remove_file(&path)?;
                    removed += 1;
                }
            }
        }

        if removed > 0 {
            info!("Purged {} expired entries from {}", removed, self.dir.display());
        }
        Ok(removed)
    }
}
