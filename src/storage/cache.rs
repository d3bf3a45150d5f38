//! Content cache keyed by page fingerprint.
//!
//! Pages are identified by a hash of their decoded text, not by URL, so
//! mirrors and re-published sections share one entry. Entries are never
//! invalidated: changed content simply produces a new fingerprint.
//!
//! ## Disk Layout
//!
//! ```text
//! {cache_dir}/
//! ├── 3f1c0e...a9.json      # CacheEntry for one fingerprint
//! └── 8b22d4...07.json
//! ```

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{AppError, Result};
use crate::models::CourseRecord;

/// 128-bit content hash of a page's decoded text, hex encoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Fingerprint a page's text.
    pub fn of(text: &str) -> Self {
        let digest = Sha256::digest(text.as_bytes());
        Self(hex::encode(&digest[..16]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Records previously extracted from one fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub fingerprint: Fingerprint,
    pub records: Vec<CourseRecord>,
}

/// Fingerprint → records store shared by crawl workers.
///
/// Implementations must tolerate concurrent calls for the same fingerprint;
/// storing an already present fingerprint is a no-op.
pub trait ContentCache: Send + Sync {
    /// Look up a fingerprint. `Ok(None)` is a miss.
    fn lookup(&self, fingerprint: &Fingerprint) -> Result<Option<CacheEntry>>;

    /// Store records for a fingerprint unless a readable entry already exists.
    fn store(&self, fingerprint: &Fingerprint, records: &[CourseRecord]) -> Result<()>;

    /// Number of stored entries.
    fn len(&self) -> Result<usize>;

    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

/// Durable cache with one JSON file per fingerprint.
pub struct DiskCache {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl DiskCache {
    /// Open (creating if needed) a cache directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, fingerprint: &Fingerprint) -> PathBuf {
        self.dir.join(format!("{}.json", fingerprint))
    }
}

impl ContentCache for DiskCache {
    fn lookup(&self, fingerprint: &Fingerprint) -> Result<Option<CacheEntry>> {
        let path = self.path(fingerprint);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(AppError::cache(fingerprint.as_str(), e)),
        };

        let entry: CacheEntry = serde_json::from_slice(&bytes)
            .map_err(|e| AppError::cache(fingerprint.as_str(), e))?;
        if entry.fingerprint != *fingerprint {
            return Err(AppError::cache(
                fingerprint.as_str(),
                format!("entry holds fingerprint {}", entry.fingerprint),
            ));
        }
        Ok(Some(entry))
    }

    fn store(&self, fingerprint: &Fingerprint, records: &[CourseRecord]) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|e| AppError::cache(fingerprint.as_str(), e))?;

        match self.lookup(fingerprint) {
            Ok(Some(_)) => return Ok(()),
            Ok(None) => {}
            Err(e) => log::warn!("Replacing unreadable cache entry: {}", e),
        }
        let path = self.path(fingerprint);

        let entry = CacheEntry {
            fingerprint: fingerprint.clone(),
            records: records.to_vec(),
        };
        let bytes = serde_json::to_vec(&entry)?;

        // Write to temp, then rename, so readers never see a partial entry.
        let tmp = path.with_extension("json.tmp");
        let write = || -> std::io::Result<()> {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
            fs::rename(&tmp, &path)
        };
        write().map_err(|e| {
            let _ = fs::remove_file(&tmp);
            AppError::cache(fingerprint.as_str(), e)
        })?;

        log::debug!("Cached {} record(s) under {}", records.len(), fingerprint);
        Ok(())
    }

    fn len(&self) -> Result<usize> {
        let mut count = 0;
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                count += 1;
            }
        }
        Ok(count)
    }
}

/// In-process cache. Used when the durable cache is disabled and in tests.
#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<Fingerprint, Arc<CacheEntry>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ContentCache for MemoryCache {
    fn lookup(&self, fingerprint: &Fingerprint) -> Result<Option<CacheEntry>> {
        let entries = self
            .entries
            .read()
            .map_err(|e| AppError::cache(fingerprint.as_str(), e))?;
        Ok(entries.get(fingerprint).map(|entry| entry.as_ref().clone()))
    }

    fn store(&self, fingerprint: &Fingerprint, records: &[CourseRecord]) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| AppError::cache(fingerprint.as_str(), e))?;
        entries.entry(fingerprint.clone()).or_insert_with(|| {
            Arc::new(CacheEntry {
                fingerprint: fingerprint.clone(),
                records: records.to_vec(),
            })
        });
        Ok(())
    }

    fn len(&self) -> Result<usize> {
        let entries = self
            .entries
            .read()
            .map_err(|e| AppError::cache("*", e))?;
        Ok(entries.len())
    }
}
