//! Freshness-checked key/value storage.
//!
//! The estimation pipeline never reaches for storage on its own; a
//! [`Cache`] is handed in, so the host picks the medium. [`FileCache`]
//! keeps one file per key and reads freshness off the file's modification
//! time, the same scheme as a caching proxy that parks a feed at
//! `/tmp/cache.data.json` and compares its mtime against a refresh window.
//! [`MemoryCache`] is the in-process equivalent, and what tests inject.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};

use crate::Error;

/// A stored value and when it was stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub stored_at: DateTime<Utc>,
    pub value: String,
}

impl Entry {
    /// How long ago this entry was stored.
    pub fn age(&self) -> Duration {
        Utc::now() - self.stored_at
    }

    /// True while the entry is no older than `limit`.
    pub fn is_fresh(&self, limit: Duration) -> bool {
        self.age() <= limit
    }
}

/// Keyed storage with store timestamps.
pub trait Cache {
    /// The entry stored under `key`, if there is one.
    fn load(&self, key: &str) -> Option<Entry>;

    /// Store `value` under `key`, stamped with the current time.
    fn store(&mut self, key: &str, value: &str) -> Result<(), Error>;
}

/// In-memory cache: a per-process store, and the test double.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: HashMap<String, Entry>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put a pre-built entry in place, keeping its timestamp. Lets a host
    /// restore saved state, and lets tests plant stale entries.
    pub fn insert(&mut self, key: &str, entry: Entry) {
        self.entries.insert(key.to_string(), entry);
    }
}

impl Cache for MemoryCache {
    fn load(&self, key: &str) -> Option<Entry> {
        self.entries.get(key).cloned()
    }

    fn store(&mut self, key: &str, value: &str) -> Result<(), Error> {
        self.insert(
            key,
            Entry {
                stored_at: Utc::now(),
                value: value.to_string(),
            },
        );
        Ok(())
    }
}

/// One file per key under a directory, timestamped by file modification
/// time.
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    /// Cache under `dir`. The directory is created on first store.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileCache { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("cache.{key}.json"))
    }
}

impl Cache for FileCache {
    fn load(&self, key: &str) -> Option<Entry> {
        let path = self.path_for(key);
        let value = fs::read_to_string(&path).ok()?;
        let modified = fs::metadata(&path).ok()?.modified().ok()?;
        Some(Entry {
            stored_at: DateTime::from(modified),
            value,
        })
    }

    fn store(&mut self, key: &str, value: &str) -> Result<(), Error> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path_for(key), value)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_freshness_window() {
        let entry = Entry {
            stored_at: Utc::now() - Duration::minutes(10),
            value: "x".to_string(),
        };
        assert!(entry.is_fresh(Duration::minutes(60)));
        assert!(!entry.is_fresh(Duration::minutes(5)));
        assert!(entry.age() >= Duration::minutes(10));
    }

    #[test]
    fn memory_round_trip() {
        let mut cache = MemoryCache::new();
        assert_eq!(cache.load("sensors"), None);

        cache.store("sensors", "[1, 2, 3]").expect("store");
        let entry = cache.load("sensors").expect("entry should exist");
        assert_eq!(entry.value, "[1, 2, 3]");
        assert!(entry.is_fresh(Duration::seconds(30)));

        // Keys don't collide.
        assert_eq!(cache.load("readings"), None);
    }

    #[test]
    fn memory_store_replaces() {
        let mut cache = MemoryCache::new();
        cache.store("k", "old").expect("store");
        cache.store("k", "new").expect("store");
        assert_eq!(cache.load("k").expect("entry").value, "new");
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut cache = FileCache::new(dir.path());
        assert_eq!(cache.load("sensors"), None);

        cache.store("sensors", "{\"fields\":[]}").expect("store");
        let entry = cache.load("sensors").expect("entry should exist");
        assert_eq!(entry.value, "{\"fields\":[]}");
        // The mtime timestamp is from just now.
        assert!(entry.is_fresh(Duration::minutes(1)));
    }

    #[test]
    fn file_cache_creates_its_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut cache = FileCache::new(dir.path().join("nested").join("deeper"));
        cache.store("k", "v").expect("store");
        assert_eq!(cache.load("k").expect("entry").value, "v");
    }
}
