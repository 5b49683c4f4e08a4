//! Memoized dataset loads keyed by source identity.
//!
//! Owned by the dashboard context and used from a single thread, so the API
//! takes `&mut self` and holds no locks.

use crate::error::{LoadError, LoadResult};
use crate::loader::load_csv;
use crate::models::Dataset;
use crate::utils::Timer;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, info};

/// Identity of a source file: path plus the stamps that change when it is rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceKey {
    path: PathBuf,
    modified: Option<SystemTime>,
    len: u64,
}

impl SourceKey {
    pub fn for_path(path: &Path) -> LoadResult<Self> {
        let open_err = |source| LoadError::Open {
            path: path.to_path_buf(),
            source,
        };
        let meta = std::fs::metadata(path).map_err(open_err)?;
        let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        Ok(Self {
            path,
            modified: meta.modified().ok(),
            len: meta.len(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[derive(Debug, Default)]
pub struct DatasetCache {
    entries: HashMap<SourceKey, Arc<Dataset>>,
    hits: u64,
    misses: u64,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached dataset for `path`, loading it on first use.
    ///
    /// When the file has changed since it was cached, the whole cache is dropped
    /// before the reload.
    pub fn get_or_load(&mut self, path: &Path) -> LoadResult<Arc<Dataset>> {
        let key = SourceKey::for_path(path)?;

        if let Some(dataset) = self.entries.get(&key) {
            self.hits += 1;
            debug!("Cache hit for {:?}", key.path());
            return Ok(Arc::clone(dataset));
        }

        self.misses += 1;
        if self.entries.keys().any(|k| k.path() == key.path()) {
            info!("{:?} changed on disk, dropping {} cached dataset(s)", key.path(), self.entries.len());
            self.entries.clear();
        }

        let _t = Timer::start(format!("Loading {}", path.display()));
        let dataset = Arc::new(load_csv(path)?);
        self.entries.insert(key, Arc::clone(&dataset));
        Ok(dataset)
    }

    /// Forget everything; the next request reloads from disk.
    pub fn invalidate(&mut self) {
        if !self.entries.is_empty() {
            info!("Invalidating {} cached dataset(s)", self.entries.len());
        }
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HEADER: &str = "RegionName,Date,AveragePrice,12m%Change\n";

    fn write_csv(rows: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(HEADER.as_bytes()).unwrap();
        file.write_all(rows.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_second_load_is_a_hit() {
        let file = write_csv("London,01/01/2024,500000,1.0\n");
        let mut cache = DatasetCache::new();

        let first = cache.get_or_load(file.path()).unwrap();
        let second = cache.get_or_load(file.path()).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!((cache.hits(), cache.misses()), (1, 1));
    }

    #[test]
    fn test_invalidate_forces_reload() {
        let file = write_csv("London,01/01/2024,500000,1.0\n");
        let mut cache = DatasetCache::new();

        let first = cache.get_or_load(file.path()).unwrap();
        cache.invalidate();
        assert!(cache.is_empty());
        let second = cache.get_or_load(file.path()).unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(cache.misses(), 2);
    }

    #[test]
    fn test_changed_source_replaces_entry() {
        let mut file = write_csv("London,01/01/2024,500000,1.0\n");
        let mut cache = DatasetCache::new();
        assert_eq!(cache.get_or_load(file.path()).unwrap().len(), 1);

        file.write_all(b"London,01/02/2024,510000,1.2\n").unwrap();
        file.flush().unwrap();

        assert_eq!(cache.get_or_load(file.path()).unwrap().len(), 2);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_missing_file_is_load_error() {
        let mut cache = DatasetCache::new();
        let err = cache.get_or_load(Path::new("no/such/file.csv")).unwrap_err();
        assert!(matches!(err, LoadError::Open { .. }));
        assert!(cache.is_empty());
    }
}
