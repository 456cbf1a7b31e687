//! Testing utilities for trf
//!
//! Helpers for writing tests: a `TestCache` wrapper around a cache living in
//! a temporary directory, and `LogDir` for creating fixture files with
//! controlled modification times.
//!
//! Only available when compiled with `cfg(test)`.

use crate::cache::{Cache, CacheMode, Store};
use crate::output::BufferedReporter;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tempfile::TempDir;

/// Cache in a temporary directory, without a background janitor
///
/// Tests can write synthetic entries without the janitor evicting them. The
/// directory is removed when the wrapper is dropped.
pub struct TestCache {
    cache: Cache,
    store: Store,
    reporter: BufferedReporter,
    _dir: TempDir,
}

impl TestCache {
    /// # Panics
    /// Panics if the temporary directory or the store cannot be created.
    pub fn new(mode: CacheMode) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create cache directory");
        let store = Store::open(dir.path().join("cache")).expect("Failed to open test store");
        let reporter = BufferedReporter::new();
        let cache = Cache::from_store(store.clone(), mode, Arc::new(reporter.clone()));

        Self {
            cache,
            store,
            reporter,
            _dir: dir,
        }
    }

    #[must_use]
    pub const fn cache(&self) -> &Cache {
        &self.cache
    }

    /// Direct handle on the underlying store
    #[must_use]
    pub const fn store(&self) -> &Store {
        &self.store
    }

    #[must_use]
    pub const fn reporter(&self) -> &BufferedReporter {
        &self.reporter
    }
}

/// Temporary directory of fixture files
pub struct LogDir {
    dir: TempDir,
}

impl LogDir {
    /// # Panics
    /// Panics if the temporary directory cannot be created.
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("Failed to create log directory"),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `content` to `name` inside the directory and return its path
    ///
    /// # Panics
    /// Panics if the file cannot be written.
    pub fn file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, content).expect("Failed to write fixture");
        path
    }

    /// Like [`file`](Self::file), then pin the modification time
    ///
    /// # Panics
    /// Panics if the file cannot be written or its time cannot be set.
    pub fn file_modified_at(&self, name: &str, content: &str, modified: SystemTime) -> PathBuf {
        let path = self.file(name, content);
        set_modified(&path, modified);
        path
    }
}

/// Set the modification time of `path`
///
/// # Panics
/// Panics if the file cannot be opened or its time cannot be set.
pub fn set_modified(path: &Path, modified: SystemTime) {
    fs::File::options()
        .write(true)
        .open(path)
        .and_then(|f| f.set_modified(modified))
        .expect("Failed to set modification time");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_cache_basic() {
        let test_cache = TestCache::new(CacheMode::ReadWrite);
        assert!(test_cache.cache().is_open());
        assert_eq!(test_cache.store().count(), 0);
        assert!(test_cache.reporter().messages().is_empty());
    }

    #[test]
    fn test_log_dir_cleanup() {
        let path = {
            let logs = LogDir::new();
            logs.file("a.log", "content");
            logs.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn test_file_modified_at() {
        let logs = LogDir::new();
        let when = SystemTime::UNIX_EPOCH + Duration::from_secs(1_600_000_000);
        let path = logs.file_modified_at("a.log", "content", when);

        assert_eq!(fs::read_to_string(&path).unwrap(), "content");
        assert_eq!(fs::metadata(&path).unwrap().modified().unwrap(), when);
    }
}
