//! Persistent time range cache
//!
//! Remembers the time range extracted from each file, keyed by absolute path
//! and tied to the file's modification time. An entry whose modification
//! time no longer matches the file is treated as absent; the caller
//! recomputes the range and overwrites it.
//!
//! Caching is an optimization only. Failing to open the store, or any store
//! error later on, is reported and the cache behaves as if it were empty.
//!
//! While the store is open a [`Janitor`] sweeps it in the background,
//! evicting entries for files that were removed or changed between runs.

pub mod error;
pub mod janitor;
pub mod store;
pub mod types;

pub use error::CacheError;
pub use janitor::Janitor;
pub use store::Store;
pub use types::CacheEntry;

use crate::output::Reporter;
use crate::time_range::TimeRange;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::SystemTime;

/// Which cache operations are enabled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CacheMode {
    /// Neither read nor write; the store is never opened
    Off,
    Read,
    Write,
    #[default]
    ReadWrite,
}

impl CacheMode {
    #[must_use]
    pub const fn reads(self) -> bool {
        matches!(self, Self::Read | Self::ReadWrite)
    }

    #[must_use]
    pub const fn writes(self) -> bool {
        matches!(self, Self::Write | Self::ReadWrite)
    }
}

impl FromStr for CacheMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "off" => Ok(Self::Off),
            "r" => Ok(Self::Read),
            "w" => Ok(Self::Write),
            "rw" => Ok(Self::ReadWrite),
            other => Err(format!("invalid cache mode '{other}' (expected one of '', r, w, rw)")),
        }
    }
}

impl TryFrom<String> for CacheMode {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CacheMode> for String {
    fn from(mode: CacheMode) -> Self {
        mode.to_string()
    }
}

impl fmt::Display for CacheMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Off => f.write_str(""),
            Self::Read => f.write_str("r"),
            Self::Write => f.write_str("w"),
            Self::ReadWrite => f.write_str("rw"),
        }
    }
}

/// Time range cache with its background janitor
pub struct Cache {
    store: Option<Store>,
    janitor: Option<Janitor>,
    mode: CacheMode,
    reporter: Arc<dyn Reporter>,
}

impl Cache {
    /// Open the cache stored at `path`
    ///
    /// Never fails: when the mode is [`CacheMode::Off`] nothing is opened, and
    /// when opening fails the error is reported and a no-op cache returned.
    pub fn open<P: AsRef<Path>>(path: P, mode: CacheMode, reporter: Arc<dyn Reporter>) -> Self {
        let path = path.as_ref();
        if mode == CacheMode::Off {
            return Self::disabled(reporter);
        }

        let store = match Store::open(path) {
            Ok(store) => store,
            Err(e) => {
                reporter.error(&format!(
                    "database opening failed (file:'{}', reason:'{e}')",
                    path.display()
                ));
                return Self::disabled(reporter);
            }
        };

        let mut cache = Self::from_store(store.clone(), mode, Arc::clone(&reporter));
        match Janitor::spawn(store, reporter) {
            Ok(janitor) => cache.janitor = Some(janitor),
            Err(e) => cache
                .reporter
                .warning(&format!("starting cache janitor failed (reason:'{e}')")),
        }
        cache
    }

    /// Wrap an already open store, without a janitor
    #[must_use]
    pub fn from_store(store: Store, mode: CacheMode, reporter: Arc<dyn Reporter>) -> Self {
        Self {
            store: Some(store),
            janitor: None,
            mode,
            reporter,
        }
    }

    /// A cache that never stores anything
    #[must_use]
    pub fn disabled(reporter: Arc<dyn Reporter>) -> Self {
        Self {
            store: None,
            janitor: None,
            mode: CacheMode::Off,
            reporter,
        }
    }

    /// Whether a store is open
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.store.is_some()
    }

    #[must_use]
    pub const fn mode(&self) -> CacheMode {
        self.mode
    }

    /// Cached range of `file`, if it was stored for modification time `modified`
    pub fn read(&self, file: &Path, modified: SystemTime) -> Option<TimeRange> {
        if !self.mode.reads() {
            return None;
        }
        let store = self.store.as_ref()?;

        match store.get(file) {
            Ok(Some(entry)) if entry.modified == modified => Some(entry.range()),
            Ok(_) => None,
            Err(e) => {
                self.reporter.error(&format!(
                    "restoring from database failed (key:'{}', reason:'{e}')",
                    file.display()
                ));
                None
            }
        }
    }

    /// Store the range of `file` computed at modification time `modified`
    pub fn write(&self, file: &Path, range: &TimeRange, modified: SystemTime) {
        if !self.mode.writes() {
            return;
        }
        let Some(store) = &self.store else {
            return;
        };

        if let Err(e) = store.set(file, &CacheEntry::new(range, modified)) {
            self.reporter.error(&format!(
                "storing to database failed (key:'{}', reason:'{e}')",
                file.display()
            ));
        }
    }

    /// Stop the janitor, then flush and release the store
    pub fn close(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(janitor) = self.janitor.take() {
            janitor.stop();
        }
        if let Some(store) = self.store.take()
            && let Err(e) = store.flush()
        {
            self.reporter
                .error(&format!("flushing database failed (reason:'{e}')"));
        }
    }
}

impl Drop for Cache {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{BufferedReporter, Level};
    use crate::testing::TestCache;
    use chrono::{Local, TimeZone};
    use std::time::Duration;

    fn sample_range() -> TimeRange {
        TimeRange::new(
            Some(Local.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap()),
            Some(Local.with_ymd_and_hms(2023, 1, 2, 0, 0, 0).unwrap()),
        )
    }

    fn mtime(secs: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
    }

    #[test]
    fn test_cache_mode_parse() {
        assert_eq!("".parse::<CacheMode>(), Ok(CacheMode::Off));
        assert_eq!("r".parse::<CacheMode>(), Ok(CacheMode::Read));
        assert_eq!("w".parse::<CacheMode>(), Ok(CacheMode::Write));
        assert_eq!("rw".parse::<CacheMode>(), Ok(CacheMode::ReadWrite));
        assert!("wr".parse::<CacheMode>().is_err());

        assert!(CacheMode::Read.reads() && !CacheMode::Read.writes());
        assert!(!CacheMode::Write.reads() && CacheMode::Write.writes());
        assert!(!CacheMode::Off.reads() && !CacheMode::Off.writes());
    }

    #[test]
    fn test_read_back_same_mtime() {
        let test_cache = TestCache::new(CacheMode::ReadWrite);
        let cache = test_cache.cache();
        let file = Path::new("/logs/a.log");

        assert_eq!(cache.read(file, mtime(10)), None);
        cache.write(file, &sample_range(), mtime(10));
        assert_eq!(cache.read(file, mtime(10)), Some(sample_range()));
    }

    #[test]
    fn test_stale_mtime_is_a_miss() {
        let test_cache = TestCache::new(CacheMode::ReadWrite);
        let cache = test_cache.cache();
        let file = Path::new("/logs/a.log");

        cache.write(file, &sample_range(), mtime(10));
        assert_eq!(cache.read(file, mtime(11)), None);

        cache.write(file, &TimeRange::unbounded(), mtime(11));
        assert_eq!(cache.read(file, mtime(11)), Some(TimeRange::unbounded()));
    }

    #[test]
    fn test_write_only_mode_never_reads() {
        let test_cache = TestCache::new(CacheMode::Write);
        let cache = test_cache.cache();
        let file = Path::new("/logs/a.log");

        cache.write(file, &sample_range(), mtime(10));
        assert_eq!(cache.read(file, mtime(10)), None);
        assert_eq!(test_cache.store().count(), 1);
    }

    #[test]
    fn test_read_only_mode_never_writes() {
        let test_cache = TestCache::new(CacheMode::Read);
        test_cache
            .cache()
            .write(Path::new("/logs/a.log"), &sample_range(), mtime(10));
        assert_eq!(test_cache.store().count(), 0);
    }

    #[test]
    fn test_off_mode_opens_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache");
        let cache = Cache::open(&path, CacheMode::Off, Arc::new(BufferedReporter::new()));

        assert!(!cache.is_open());
        assert!(!path.exists());
        cache.write(Path::new("/logs/a.log"), &sample_range(), mtime(1));
        assert_eq!(cache.read(Path::new("/logs/a.log"), mtime(1)), None);
        cache.close();
    }

    #[test]
    fn test_open_failure_degrades_to_noop() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "file").unwrap();

        let reporter = BufferedReporter::new();
        let cache = Cache::open(
            blocker.join("cache"),
            CacheMode::ReadWrite,
            Arc::new(reporter.clone()),
        );

        assert!(!cache.is_open());
        assert!(reporter.contains(Level::Error, "database opening failed"));
        cache.write(Path::new("/logs/a.log"), &sample_range(), mtime(1));
        assert_eq!(cache.read(Path::new("/logs/a.log"), mtime(1)), None);
    }

    #[test]
    fn test_entries_survive_close_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache");
        let log = dir.path().join("kept.log");
        std::fs::write(&log, "2023-01-01\n").unwrap();
        let modified = std::fs::metadata(&log).unwrap().modified().unwrap();

        let cache = Cache::open(&path, CacheMode::ReadWrite, Arc::new(BufferedReporter::new()));
        cache.write(&log, &sample_range(), modified);
        cache.close();

        let cache = Cache::open(&path, CacheMode::ReadWrite, Arc::new(BufferedReporter::new()));
        assert_eq!(cache.read(&log, modified), Some(sample_range()));
        cache.close();
    }

    #[test]
    fn test_cache_is_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Cache>();
    }
}
