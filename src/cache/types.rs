//! What the cache stores per file
//!
//! Keys are bincode encoded paths. Their byte order is the order the janitor
//! walks, so a random byte string between the first and last key is a valid
//! place to start a sweep. Values hold the file's time range with the
//! modification time it was extracted at; a different mtime makes the entry
//! stale.

use super::error::CacheError;
use crate::time_range::TimeRange;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Path of a scanned file in its stored key form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathKey(pub PathBuf);

impl TryFrom<PathKey> for Vec<u8> {
    type Error = CacheError;

    fn try_from(key: PathKey) -> Result<Self, Self::Error> {
        Ok(bincode::encode_to_vec(&key.0, bincode::config::standard())?)
    }
}

impl PathKey {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self(path.as_ref().to_path_buf())
    }

    /// # Errors
    ///
    /// Returns `CacheError` if the bytes cannot be deserialized into a `PathBuf`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CacheError> {
        let (path, _): (PathBuf, usize) =
            bincode::decode_from_slice(bytes, bincode::config::standard())?;
        Ok(Self(path))
    }

    #[must_use]
    pub fn into_inner(self) -> PathBuf {
        self.0
    }
}

/// Stored time range of one file
///
/// Only valid while the file's modification time still equals `modified`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub from: Option<DateTime<Local>>,
    pub to: Option<DateTime<Local>>,
    pub modified: SystemTime,
}

impl CacheEntry {
    #[must_use]
    pub const fn new(range: &TimeRange, modified: SystemTime) -> Self {
        Self {
            from: range.from,
            to: range.to,
            modified,
        }
    }

    #[must_use]
    pub const fn range(&self) -> TimeRange {
        TimeRange::new(self.from, self.to)
    }

    /// # Errors
    ///
    /// Returns `CacheError` if serialization fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CacheError> {
        Ok(bincode::serde::encode_to_vec(self, bincode::config::standard())?)
    }

    /// # Errors
    ///
    /// Returns `CacheError` if the bytes are not a valid entry.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CacheError> {
        let (entry, _): (Self, usize) =
            bincode::serde::decode_from_slice(bytes, bincode::config::standard())?;
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::time::Duration;

    #[test]
    fn test_path_key_bytes() {
        let key = PathKey::new("/var/log/syslog");
        let bytes: Vec<u8> = key.clone().try_into().unwrap();
        assert_eq!(PathKey::from_bytes(&bytes).unwrap(), key);
        assert_eq!(key.into_inner(), PathBuf::from("/var/log/syslog"));
    }

    #[test]
    fn test_entry_keeps_range_and_mtime_exactly() {
        let from = Local.with_ymd_and_hms(2023, 1, 5, 10, 0, 0).unwrap();
        let modified = SystemTime::UNIX_EPOCH + Duration::new(1_700_000_000, 123_456_789);
        let entry = CacheEntry::new(&TimeRange::new(Some(from), None), modified);

        let decoded = CacheEntry::from_bytes(&entry.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded, entry);
        assert_eq!(decoded.range(), TimeRange::new(Some(from), None));
        assert_eq!(decoded.modified, modified);
    }

    #[test]
    fn test_entry_rejects_garbage() {
        assert!(CacheEntry::from_bytes(b"\x01").is_err());
    }
}
