//! Persistent entry store
//!
//! Thin adapter over a sled tree exposing exactly what the cache needs:
//! get, set, delete, count and a windowed listing of keys in key order.
//! Sled handles are cheap to clone and safe to share between threads, so
//! workers and the janitor all operate on clones of the same store.

use super::error::CacheError;
use super::types::{CacheEntry, PathKey};
use sled::{Db, Tree};
use std::path::{Path, PathBuf};

/// Name of the sled tree holding cache entries
const ENTRIES_TREE: &str = "entries";

#[derive(Clone)]
pub struct Store {
    db: Db,
    entries: Tree,
}

impl Store {
    /// Opens or creates a store at the specified path
    ///
    /// # Errors
    ///
    /// Returns `CacheError` if the database cannot be opened (for example when
    /// another process holds its lock).
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CacheError> {
        let db = sled::open(path)?;
        let entries = db.open_tree(ENTRIES_TREE)?;
        Ok(Self { db, entries })
    }

    /// Entry stored for `file`, if any
    ///
    /// # Errors
    ///
    /// Returns `CacheError` if the lookup fails or the stored bytes cannot be decoded.
    pub fn get(&self, file: &Path) -> Result<Option<CacheEntry>, CacheError> {
        let key: Vec<u8> = PathKey::new(file).try_into()?;
        match self.entries.get(key)? {
            Some(value) => Ok(Some(CacheEntry::from_bytes(&value)?)),
            None => Ok(None),
        }
    }

    /// Insert or replace the entry for `file`
    ///
    /// # Errors
    ///
    /// Returns `CacheError` if encoding or the insert fails.
    pub fn set(&self, file: &Path, entry: &CacheEntry) -> Result<(), CacheError> {
        let key: Vec<u8> = PathKey::new(file).try_into()?;
        self.entries.insert(key, entry.to_bytes()?)?;
        Ok(())
    }

    /// Remove the entry for `file`, returning whether one existed
    ///
    /// # Errors
    ///
    /// Returns `CacheError` if the removal fails.
    pub fn delete(&self, file: &Path) -> Result<bool, CacheError> {
        let key: Vec<u8> = PathKey::new(file).try_into()?;
        Ok(self.entries.remove(key)?.is_some())
    }

    /// Up to `limit` keys starting at position `offset` in key order
    ///
    /// Skips `offset` keys one by one.
    ///
    /// # Errors
    ///
    /// Returns `CacheError` if iteration fails or a key cannot be decoded.
    pub fn keys(&self, limit: usize, offset: usize) -> Result<Vec<PathBuf>, CacheError> {
        self.entries
            .iter()
            .keys()
            .skip(offset)
            .take(limit)
            .map(|key| -> Result<PathBuf, CacheError> {
                Ok(PathKey::from_bytes(&key?)?.into_inner())
            })
            .collect()
    }

    /// Up to `limit` keys at or after the raw key `start`, in key order
    ///
    /// Costs a seek plus `limit` steps, whatever the size of the store.
    ///
    /// # Errors
    ///
    /// Returns `CacheError` if iteration fails or a key cannot be decoded.
    pub fn keys_from(&self, start: &[u8], limit: usize) -> Result<Vec<PathBuf>, CacheError> {
        self.entries
            .range(start..)
            .keys()
            .take(limit)
            .map(|key| -> Result<PathBuf, CacheError> {
                Ok(PathKey::from_bytes(&key?)?.into_inner())
            })
            .collect()
    }

    /// Smallest and largest raw keys, or `None` when the store is empty
    ///
    /// # Errors
    ///
    /// Returns `CacheError` if the lookup fails.
    pub fn key_bounds(&self) -> Result<Option<(Vec<u8>, Vec<u8>)>, CacheError> {
        match (self.entries.first()?, self.entries.last()?) {
            (Some((first, _)), Some((last, _))) => Ok(Some((first.to_vec(), last.to_vec()))),
            _ => Ok(None),
        }
    }

    /// Number of stored entries
    ///
    /// Walks the whole tree; not for use on hot paths.
    #[must_use]
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Flush all pending writes to disk
    ///
    /// # Errors
    ///
    /// Returns `CacheError` if the flush operation fails.
    pub fn flush(&self) -> Result<(), CacheError> {
        self.db.flush()?;
        Ok(())
    }
}
