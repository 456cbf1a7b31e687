//! Background eviction of stale cache entries
//!
//! The janitor repeatedly picks a random key between the first and last
//! stored keys, looks at a small batch of entries from there and deletes
//! those whose file is gone or has been modified since the entry was written. Each sample
//! costs a few seeks plus one batch, however large the cache grows.
//!
//! It runs on its own thread until stopped, until the store is empty, or
//! until a batch comes back empty.

use super::error::CacheError;
use super::store::Store;
use crate::output::Reporter;
use rand::Rng;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Entries examined per sample
pub const BATCH_SIZE: usize = 10;

/// Pause between two samples
pub const SAMPLE_INTERVAL: Duration = Duration::from_millis(50);

/// Handle to a running janitor thread
pub struct Janitor {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Janitor {
    /// Start sweeping `store` on a background thread
    ///
    /// # Errors
    ///
    /// Returns an `io::Error` if the thread cannot be spawned.
    pub fn spawn(store: Store, reporter: Arc<dyn Reporter>) -> io::Result<Self> {
        let (stop, stopped) = mpsc::channel();
        let handle = thread::Builder::new()
            .name("trf-janitor".to_string())
            .spawn(move || run(&store, reporter.as_ref(), &stopped))?;

        Ok(Self {
            stop: Some(stop),
            handle: Some(handle),
        })
    }

    /// Signal the thread and wait for it to finish its current batch
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(stop) = self.stop.take() {
            // The receiver is gone if the thread already returned.
            let _ = stop.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Janitor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run(store: &Store, reporter: &dyn Reporter, stopped: &Receiver<()>) {
    let mut rng = rand::thread_rng();

    loop {
        if !matches!(stopped.try_recv(), Err(TryRecvError::Empty)) {
            return;
        }

        let start = match sample_start(store, &mut rng) {
            Ok(Some(start)) => start,
            Ok(None) => return,
            Err(e) => {
                reporter.warning(&format!("obtaining keys from database failed (reason:'{e}')"));
                return;
            }
        };

        match sweep(store, reporter, &start, BATCH_SIZE) {
            None => return,
            Some(batch) if batch.evicted > 0 => {
                reporter.debug(&format!("janitor evicted {} cache entries", batch.evicted));
            }
            Some(_) => {}
        }

        match stopped.recv_timeout(SAMPLE_INTERVAL) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => return,
        }
    }
}

/// Random raw key between the smallest and largest stored keys
///
/// `None` when the store is empty. Only the two ends of the tree are read.
///
/// # Errors
///
/// Returns `CacheError` if the key bounds cannot be read.
pub fn sample_start<R: Rng>(store: &Store, rng: &mut R) -> Result<Option<Vec<u8>>, CacheError> {
    Ok(store
        .key_bounds()?
        .map(|(first, last)| random_key_between(&first, &last, rng)))
}

/// Random byte string no greater than `last`, picked byte by byte without
/// dropping below `first` on the shared prefix
///
/// Requires `first <= last`. A range starting at the result holds at least
/// `last`.
fn random_key_between<R: Rng>(first: &[u8], last: &[u8], rng: &mut R) -> Vec<u8> {
    let mut key = Vec::with_capacity(last.len());
    let (mut above_first, mut below_last) = (false, false);

    for (i, &hi) in last.iter().enumerate() {
        let min = if above_first { 0 } else { first.get(i).copied().unwrap_or(0) };
        let max = if below_last { u8::MAX } else { hi };
        let byte = rng.gen_range(min..=max);
        above_first |= byte > min;
        below_last |= byte < max;
        key.push(byte);
    }
    key
}

/// Outcome of checking one batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sweep {
    /// Entries looked at
    pub checked: usize,
    /// Entries deleted
    pub evicted: usize,
}

/// Check up to `limit` entries at or after the raw key `start`, deleting
/// stale ones
///
/// Returns `None` when there was nothing left to look at or the keys could
/// not be listed (the janitor then stops).
pub fn sweep(store: &Store, reporter: &dyn Reporter, start: &[u8], limit: usize) -> Option<Sweep> {
    let files = match store.keys_from(start, limit) {
        Ok(files) => files,
        Err(e) => {
            reporter.warning(&format!("obtaining keys from database failed (reason:'{e}')"));
            return None;
        }
    };
    if files.is_empty() {
        return None;
    }

    Some(Sweep {
        checked: files.len(),
        evicted: files.iter().filter(|file| sweep_entry(store, reporter, file)).count(),
    })
}

fn sweep_entry(store: &Store, reporter: &dyn Reporter, file: &Path) -> bool {
    let entry = match store.get(file) {
        Ok(Some(entry)) => entry,
        Ok(None) => return false,
        Err(e) => {
            reporter.warning(&format!(
                "reading data from database failed (key:'{}', reason:'{e}')",
                file.display()
            ));
            return false;
        }
    };

    let stale = fs::metadata(file)
        .and_then(|m| m.modified())
        .map_or(true, |modified| modified != entry.modified);
    if !stale {
        return false;
    }

    match store.delete(file) {
        Ok(deleted) => deleted,
        Err(e) => {
            reporter.warning(&format!(
                "deleting from database failed (key:'{}', reason:'{e}')",
                file.display()
            ));
            false
        }
    }
}
