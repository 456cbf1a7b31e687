//! Scan engine
//!
//! Reads paths one at a time, answers each from the cache when the file is
//! unchanged, and otherwise hands it to a bounded pool of workers that
//! extract its time range and store it. Paths whose range intersects the
//! query range are written to the output, one per line, in their original
//! (non-absolute) form.
//!
//! Cache hits are decided on the reading thread and emitted in input order.
//! Extractions finish in whatever order the workers get to them, so output
//! order is best effort only.
//!
//! The reading thread holds one admission slot per running extraction and
//! blocks when all slots are taken; there is no queue beyond the pool.

use crate::cache::Cache;
use crate::extract::{Extractor, Pipeline};
use crate::input::{Input, write_path};
use crate::output::Reporter;
use crate::time_range::TimeRange;
use crate::TrfError;
use rayon::ThreadPoolBuilder;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, SyncSender};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::SystemTime;

/// Upper bound on concurrent extractions
pub const MAX_JOBS: usize = 1000;

/// Lines examined on each side of a file by default
pub const DEFAULT_LINES: usize = 3;

/// Everything a scan needs besides the cache and the reporter
#[derive(Debug, Clone)]
pub struct FilterConfig {
    /// Query range files must intersect
    pub time_range: TimeRange,
    pub extractors: Vec<Extractor>,
    /// Non-empty lines read from each end of a file
    pub lines: usize,
    /// Maximum concurrent extractions, clamped to `1..=MAX_JOBS`
    pub concurrency: usize,
}

impl FilterConfig {
    #[must_use]
    pub const fn new(time_range: TimeRange, extractors: Vec<Extractor>) -> Self {
        Self {
            time_range,
            extractors,
            lines: DEFAULT_LINES,
            concurrency: 1,
        }
    }
}

/// Counts gathered during one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Paths read from the input
    pub paths: usize,
    /// Paths answered from the cache
    pub cache_hits: usize,
    /// Extraction attempts
    pub extracted: usize,
    /// Paths dropped because of an error
    pub skipped: usize,
    /// Paths written to the output
    pub emitted: usize,
}

#[derive(Default)]
struct Counters {
    paths: AtomicUsize,
    cache_hits: AtomicUsize,
    extracted: AtomicUsize,
    skipped: AtomicUsize,
    emitted: AtomicUsize,
}

impl Counters {
    fn bump(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> ScanStats {
        ScanStats {
            paths: self.paths.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            extracted: self.extracted.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            emitted: self.emitted.load(Ordering::Relaxed),
        }
    }
}

/// Admission slot, handed back when the worker holding it finishes
struct Slot(SyncSender<()>);

impl Drop for Slot {
    fn drop(&mut self) {
        // Capacity always covers every outstanding slot.
        let _ = self.0.send(());
    }
}

/// Time range filter over a stream of paths
pub struct Filter<'c> {
    time_range: TimeRange,
    concurrency: usize,
    pipeline: Pipeline,
    cache: &'c Cache,
    reporter: Arc<dyn Reporter>,
}

impl<'c> Filter<'c> {
    #[must_use]
    pub fn new(config: FilterConfig, cache: &'c Cache, reporter: Arc<dyn Reporter>) -> Self {
        Self {
            time_range: config.time_range,
            concurrency: config.concurrency.clamp(1, MAX_JOBS),
            pipeline: Pipeline::new(config.extractors, config.lines, Arc::clone(&reporter)),
            cache,
            reporter,
        }
    }

    /// Effective worker count
    #[must_use]
    pub const fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Filter every path from `input`, writing accepted ones to `output`
    ///
    /// Returns once every dispatched extraction has finished. Problems with a
    /// single path are reported and the path skipped.
    ///
    /// # Errors
    ///
    /// Returns `TrfError` if the worker pool cannot be built, reading `input`
    /// fails, or `output` cannot be flushed.
    pub fn run<W: Write + Send>(&self, input: &mut dyn Input, output: W) -> Result<ScanStats, TrfError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(self.concurrency)
            .thread_name(|i| format!("trf-worker-{i}"))
            .build()?;

        let (release, acquire) = mpsc::sync_channel(self.concurrency);
        for _ in 0..self.concurrency {
            let _ = release.send(());
        }

        let output = Mutex::new(output);
        let counters = Counters::default();

        self.reporter.debug(&format!("time range: {}", self.time_range));

        pool.in_place_scope(|scope| -> Result<(), TrfError> {
            while let Some(path) = input.read_path()? {
                Counters::bump(&counters.paths);
                self.reporter.debug(&format!("path: '{}'", path.display()));

                let absolute = match std::path::absolute(&path) {
                    Ok(absolute) => absolute,
                    Err(e) => {
                        self.reporter.error(&format!(
                            "skipping path (path:'{}', reason:'{e}')",
                            path.display()
                        ));
                        Counters::bump(&counters.skipped);
                        continue;
                    }
                };
                let modified = self.modified(&absolute);

                if let Some(range) = modified.and_then(|m| self.cache.read(&absolute, m)) {
                    Counters::bump(&counters.cache_hits);
                    self.reporter.debug(&format!("  time range: {range} (cache)"));
                    if self.intersects(&range) {
                        self.emit(&output, &path, &counters);
                    }
                    continue;
                }

                // Blocks while all slots are taken.
                if acquire.recv().is_err() {
                    break;
                }
                let slot = Slot(release.clone());
                let (output, counters) = (&output, &counters);
                scope.spawn(move |_| {
                    let _slot = slot;
                    self.scan(&path, &absolute, modified, output, counters);
                });
            }
            Ok(())
        })?;

        let mut output = output.into_inner().unwrap_or_else(PoisonError::into_inner);
        output.flush()?;
        Ok(counters.snapshot())
    }

    fn modified(&self, file: &Path) -> Option<SystemTime> {
        match fs::metadata(file).and_then(|m| m.modified()) {
            Ok(modified) => Some(modified),
            Err(e) => {
                self.reporter.error(&format!(
                    "stat file failed (file:'{}', reason:'{e}')",
                    file.display()
                ));
                None
            }
        }
    }

    fn scan<W: Write>(
        &self,
        path: &Path,
        absolute: &Path,
        modified: Option<SystemTime>,
        output: &Mutex<W>,
        counters: &Counters,
    ) {
        Counters::bump(&counters.extracted);
        let Some(range) = self.pipeline.extract_time_range(absolute) else {
            Counters::bump(&counters.skipped);
            return;
        };
        self.reporter
            .debug(&format!("  time range: {range} (path:'{}')", path.display()));

        // An unknown modification time could never be matched on a later read.
        if let Some(modified) = modified {
            self.cache.write(absolute, &range, modified);
        }
        if self.intersects(&range) {
            self.emit(output, path, counters);
        }
    }

    fn intersects(&self, range: &TimeRange) -> bool {
        let yes = self.time_range.intersects(range);
        self.reporter
            .debug(if yes { "  intersects: yes" } else { "  intersects: no" });
        yes
    }

    fn emit<W: Write>(&self, output: &Mutex<W>, path: &Path, counters: &Counters) {
        let mut output = output.lock().unwrap_or_else(PoisonError::into_inner);
        match write_path(&mut *output, path) {
            Ok(()) => Counters::bump(&counters.emitted),
            Err(e) => self
                .reporter
                .error(&format!(
                    "writing path failed (path:'{}', reason:'{e}')",
                    path.display()
                )),
        }
    }
}
