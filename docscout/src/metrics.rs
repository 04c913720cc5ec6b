use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Running counters of one scan session.
///
/// Cloning shares the counters, so the scanner, the evaluators on every
/// worker thread and the coordinator all update the same values.
#[derive(Debug, Clone)]
pub struct ScanMetrics {
    // Scanner
    entries_skipped: Arc<AtomicU64>,
    candidates_found: Arc<AtomicU64>,

    // Evaluation
    files_scanned: Arc<AtomicU64>,
    files_matched: Arc<AtomicU64>,
    files_failed: Arc<AtomicU64>,
    units_visited: Arc<AtomicU64>,

    // Matcher
    pattern_cache_hits: Arc<AtomicU64>,
    pattern_cache_misses: Arc<AtomicU64>,
}

impl ScanMetrics {
    /// Creates a new set of zeroed counters
    pub fn new() -> Self {
        Self {
            entries_skipped: Arc::new(AtomicU64::new(0)),
            candidates_found: Arc::new(AtomicU64::new(0)),
            files_scanned: Arc::new(AtomicU64::new(0)),
            files_matched: Arc::new(AtomicU64::new(0)),
            files_failed: Arc::new(AtomicU64::new(0)),
            units_visited: Arc::new(AtomicU64::new(0)),
            pattern_cache_hits: Arc::new(AtomicU64::new(0)),
            pattern_cache_misses: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Records a directory entry the scanner could not use
    pub fn record_skipped_entry(&self) {
        self.entries_skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a file admitted to the candidate list
    pub fn record_candidate(&self) {
        self.candidates_found.fetch_add(1, Ordering::Relaxed);
    }

    /// Records the outcome of one completed file evaluation
    pub fn record_file(&self, matched: bool, failed: bool) {
        let scanned = self.files_scanned.fetch_add(1, Ordering::Relaxed) + 1;
        if matched {
            self.files_matched.fetch_add(1, Ordering::Relaxed);
        }
        if failed {
            self.files_failed.fetch_add(1, Ordering::Relaxed);
        }
        debug!("Files evaluated so far: {}", scanned);
    }

    /// Records one content unit handed to the matcher
    pub fn record_unit(&self) {
        self.units_visited.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a whole-word pattern cache lookup
    pub fn record_pattern_cache(&self, hit: bool) {
        if hit {
            self.pattern_cache_hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.pattern_cache_misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn files_scanned(&self) -> u64 {
        self.files_scanned.load(Ordering::Relaxed)
    }

    pub fn files_matched(&self) -> u64 {
        self.files_matched.load(Ordering::Relaxed)
    }

    /// Gets a snapshot of all counters
    pub fn get_stats(&self) -> ScanStats {
        ScanStats {
            entries_skipped: self.entries_skipped.load(Ordering::Relaxed),
            candidates_found: self.candidates_found.load(Ordering::Relaxed),
            files_scanned: self.files_scanned.load(Ordering::Relaxed),
            files_matched: self.files_matched.load(Ordering::Relaxed),
            files_failed: self.files_failed.load(Ordering::Relaxed),
            units_visited: self.units_visited.load(Ordering::Relaxed),
            pattern_cache_hits: self.pattern_cache_hits.load(Ordering::Relaxed),
            pattern_cache_misses: self.pattern_cache_misses.load(Ordering::Relaxed),
        }
    }

    /// Logs the current counters
    pub fn log_stats(&self) {
        let stats = self.get_stats();
        info!(
            "Scan stats:\n\
             Candidates found/entries skipped: {}/{}\n\
             Files evaluated/matched/failed: {}/{}/{}\n\
             Content units visited: {}\n\
             Pattern cache hits/misses: {}/{}",
            stats.candidates_found,
            stats.entries_skipped,
            stats.files_scanned,
            stats.files_matched,
            stats.files_failed,
            stats.units_visited,
            stats.pattern_cache_hits,
            stats.pattern_cache_misses
        );
    }
}

impl Default for ScanMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of [`ScanMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub entries_skipped: u64,
    pub candidates_found: u64,
    pub files_scanned: u64,
    pub files_matched: u64,
    pub files_failed: u64,
    pub units_visited: u64,
    pub pattern_cache_hits: u64,
    pub pattern_cache_misses: u64,
}
