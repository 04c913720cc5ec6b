use ignore::WalkBuilder;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::session::CancellationToken;
use crate::config::SearchCriteria;
use crate::errors::{SearchError, SearchResult};
use crate::filters::{should_include_file, FileType};
use crate::metrics::ScanMetrics;

/// A file admitted for evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    pub path: PathBuf,
    pub file_type: FileType,
}

/// What a scan collected, and whether it was cut short
#[derive(Debug, Clone, Default)]
pub struct ScanOutput {
    pub candidates: Vec<CandidateFile>,
    /// Set when cancellation ended the walk early
    pub stopped: bool,
}

/// Walks the root directory and builds the candidate list.
///
/// Entries are visited depth-first with siblings sorted by file name, so two
/// scans of an unchanged tree produce the same list.
#[derive(Debug, Clone)]
pub struct Scanner {
    root_path: PathBuf,
    recurse: bool,
    extensions: &'static [&'static str],
    ignore_patterns: Vec<String>,
    metrics: ScanMetrics,
}

impl Scanner {
    pub fn new(
        root_path: impl Into<PathBuf>,
        recurse: bool,
        extensions: &'static [&'static str],
        ignore_patterns: Vec<String>,
        metrics: ScanMetrics,
    ) -> Self {
        Self {
            root_path: root_path.into(),
            recurse,
            extensions,
            ignore_patterns,
            metrics,
        }
    }

    pub fn from_criteria(criteria: &SearchCriteria, metrics: ScanMetrics) -> Self {
        Self::new(
            criteria.root_path.clone(),
            criteria.recurse,
            criteria.allowed_extensions(),
            criteria.ignore_patterns.clone(),
            metrics,
        )
    }

    /// Collects the candidate files under the root.
    ///
    /// Entries that cannot be read are handed to `on_skip` and left out; only
    /// a root that cannot be listed at all fails the scan.
    pub fn scan<F>(&self, cancel: &CancellationToken, mut on_skip: F) -> SearchResult<ScanOutput>
    where
        F: FnMut(SearchError),
    {
        fs::read_dir(&self.root_path)
            .map_err(|e| SearchError::scan_fatal(&self.root_path, e.to_string()))?;

        let mut builder = WalkBuilder::new(&self.root_path);
        builder
            .standard_filters(false)
            .follow_links(false)
            .max_depth(if self.recurse { None } else { Some(1) })
            .sort_by_file_name(|a, b| a.cmp(b));

        let mut output = ScanOutput::default();

        for entry in builder.build() {
            if cancel.is_cancelled() {
                debug!("Scan cancelled after {} candidates", output.candidates.len());
                output.stopped = true;
                return Ok(output);
            }

            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = walk_error_path(&e)
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| self.root_path.clone());
                    if path == self.root_path {
                        return Err(SearchError::scan_fatal(path, e.to_string()));
                    }
                    warn!("Skipping unreadable entry {}: {}", path.display(), e);
                    self.metrics.record_skipped_entry();
                    let source = e
                        .into_io_error()
                        .unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, "directory walk failed"));
                    on_skip(SearchError::scan_access(path, source));
                    continue;
                }
            };

            let path = entry.path();
            let is_file = match entry.file_type() {
                Some(ft) if ft.is_file() => true,
                // Links are listed like the files they name; a dangling one fails the read check
                Some(ft) if ft.is_symlink() => fs::metadata(path).map_or(true, |m| m.is_file()),
                _ => false,
            };
            if !is_file {
                continue;
            }

            if !should_include_file(path, self.extensions, &self.ignore_patterns) {
                continue;
            }
            let Some(file_type) = FileType::from_path(path) else {
                continue;
            };

            if let Err(e) = check_readable(path) {
                warn!("Skipping unreadable file {}: {}", path.display(), e);
                self.metrics.record_skipped_entry();
                on_skip(SearchError::scan_access(path, e));
                continue;
            }

            self.metrics.record_candidate();
            output.candidates.push(CandidateFile {
                path: entry.into_path(),
                file_type,
            });
        }

        // A stop between the last entry and here still counts
        output.stopped = cancel.is_cancelled();
        debug!("Found {} candidate files", output.candidates.len());
        Ok(output)
    }
}

/// Reads one byte to confirm the file can be opened
fn check_readable(path: &Path) -> io::Result<()> {
    let mut byte = [0u8; 1];
    File::open(path)?.read(&mut byte)?;
    Ok(())
}

fn walk_error_path(err: &ignore::Error) -> Option<&Path> {
    match err {
        ignore::Error::WithPath { path, .. } => Some(path),
        ignore::Error::WithDepth { err, .. } | ignore::Error::WithLineNumber { err, .. } => {
            walk_error_path(err)
        }
        _ => None,
    }
}
