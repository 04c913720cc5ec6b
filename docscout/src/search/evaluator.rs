use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

use super::extract::{ExtractOptions, Extractors};
use super::matcher::KeywordMatcher;
use super::scanner::CandidateFile;
use super::session::CancellationToken;
use crate::config::{KeywordLogic, SearchCriteria};
use crate::errors::{ExtractError, ExtractResult};
use crate::metrics::ScanMetrics;
use crate::results::{FileResult, KeywordTally};

/// Evaluates single files against the keywords of a session.
///
/// One evaluator serves a whole session and is shared by every worker; it
/// holds no per-file state.
#[derive(Debug)]
pub struct FileEvaluator {
    extractors: Arc<Extractors>,
    keyword1: KeywordMatcher,
    keyword2: Option<KeywordMatcher>,
    logic: KeywordLogic,
    options: ExtractOptions,
    metrics: ScanMetrics,
}

impl FileEvaluator {
    /// Creates an evaluator with its own metrics
    pub fn new(criteria: &SearchCriteria, extractors: Arc<Extractors>) -> Self {
        Self::with_metrics(criteria, extractors, ScanMetrics::new())
    }

    pub fn with_metrics(
        criteria: &SearchCriteria,
        extractors: Arc<Extractors>,
        metrics: ScanMetrics,
    ) -> Self {
        let keyword1 = KeywordMatcher::with_metrics(
            &criteria.keyword1,
            criteria.case_sensitive,
            criteria.whole_word,
            &metrics,
        );
        let keyword2 = criteria.keyword2.as_deref().map(|keyword| {
            KeywordMatcher::with_metrics(keyword, criteria.case_sensitive, criteria.whole_word, &metrics)
        });

        Self {
            extractors,
            keyword1,
            keyword2,
            logic: criteria.logic,
            options: ExtractOptions {
                content_only: criteria.content_only,
            },
            metrics,
        }
    }

    /// Gets the metrics this evaluator records into
    pub fn metrics(&self) -> &ScanMetrics {
        &self.metrics
    }

    /// Evaluates one file.
    ///
    /// Returns `None` when `cancel` was set during the evaluation; partial
    /// tallies are dropped. Any failure, including a panic inside a format
    /// backend, becomes a non-matching result carrying a diagnostic.
    pub fn evaluate(&self, candidate: &CandidateFile, cancel: &CancellationToken) -> Option<FileResult> {
        trace!("Evaluating file: {}", candidate.path.display());

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.tally_file(candidate, cancel)));

        let result = match outcome {
            Ok(Ok(Some((tally1, tally2)))) => FileResult::from_tallies(
                candidate.path.clone(),
                candidate.file_type,
                &tally1,
                self.keyword2.as_ref().map(|_| &tally2),
                self.logic,
            ),
            Ok(Ok(None)) => {
                debug!("Evaluation of {} cancelled", candidate.path.display());
                return None;
            }
            Ok(Err(e)) => {
                warn!("Skipping {}: {}", candidate.path.display(), e);
                FileResult::failed(candidate.path.clone(), candidate.file_type, &e)
            }
            Err(payload) => {
                let e = ExtractError::unexpected(&candidate.path, panic_message(payload.as_ref()));
                warn!("Skipping {}: {}", candidate.path.display(), e);
                FileResult::failed(candidate.path.clone(), candidate.file_type, &e)
            }
        };

        self.metrics
            .record_file(result.matched, result.diagnostic.is_some());
        if result.matched {
            info!(
                "Match in {}: {} occurrence(s), first at {}",
                result.path.display(),
                result.total_match_count,
                result.display_location
            );
        }
        Some(result)
    }

    /// Runs the extractor over the file and tallies both keywords.
    ///
    /// The extractor's unit iterator is dropped, closing the file, before
    /// this returns on every path.
    fn tally_file(
        &self,
        candidate: &CandidateFile,
        cancel: &CancellationToken,
    ) -> ExtractResult<Option<(KeywordTally, KeywordTally)>> {
        let units = self
            .extractors
            .for_type(candidate.file_type)
            .open(&candidate.path, self.options)?;

        let mut tally1 = KeywordTally::default();
        let mut tally2 = KeywordTally::default();

        for unit in units {
            if cancel.is_cancelled() {
                return Ok(None);
            }
            let unit = match unit {
                Ok(unit) => unit,
                Err(e @ ExtractError::PartialRead { .. }) => {
                    warn!("{}", e);
                    continue;
                }
                Err(e) => return Err(e),
            };
            self.metrics.record_unit();

            let hit1 = self.keyword1.count(&unit.text);
            tally1.record(hit1.count, &unit.label);

            if let Some(keyword2) = &self.keyword2 {
                let hit2 = keyword2.count(&unit.text);
                tally2.record(hit2.count, &unit.label);
            }
        }

        if cancel.is_cancelled() {
            return Ok(None);
        }
        Ok(Some((tally1, tally2)))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "backend panicked".to_string()
    }
}
