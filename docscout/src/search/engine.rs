use crossbeam_channel::{unbounded, Receiver, Sender};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, warn};

use super::evaluator::FileEvaluator;
use super::events::ScanEvent;
use super::extract::Extractors;
use super::scanner::{CandidateFile, Scanner};
use super::session::{CancellationToken, ScanSession, ScanState, StateCell};
use crate::config::{SearchConfig, SearchCriteria};
use crate::errors::{SearchError, SearchResult};
use crate::metrics::ScanStats;
use crate::results::{FileResult, ScanSummary, SearchReport};

/// A status line naming the current file goes out every this many files
const STATUS_INTERVAL: usize = 10;

/// Runs scan sessions on a background worker, one at a time.
///
/// # Examples
///
/// ```no_run
/// use docscout::{SearchConfig, SearchEngine};
///
/// let config = SearchConfig {
///     root_path: "reports".into(),
///     keyword1: "Invoice".to_string(),
///     ..SearchConfig::default()
/// };
/// let engine = SearchEngine::new();
/// let handle = engine.start_with_config(&config)?;
/// for event in handle.events() {
///     println!("{:?}", event);
/// }
/// # Ok::<(), docscout::SearchError>(())
/// ```
#[derive(Debug, Default)]
pub struct SearchEngine {
    state: StateCell,
    current: Mutex<Option<CancellationToken>>,
    extractors: Arc<Extractors>,
}

impl SearchEngine {
    /// Creates an engine using the calamine and lopdf backends
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an engine with custom format backends
    pub fn with_extractors(extractors: Extractors) -> Self {
        Self {
            extractors: Arc::new(extractors),
            ..Self::default()
        }
    }

    /// Gets the state of the latest session
    pub fn state(&self) -> ScanState {
        self.state.get()
    }

    /// Validates `config` and starts a session with the resulting criteria
    pub fn start_with_config(&self, config: &SearchConfig) -> SearchResult<ScanHandle> {
        self.start(config.validate()?)
    }

    /// Starts a new session.
    ///
    /// Fails with `InvalidCriteria` before anything runs when the root is not
    /// a directory or keyword 1 is blank, and with `SessionActive` while the
    /// previous session is still scanning or evaluating.
    pub fn start(&self, criteria: SearchCriteria) -> SearchResult<ScanHandle> {
        if criteria.keyword1.trim().is_empty() {
            return Err(SearchError::invalid_criteria("keyword 1 must not be blank"));
        }
        if !criteria.root_path.is_dir() {
            return Err(SearchError::invalid_criteria(format!(
                "folder does not exist or is not a directory: {}",
                criteria.root_path.display()
            )));
        }
        let session = ScanSession::new(criteria);
        let cancel = session.cancel.clone();
        {
            // The token is in place before anyone can observe the active state
            let mut current = self.current.lock().unwrap_or_else(|p| p.into_inner());
            if !self.state.try_begin() {
                return Err(SearchError::SessionActive);
            }
            *current = Some(cancel.clone());
        }

        let (sender, receiver) = unbounded();
        let pipeline = Pipeline {
            session,
            state: self.state.clone(),
            extractors: Arc::clone(&self.extractors),
            events: sender,
        };

        let worker = thread::Builder::new()
            .name("docscout-scan".to_string())
            .spawn(move || pipeline.run());
        let worker = match worker {
            Ok(worker) => worker,
            Err(e) => {
                self.state.set(ScanState::Failed);
                return Err(SearchError::IoError(e));
            }
        };

        Ok(ScanHandle {
            events: receiver,
            cancel,
            worker,
        })
    }

    /// Asks the active session to stop; does nothing when none is running
    pub fn request_stop(&self) {
        let current = self.current.lock().unwrap_or_else(|p| p.into_inner());
        if !self.state.get().is_active() {
            return;
        }
        if let Some(cancel) = current.as_ref() {
            info!("Stop requested");
            cancel.cancel();
        }
    }
}

/// The observer's side of a running session
#[derive(Debug)]
pub struct ScanHandle {
    events: Receiver<ScanEvent>,
    cancel: CancellationToken,
    worker: JoinHandle<ScanSummary>,
}

impl ScanHandle {
    /// Events in emission order; the channel closes after the terminal event
    pub fn events(&self) -> &Receiver<ScanEvent> {
        &self.events
    }

    /// A token that stops this session when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn request_stop(&self) {
        self.cancel.cancel();
    }

    /// Blocks until the worker finishes; unread events are discarded
    pub fn wait(self) -> ScanSummary {
        join_worker(self.worker)
    }

    /// Reads every event until the session ends and folds them into a report
    pub fn collect(self) -> SearchReport {
        let mut report = SearchReport::new();
        for event in self.events.iter() {
            report.apply(event);
        }
        report.summary = Some(join_worker(self.worker));
        report
    }
}

fn join_worker(worker: JoinHandle<ScanSummary>) -> ScanSummary {
    worker.join().unwrap_or_else(|_| {
        error!("Scan worker panicked");
        ScanSummary {
            state: ScanState::Failed,
            files_total: 0,
            files_processed: 0,
            files_matched: 0,
            stats: ScanStats::default(),
        }
    })
}

#[derive(Debug, Default)]
struct Progress {
    total: usize,
    processed: usize,
    matched: usize,
}

/// How the scanning and evaluating stages ended
enum StageOutcome {
    Finished,
    Stopped,
}

/// One session running on the worker thread; sole sender of its events
struct Pipeline {
    session: ScanSession,
    state: StateCell,
    extractors: Arc<Extractors>,
    events: Sender<ScanEvent>,
}

impl Pipeline {
    fn run(self) -> ScanSummary {
        let criteria = &self.session.criteria;
        info!(
            "Starting scan of {} for {:?} {} {:?}",
            criteria.root_path.display(),
            criteria.keyword1,
            criteria.logic,
            criteria.keyword2
        );

        let mut progress = Progress::default();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.execute(&mut progress)))
            .unwrap_or_else(|_| {
                Err(SearchError::scan_fatal(
                    &self.session.criteria.root_path,
                    "scan worker panicked",
                ))
            });

        self.session.metrics.log_stats();

        // The state must be terminal before the observer sees the terminal event
        let state = match outcome {
            Ok(StageOutcome::Finished) => {
                self.state.set(ScanState::Completed);
                info!(
                    "Scan completed: {} of {} files matched",
                    progress.matched, progress.total
                );
                self.emit(ScanEvent::Completed {
                    matched_files: progress.matched,
                });
                ScanState::Completed
            }
            Ok(StageOutcome::Stopped) => {
                self.state.set(ScanState::Stopped);
                info!(
                    "Scan stopped after {} of {} files",
                    progress.processed, progress.total
                );
                self.emit(ScanEvent::Stopped);
                ScanState::Stopped
            }
            Err(e) => {
                self.state.set(ScanState::Failed);
                error!("Scan failed: {}", e);
                self.emit(ScanEvent::Error(e.to_string()));
                self.emit(ScanEvent::Completed { matched_files: 0 });
                ScanState::Failed
            }
        };

        ScanSummary {
            state,
            files_total: progress.total,
            files_processed: progress.processed,
            files_matched: progress.matched,
            stats: self.session.metrics.get_stats(),
        }
    }

    fn execute(&self, progress: &mut Progress) -> SearchResult<StageOutcome> {
        let criteria = &self.session.criteria;
        let cancel = &self.session.cancel;

        self.status("Scanning for candidate files...");
        let scanner = Scanner::from_criteria(criteria, self.session.metrics.clone());
        let output = scanner.scan(cancel, |skipped| {
            self.status(format!("Skipped unreadable entry: {}", skipped))
        })?;
        if output.stopped {
            return Ok(StageOutcome::Stopped);
        }

        let candidates = output.candidates;
        progress.total = candidates.len();
        if candidates.is_empty() {
            self.status("No readable candidate files found");
        } else {
            self.status(format!("Found {} readable candidate files", candidates.len()));
        }

        self.state.set(ScanState::Evaluating);
        self.emit(ScanEvent::Progress {
            processed: 0,
            total: progress.total,
        });

        let evaluator = FileEvaluator::with_metrics(
            criteria,
            Arc::clone(&self.extractors),
            self.session.metrics.clone(),
        );

        let threads = criteria.thread_count.get();
        if threads == 1 || candidates.len() < 2 {
            return Ok(self.evaluate_sequential(&evaluator, &candidates, progress));
        }

        match rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("docscout-eval-{}", i))
            .build()
        {
            Ok(pool) => Ok(self.evaluate_parallel(&pool, &evaluator, &candidates, progress)),
            Err(e) => {
                warn!("Falling back to sequential evaluation: {}", e);
                Ok(self.evaluate_sequential(&evaluator, &candidates, progress))
            }
        }
    }

    /// Evaluates one file at a time in candidate order
    fn evaluate_sequential(
        &self,
        evaluator: &FileEvaluator,
        candidates: &[CandidateFile],
        progress: &mut Progress,
    ) -> StageOutcome {
        let cancel = &self.session.cancel;
        for candidate in candidates {
            if cancel.is_cancelled() {
                return StageOutcome::Stopped;
            }
            self.announce(candidate, progress.processed + 1, progress.total);
            match evaluator.evaluate(candidate, cancel) {
                Some(result) => self.record(result, progress),
                None => return StageOutcome::Stopped,
            }
        }
        StageOutcome::Finished
    }

    /// Evaluates files on a rayon pool while this thread emits the events.
    ///
    /// Results arrive in completion order. Tasks that start after a stop
    /// request return without evaluating, and outcomes that arrive after it
    /// are drained without being reported.
    fn evaluate_parallel(
        &self,
        pool: &rayon::ThreadPool,
        evaluator: &FileEvaluator,
        candidates: &[CandidateFile],
        progress: &mut Progress,
    ) -> StageOutcome {
        let cancel = &self.session.cancel;
        debug!(
            "Evaluating {} files on {} threads",
            candidates.len(),
            pool.current_num_threads()
        );

        pool.in_place_scope(|scope| {
            let (sender, receiver) = unbounded::<(usize, Option<FileResult>)>();
            for (index, candidate) in candidates.iter().enumerate() {
                let sender = sender.clone();
                scope.spawn(move |_| {
                    if cancel.is_cancelled() {
                        return;
                    }
                    let outcome = evaluator.evaluate(candidate, cancel);
                    let _ = sender.send((index, outcome));
                });
            }
            drop(sender);

            for (index, outcome) in receiver.iter() {
                if cancel.is_cancelled() {
                    continue;
                }
                if let Some(result) = outcome {
                    self.announce(&candidates[index], progress.processed + 1, progress.total);
                    self.record(result, progress);
                }
            }
        });

        if progress.processed < progress.total {
            StageOutcome::Stopped
        } else {
            StageOutcome::Finished
        }
    }

    /// Emits the periodic status line for the `position`-th file
    fn announce(&self, candidate: &CandidateFile, position: usize, total: usize) {
        if position % STATUS_INTERVAL == 0 || position == total {
            let name = candidate
                .path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| candidate.path.display().to_string());
            self.status(format!("Processing {} ({}/{})", name, position, total));
        }
    }

    fn record(&self, result: FileResult, progress: &mut Progress) {
        progress.processed += 1;
        self.emit(ScanEvent::Progress {
            processed: progress.processed,
            total: progress.total,
        });
        if result.matched {
            progress.matched += 1;
            self.emit(ScanEvent::Result(result));
        }
    }

    fn status(&self, text: impl Into<String>) {
        self.emit(ScanEvent::Status(text.into()));
    }

    fn emit(&self, event: ScanEvent) {
        // A dropped receiver only means nobody is listening any more
        if self.events.send(event).is_err() {
            debug!("Event dropped, observer is gone");
        }
    }
}
