//! The scan-and-match pipeline.
//!
//! A session runs in two stages on one worker thread. The [`Scanner`]
//! walks the root directory and builds the candidate list, then a
//! [`FileEvaluator`] opens each candidate through its format backend and
//! counts keyword occurrences unit by unit. Everything the observer learns
//! arrives as a [`ScanEvent`] on the session's channel:
//!
//! ```text
//! Status("Scanning for candidate files...")
//! Status("Found 3 readable candidate files")
//! Progress { processed: 0, total: 3 }
//! Progress { processed: 1, total: 3 }
//! Result(FileResult { .. })
//! ...
//! Completed { matched_files: 1 }
//! ```
//!
//! With more than one thread configured, evaluation is spread over a rayon
//! pool. The worker thread still emits every event itself, so progress
//! never goes backwards even though results may arrive out of list order.
pub mod engine;
pub mod evaluator;
pub mod events;
pub mod extract;
pub mod matcher;
pub mod scanner;
pub mod session;

pub use engine::{ScanHandle, SearchEngine};
pub use evaluator::FileEvaluator;
pub use events::ScanEvent;
pub use extract::{ContentExtractor, ContentUnit, ExtractOptions, Extractors};
pub use matcher::{match_keyword, KeywordMatcher, MatchCount};
pub use scanner::{CandidateFile, ScanOutput, Scanner};
pub use session::{CancellationToken, ScanSession, ScanState};
