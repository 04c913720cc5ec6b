//! Result types: per-keyword tallies, per-file results and the aggregate an
//! observer builds from a session's event stream.
use serde::Serialize;
use std::path::PathBuf;

use crate::config::KeywordLogic;
use crate::errors::ExtractError;
use crate::filters::FileType;
use crate::metrics::ScanStats;
use crate::search::events::ScanEvent;
use crate::search::session::ScanState;

/// Location text used when a file fails the combined predicate
pub const NO_MATCH_LOCATION: &str = "no match";

/// Occurrences of one keyword across all content units of a file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordTally {
    pub found: bool,
    pub occurrence_count: usize,
    /// Label of the first unit that matched; set once and never overwritten
    pub first_location: Option<String>,
}

impl KeywordTally {
    /// Adds the occurrences found in one unit
    pub fn record(&mut self, count: usize, label: &str) {
        if count == 0 {
            return;
        }
        self.found = true;
        self.occurrence_count += count;
        if self.first_location.is_none() {
            self.first_location = Some(label.to_string());
        }
    }
}

/// Applies the AND/OR rule to the keyword tallies of a file.
///
/// `keyword2` is `None` when no second keyword was given, in which case only
/// keyword 1 decides.
pub fn keyword_decision(
    keyword1: &KeywordTally,
    keyword2: Option<&KeywordTally>,
    logic: KeywordLogic,
) -> bool {
    match (keyword2, logic) {
        (None, _) => keyword1.found,
        (Some(k2), KeywordLogic::And) => keyword1.found && k2.found,
        (Some(k2), KeywordLogic::Or) => keyword1.found || k2.found,
    }
}

/// Outcome of evaluating one candidate file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileResult {
    pub path: PathBuf,
    pub file_type: FileType,
    pub matched: bool,
    pub keyword1_count: usize,
    pub keyword2_count: usize,
    /// Sum of both keyword counts when matched, otherwise 0
    pub total_match_count: usize,
    pub display_location: String,
    /// Failure category when the file could not be evaluated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
}

impl FileResult {
    /// Builds the result of a fully evaluated file
    pub fn from_tallies(
        path: PathBuf,
        file_type: FileType,
        keyword1: &KeywordTally,
        keyword2: Option<&KeywordTally>,
        logic: KeywordLogic,
    ) -> Self {
        let matched = keyword_decision(keyword1, keyword2, logic);
        if !matched {
            return Self {
                path,
                file_type,
                matched: false,
                keyword1_count: 0,
                keyword2_count: 0,
                total_match_count: 0,
                display_location: NO_MATCH_LOCATION.to_string(),
                diagnostic: None,
            };
        }

        let keyword2_found = keyword2.is_some_and(|k2| k2.found);
        let display_location = match (
            keyword1.first_location.as_deref().filter(|_| keyword1.found),
            keyword2
                .and_then(|k2| k2.first_location.as_deref())
                .filter(|_| keyword2_found),
        ) {
            (Some(location), _) => format!("{} (keyword 1)", location),
            (None, Some(location)) => format!("{} (keyword 2)", location),
            (None, None) if keyword1.found => "location unknown (keyword 1)".to_string(),
            (None, None) if keyword2_found => "location unknown (keyword 2)".to_string(),
            (None, None) => "location unknown".to_string(),
        };

        let keyword1_count = keyword1.occurrence_count;
        let keyword2_count = keyword2.map_or(0, |k2| k2.occurrence_count);
        Self {
            path,
            file_type,
            matched: true,
            keyword1_count,
            keyword2_count,
            total_match_count: keyword1_count + keyword2_count,
            display_location,
            diagnostic: None,
        }
    }

    /// Builds the non-matching result of a file that could not be evaluated
    pub fn failed(path: PathBuf, file_type: FileType, error: &ExtractError) -> Self {
        Self {
            path,
            file_type,
            matched: false,
            keyword1_count: 0,
            keyword2_count: 0,
            total_match_count: 0,
            display_location: format!("{}: {}", error.category(), error),
            diagnostic: Some(error.category().to_string()),
        }
    }
}

/// How a session ended, returned by `ScanHandle::wait`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanSummary {
    pub state: ScanState,
    pub files_total: usize,
    pub files_processed: usize,
    pub files_matched: usize,
    pub stats: ScanStats,
}

/// Everything an observer saw during one session
#[derive(Debug, Clone, Default)]
pub struct SearchReport {
    /// Matched files, in the order they were reported
    pub file_results: Vec<FileResult>,
    /// Total number of keyword occurrences across matched files
    pub total_matches: usize,
    pub files_with_matches: usize,
    /// Last progress reported as (processed, total)
    pub progress: (usize, usize),
    pub statuses: Vec<String>,
    pub errors: Vec<String>,
    pub stopped: bool,
    /// Matched-file count carried by the completion event
    pub completed: Option<usize>,
    pub summary: Option<ScanSummary>,
}

impl SearchReport {
    /// Creates a new empty report
    pub fn new() -> Self {
        Default::default()
    }

    /// Adds a matched file to the report
    pub fn add_file_result(&mut self, file_result: FileResult) {
        if file_result.matched {
            self.total_matches += file_result.total_match_count;
            self.files_with_matches += 1;
        }
        self.file_results.push(file_result);
    }

    /// Folds one event into the report
    pub fn apply(&mut self, event: ScanEvent) {
        match event {
            ScanEvent::Status(text) => self.statuses.push(text),
            ScanEvent::Progress { processed, total } => self.progress = (processed, total),
            ScanEvent::Result(result) => self.add_file_result(result),
            ScanEvent::Stopped => self.stopped = true,
            ScanEvent::Completed { matched_files } => self.completed = Some(matched_files),
            ScanEvent::Error(message) => self.errors.push(message),
        }
    }

    /// Orders results by total match count, highest first; ties keep report order
    pub fn sort_by_matches(&mut self) {
        self.file_results
            .sort_by(|a, b| b.total_match_count.cmp(&a.total_match_count));
    }

    /// Paths of all matched files
    pub fn matched_paths(&self) -> Vec<PathBuf> {
        self.file_results.iter().map(|r| r.path.clone()).collect()
    }
}
