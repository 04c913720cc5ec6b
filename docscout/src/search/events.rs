use crate::results::FileResult;

/// Messages a running session sends to its observer.
///
/// Events arrive in order on one channel. `Status` and `Progress` may be
/// interleaved anywhere between `Result` events. Every session ends with
/// exactly one `Stopped` or `Completed`; a failed session sends `Error`
/// followed by `Completed { matched_files: 0 }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    /// Human-readable status line
    Status(String),
    /// Files evaluated so far out of the candidate total
    Progress { processed: usize, total: usize },
    /// A file that satisfied the keyword predicate
    Result(FileResult),
    /// The session honored a stop request
    Stopped,
    /// The session finished; carries the number of matched files
    Completed { matched_files: usize },
    /// The session hit a fatal error
    Error(String),
}

impl ScanEvent {
    /// Whether no further events follow this one
    pub fn is_terminal(&self) -> bool {
        matches!(self, ScanEvent::Stopped | ScanEvent::Completed { .. })
    }
}
