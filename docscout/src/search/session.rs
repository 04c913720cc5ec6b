use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

use crate::config::SearchCriteria;
use crate::metrics::ScanMetrics;

/// Cooperative stop signal shared between the observer and the worker.
///
/// The flag only ever goes from clear to set. A new session gets a new token.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests a stop; calling it again has no further effect
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Lifecycle of the pipeline coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ScanState {
    Idle = 0,
    Scanning = 1,
    Evaluating = 2,
    Completed = 3,
    Stopped = 4,
    Failed = 5,
}

impl ScanState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Scanning,
            2 => Self::Evaluating,
            3 => Self::Completed,
            4 => Self::Stopped,
            5 => Self::Failed,
            _ => Self::Idle,
        }
    }

    /// Whether a session is running in this state
    pub fn is_active(self) -> bool {
        matches!(self, Self::Scanning | Self::Evaluating)
    }

    /// Whether this state ends a session
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Stopped | Self::Failed)
    }
}

impl fmt::Display for ScanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Scanning => "scanning",
            Self::Evaluating => "evaluating",
            Self::Completed => "completed",
            Self::Stopped => "stopped",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Atomically updated [`ScanState`], shared by the engine and its worker
#[derive(Debug, Clone, Default)]
pub(crate) struct StateCell(Arc<AtomicU8>);

impl StateCell {
    pub(crate) fn get(&self) -> ScanState {
        ScanState::from_u8(self.0.load(Ordering::SeqCst))
    }

    pub(crate) fn set(&self, state: ScanState) {
        self.0.store(state as u8, Ordering::SeqCst);
    }

    /// Moves to `Scanning` unless a session is already active
    pub(crate) fn try_begin(&self) -> bool {
        let mut current = self.0.load(Ordering::SeqCst);
        loop {
            if ScanState::from_u8(current).is_active() {
                return false;
            }
            match self.0.compare_exchange(
                current,
                ScanState::Scanning as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }
}

/// State owned by one scan from start to terminal event
#[derive(Debug, Clone)]
pub struct ScanSession {
    pub criteria: Arc<SearchCriteria>,
    pub cancel: CancellationToken,
    pub metrics: ScanMetrics,
}

impl ScanSession {
    pub fn new(criteria: SearchCriteria) -> Self {
        Self {
            criteria: Arc::new(criteria),
            cancel: CancellationToken::new(),
            metrics: ScanMetrics::new(),
        }
    }
}
