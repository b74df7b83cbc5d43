//! Messages flowing from workers to the coordinator.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::source::Candidate;

/// Attempts made by one worker since its previous report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressReport {
    pub worker_id: usize,
    pub attempts_delta: u64,
}

/// The winning candidate and how long its worker took to find it.
#[derive(Debug, Clone)]
pub struct MatchResult {
    pub worker_id: usize,
    pub candidate: Candidate,
    /// Attempts made by the finding worker, the match included
    pub total_attempts: u64,
    /// Wall time since the finding worker started
    pub elapsed: Duration,
}

/// Worker lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Running,
    Found,
    Cancelled,
    Crashed,
}

/// How a worker terminated.
#[derive(Debug, Clone)]
pub enum WorkerOutcome {
    Found(MatchResult),
    Cancelled,
    Crashed(String),
}

impl WorkerOutcome {
    pub fn state(&self) -> WorkerState {
        match self {
            WorkerOutcome::Found(_) => WorkerState::Found,
            WorkerOutcome::Cancelled => WorkerState::Cancelled,
            WorkerOutcome::Crashed(_) => WorkerState::Crashed,
        }
    }
}

/// Termination event; the last message a worker sends.
#[derive(Debug, Clone)]
pub struct WorkerExit {
    pub worker_id: usize,
    pub outcome: WorkerOutcome,
    /// Attempts made after the last delivered progress report
    pub unreported: u64,
}

#[derive(Debug, Clone)]
pub enum WorkerMessage {
    Progress(ProgressReport),
    Exit(WorkerExit),
}

/// Cooperative stop signal shared by the coordinator and its workers.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
