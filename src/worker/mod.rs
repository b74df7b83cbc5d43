//! Parallel search engine.
//!
//! This module provides:
//! - The candidate source boundary around the key primitive
//! - Per-thread worker loops that generate, match and report
//! - The coordinator that aggregates progress and latches the first match

mod cpu;
mod message;
mod pool;
mod source;

pub use cpu::WorkerLoop;
pub use message::{
    CancelToken, MatchResult, ProgressReport, WorkerExit, WorkerMessage, WorkerOutcome,
    WorkerState,
};
pub use pool::{format_number, run_search, Coordinator, SearchError, SearchOutcome, SearchSummary};
pub use source::{Candidate, CandidateSource, KeypairSource, SourceError};
