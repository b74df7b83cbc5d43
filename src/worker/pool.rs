//! Search coordinator: spawns workers, aggregates progress, latches the
//! first match and cancels everyone else.

use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError};
use log::{debug, error, info, warn};

use crate::config::SearchConfig;

use super::cpu::WorkerLoop;
use super::message::{CancelToken, MatchResult, WorkerExit, WorkerMessage, WorkerOutcome};
use super::source::{CandidateSource, KeypairSource};

/// Aggregate statistics of one search run.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSummary {
    /// Attempts summed over every worker's reports
    pub total_attempts: u64,
    /// Coordinator wall time
    pub elapsed: Duration,
    pub workers: usize,
    pub crashed: usize,
    /// Matches that lost the race to the latched one
    pub discarded_matches: usize,
}

impl SearchSummary {
    /// Addresses checked per second.
    pub fn rate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.total_attempts as f64 / secs
        } else {
            0.0
        }
    }
}

/// How a search run ended.
#[derive(Debug, Clone)]
pub enum SearchOutcome {
    /// A worker found a match
    Found {
        result: MatchResult,
        summary: SearchSummary,
    },
    /// Cancelled from outside before any match
    Aborted { summary: SearchSummary },
    /// Every worker crashed
    Exhausted { summary: SearchSummary },
}

impl SearchOutcome {
    pub fn summary(&self) -> &SearchSummary {
        match self {
            SearchOutcome::Found { summary, .. }
            | SearchOutcome::Aborted { summary }
            | SearchOutcome::Exhausted { summary } => summary,
        }
    }

    pub fn result(&self) -> Option<&MatchResult> {
        match self {
            SearchOutcome::Found { result, .. } => Some(result),
            _ => None,
        }
    }
}

/// Running totals kept by the coordinator loop.
#[derive(Debug)]
struct Tally {
    started: Instant,
    attempts: u64,
    running: usize,
    crashed: usize,
    discarded: usize,
    latched: Option<MatchResult>,
}

impl Tally {
    fn new(workers: usize) -> Self {
        Self {
            started: Instant::now(),
            attempts: 0,
            running: workers,
            crashed: 0,
            discarded: 0,
            latched: None,
        }
    }

    fn record(&mut self, delta: u64) {
        self.attempts = self.attempts.saturating_add(delta);
    }

    /// Applies an exit event. Returns true when it latched the result.
    fn exit(&mut self, exit: WorkerExit) -> bool {
        self.running = self.running.saturating_sub(1);
        self.record(exit.unreported);

        match exit.outcome {
            WorkerOutcome::Found(result) => {
                if self.latched.is_none() {
                    info!(
                        "Worker {} found a match after {} attempts",
                        exit.worker_id, result.total_attempts
                    );
                    self.latched = Some(result);
                    return true;
                }
                self.discarded += 1;
                info!("Discarding later match from worker {}", exit.worker_id);
            }
            WorkerOutcome::Cancelled => debug!("Worker {} stopped", exit.worker_id),
            WorkerOutcome::Crashed(reason) => {
                self.crashed += 1;
                error!("Worker {} crashed: {}", exit.worker_id, reason);
            }
        }
        false
    }

    fn rate(&self) -> f64 {
        let secs = self.started.elapsed().as_secs_f64();
        if secs > 0.0 {
            self.attempts as f64 / secs
        } else {
            0.0
        }
    }

    fn summary(&self, workers: usize) -> SearchSummary {
        SearchSummary {
            total_attempts: self.attempts,
            elapsed: self.started.elapsed(),
            workers,
            crashed: self.crashed,
            discarded_matches: self.discarded,
        }
    }
}

/// Owns the worker lifecycle for one search.
///
/// A coordinator may run several searches in turn. Each run stops its own
/// workers through a fresh token; `abort` is only ever set from outside.
pub struct Coordinator {
    config: SearchConfig,
    abort: CancelToken,
}

impl Coordinator {
    pub fn new(config: SearchConfig) -> Self {
        Self {
            config,
            abort: CancelToken::new(),
        }
    }

    /// Returns the token that aborts the search (e.g., from a signal handler).
    pub fn cancel_token(&self) -> CancelToken {
        self.abort.clone()
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Runs the search with secp256k1 keypair sources.
    pub fn run_search(&self) -> Result<SearchOutcome, SearchError> {
        let case_insensitive = self.config.case_insensitive();
        let with_mnemonic = self.config.with_mnemonic();
        self.run_with(|_| KeypairSource::new(case_insensitive, with_mnemonic))
    }

    /// Runs the search, asking `make_source` for one fresh source per worker.
    pub fn run_with<S, F>(&self, mut make_source: F) -> Result<SearchOutcome, SearchError>
    where
        S: CandidateSource + Send + 'static,
        F: FnMut(usize) -> S,
    {
        let workers = self.config.worker_count();
        let (tx, rx) = bounded(self.config.channel_capacity());
        let cancel = CancelToken::new();

        let mut handles: Vec<JoinHandle<()>> = Vec::with_capacity(workers);
        for id in 0..workers {
            let worker = WorkerLoop::new(
                id,
                self.config.clone(),
                make_source(id),
                tx.clone(),
                cancel.clone(),
            );

            let spawned = thread::Builder::new()
                .name(format!("vanity-worker-{}", id))
                .spawn(move || worker.run());

            match spawned {
                Ok(handle) => handles.push(handle),
                Err(source) => {
                    cancel.cancel();
                    return Err(SearchError::Spawn {
                        worker_id: id,
                        source,
                    });
                }
            }
        }

        // Only workers hold senders now
        drop(tx);
        info!("Started {} workers", workers);

        let outcome = self.supervise(&rx, workers, &cancel);

        let mut detached = 0;
        for handle in handles {
            if handle.is_finished() {
                let _ = handle.join();
            } else {
                detached += 1;
            }
        }
        if detached > 0 {
            warn!("{} workers still stopping; detaching them", detached);
        }

        Ok(outcome)
    }

    /// The coordinator event loop. `cancel` is the token this run's workers
    /// watch; it is set once the loop ends for any reason.
    fn supervise(
        &self,
        rx: &Receiver<WorkerMessage>,
        workers: usize,
        cancel: &CancelToken,
    ) -> SearchOutcome {
        let report_interval = self.config.report_interval();
        let mut tally = Tally::new(workers);
        let mut last_report = Instant::now();

        let mut aborted = false;
        while tally.running > 0 {
            match rx.recv_timeout(report_interval) {
                Ok(WorkerMessage::Progress(report)) => tally.record(report.attempts_delta),
                Ok(WorkerMessage::Exit(exit)) => {
                    if tally.exit(exit) {
                        break;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }

            if last_report.elapsed() >= report_interval {
                info!(
                    "processed {} addresses ({} addr/s)",
                    format_number(tally.attempts),
                    format_number(tally.rate() as u64)
                );
                last_report = Instant::now();
            }

            if self.abort.is_cancelled() {
                aborted = true;
                break;
            }
        }

        cancel.cancel();
        self.drain(rx, &mut tally);

        let summary = tally.summary(workers);
        info!(
            "Search finished: {} addresses in {:.2}s ({} addr/s)",
            format_number(summary.total_attempts),
            summary.elapsed.as_secs_f64(),
            format_number(summary.rate() as u64)
        );

        match tally.latched.take() {
            Some(result) => SearchOutcome::Found { result, summary },
            None if aborted || summary.crashed < workers => SearchOutcome::Aborted { summary },
            None => SearchOutcome::Exhausted { summary },
        }
    }

    /// Collects exit events from cancelled workers for at most the grace
    /// period. A match arriving here still wins if none was latched yet.
    fn drain(&self, rx: &Receiver<WorkerMessage>, tally: &mut Tally) {
        let deadline = Instant::now() + self.config.shutdown_grace();
        while tally.running > 0 {
            match rx.recv_deadline(deadline) {
                Ok(WorkerMessage::Progress(report)) => tally.record(report.attempts_delta),
                Ok(WorkerMessage::Exit(exit)) => {
                    tally.exit(exit);
                }
                Err(_) => break,
            }
        }
    }
}

/// Convenience wrapper: builds a coordinator and runs the keypair search.
pub fn run_search(config: SearchConfig) -> Result<SearchOutcome, SearchError> {
    Coordinator::new(config).run_search()
}

/// Formats large counts as 1.23K / 4.56M / 7.89B.
pub fn format_number(n: u64) -> String {
    if n >= 1_000_000_000 {
        format!("{:.2}B", n as f64 / 1_000_000_000.0)
    } else if n >= 1_000_000 {
        format!("{:.2}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.2}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Failed to spawn worker {worker_id}: {source}")]
    Spawn {
        worker_id: usize,
        #[source]
        source: std::io::Error,
    },
}
