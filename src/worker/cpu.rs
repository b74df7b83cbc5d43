//! CPU worker loop: generate, match, report.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use crossbeam_channel::{Sender, TrySendError};
use log::debug;

use crate::config::SearchConfig;

use super::message::{
    CancelToken, MatchResult, ProgressReport, WorkerExit, WorkerMessage, WorkerOutcome,
};
use super::source::{CandidateSource, SourceError};

/// One isolated search unit.
///
/// Owns its config copy and candidate source; talks to the coordinator
/// only through the message channel and the cancel token.
pub struct WorkerLoop<S> {
    /// Worker ID
    id: usize,
    config: SearchConfig,
    source: S,
    tx: Sender<WorkerMessage>,
    cancel: CancelToken,
    /// Candidates evaluated so far
    attempts: u64,
    /// Attempts already delivered in progress reports
    reported: u64,
}

impl<S: CandidateSource> WorkerLoop<S> {
    pub fn new(
        id: usize,
        config: SearchConfig,
        source: S,
        tx: Sender<WorkerMessage>,
        cancel: CancelToken,
    ) -> Self {
        Self {
            id,
            config,
            source,
            tx,
            cancel,
            attempts: 0,
            reported: 0,
        }
    }

    /// Runs until a match, cancellation or failure, then sends the exit event.
    ///
    /// Panics inside the loop are caught and reported as a crash.
    pub fn run(mut self) {
        debug!("Worker {} started", self.id);
        let started = Instant::now();

        let outcome = match panic::catch_unwind(AssertUnwindSafe(|| self.search(started))) {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => WorkerOutcome::Crashed(e.to_string()),
            Err(payload) => WorkerOutcome::Crashed(panic_message(payload.as_ref())),
        };

        debug!(
            "Worker {} finished as {:?} after {} attempts",
            self.id,
            outcome.state(),
            self.attempts
        );

        let exit = WorkerExit {
            worker_id: self.id,
            outcome,
            unreported: self.attempts - self.reported,
        };
        // Coordinator may already be gone
        let _ = self.tx.send(WorkerMessage::Exit(exit));
    }

    fn search(&mut self, started: Instant) -> Result<WorkerOutcome, SourceError> {
        let batch_size = self.config.batch_size();
        let interval = self.config.progress_interval();

        loop {
            if self.cancel.is_cancelled() {
                return Ok(WorkerOutcome::Cancelled);
            }

            for candidate in self.source.next_batch(batch_size)? {
                if self.cancel.is_cancelled() {
                    return Ok(WorkerOutcome::Cancelled);
                }

                self.attempts += 1;

                if self.config.matcher().matches(&candidate.address) {
                    let candidate = self.source.finish_match(candidate);
                    return Ok(WorkerOutcome::Found(MatchResult {
                        worker_id: self.id,
                        candidate,
                        total_attempts: self.attempts,
                        elapsed: started.elapsed(),
                    }));
                }

                if self.attempts % interval == 0 && !self.report_progress() {
                    return Ok(WorkerOutcome::Cancelled);
                }
            }
        }
    }

    /// Sends the attempts made since the last delivered report.
    ///
    /// A full channel drops the report and the delta rolls into the next
    /// one. Returns false once the coordinator has hung up.
    fn report_progress(&mut self) -> bool {
        let delta = self.attempts - self.reported;
        if delta == 0 {
            return true;
        }

        let report = ProgressReport {
            worker_id: self.id,
            attempts_delta: delta,
        };
        match self.tx.try_send(WorkerMessage::Progress(report)) {
            Ok(()) => {
                self.reported = self.attempts;
                true
            }
            Err(TrySendError::Full(_)) => true,
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {}", s)
    } else {
        "panicked".into()
    }
}
