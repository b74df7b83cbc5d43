//! Remote job monitoring for running the search on a hosted compute endpoint.
//!
//! The transport is not part of this crate; a deployment wrapper implements
//! [`JobEndpoint`] and hands it to [`JobMonitor`], which submits one job and
//! polls it to completion.

use std::thread;
use std::time::Duration;

use log::{debug, info, warn};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_QUEUED_WARNING: Duration = Duration::from_secs(300);

/// Job counters reported by the endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JobHealth {
    pub in_progress: u32,
    pub in_queue: u32,
}

impl JobHealth {
    pub fn is_idle(&self) -> bool {
        self.in_progress == 0 && self.in_queue == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Queued,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, JobState::Queued | JobState::Running)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobStatus {
    pub state: JobState,
    pub output: Option<String>,
}

/// A hosted compute endpoint.
pub trait JobEndpoint {
    fn health(&mut self) -> Result<JobHealth, JobError>;

    /// Submits a job and returns its id.
    fn submit(&mut self, payload: &str) -> Result<String, JobError>;

    fn status(&mut self, job_id: &str) -> Result<JobStatus, JobError>;

    /// Recent log lines. Empty while the job initializes.
    fn logs(&mut self, job_id: &str) -> Result<Vec<String>, JobError>;
}

/// Final state of a monitored job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    pub job_id: String,
    pub status: JobStatus,
    pub polls: u32,
    /// Time spent in the queue, counted in poll intervals
    pub queued_for: Duration,
    /// Whether the slow-start warning was issued
    pub slow_start: bool,
}

impl JobReport {
    pub fn succeeded(&self) -> bool {
        self.status.state == JobState::Completed
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// Other jobs were running or queued; nothing was submitted
    Busy(JobHealth),
    Finished(JobReport),
}

/// Submits one job and polls it at a fixed cadence.
#[derive(Debug, Clone)]
pub struct JobMonitor {
    poll_interval: Duration,
    queued_warning: Duration,
}

impl Default for JobMonitor {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            queued_warning: DEFAULT_QUEUED_WARNING,
        }
    }
}

impl JobMonitor {
    pub fn new(poll_interval: Duration, queued_warning: Duration) -> Self {
        Self {
            poll_interval,
            queued_warning,
        }
    }

    /// Submits `payload` unless the endpoint is busy, then polls until the
    /// job leaves the queued and running states.
    ///
    /// A job stuck in the queue only triggers a warning; polling goes on.
    pub fn run<E: JobEndpoint>(
        &self,
        endpoint: &mut E,
        payload: &str,
    ) -> Result<JobOutcome, JobError> {
        let health = endpoint.health()?;
        info!(
            "Endpoint health: {} in progress, {} queued",
            health.in_progress, health.in_queue
        );
        if !health.is_idle() {
            warn!("Jobs already in progress or queued; not submitting");
            return Ok(JobOutcome::Busy(health));
        }

        let job_id = endpoint.submit(payload)?;
        if job_id.is_empty() {
            return Err(JobError::MissingJobId);
        }
        info!("Job started with ID: {}", job_id);

        let mut polls = 0;
        let mut queued_for = Duration::ZERO;
        let mut slow_start = false;

        loop {
            thread::sleep(self.poll_interval);
            polls += 1;

            let status = endpoint.status(&job_id)?;
            info!("Job {} status: {:?}", job_id, status.state);

            if status.state == JobState::Queued {
                queued_for += self.poll_interval;
                debug!("Job {} queued for {:?}", job_id, queued_for);
                if !slow_start && queued_for >= self.queued_warning {
                    warn!(
                        "Job {} has been queued for {:?}; check the endpoint dashboard",
                        job_id, queued_for
                    );
                    slow_start = true;
                }
            }

            match endpoint.logs(&job_id) {
                Ok(lines) if lines.is_empty() => debug!("No logs available yet for job {}", job_id),
                Ok(lines) => {
                    for line in lines {
                        info!("[{}] {}", job_id, line);
                    }
                }
                Err(e) => debug!("Logs unavailable for job {}: {}", job_id, e),
            }

            if status.state.is_terminal() {
                if status.state == JobState::Completed {
                    info!("Job {} completed", job_id);
                } else {
                    warn!("Job {} ended as {:?}", job_id, status.state);
                }
                return Ok(JobOutcome::Finished(JobReport {
                    job_id,
                    status,
                    polls,
                    queued_for,
                    slow_start,
                }));
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("Endpoint error: {0}")]
    Endpoint(String),

    #[error("Endpoint accepted the job but returned no job id")]
    MissingJobId,
}
