//! Job driver: walks the ledger in order and downloads each pending task.
//!
//! Per-task failures (resolution, no media, request, empty body, disk) are
//! recorded as `failed` and the loop moves on. Cancellation is the only thing
//! that stops the loop early, and it leaves the in-flight task `pending` so
//! the next run resumes it from its partial file.

use crate::control::{CancelToken, Cancelled};
use crate::fetcher::{FetchRequest, Fetcher};
use crate::ledger::{Job, LedgerError, LedgerStore, TaskStatus};
use crate::media::MediaService;
use crate::progress::{Observer, RunEvent};

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Every task was visited.
    Finished,
    /// Stopped by the user; remaining tasks untouched.
    Interrupted,
}

/// Counts for one run (not for the whole job; see `Job::summary`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    pub state: RunState,
    /// Pending tasks this run started on, including an interrupted one.
    pub attempted: usize,
    pub completed: usize,
    pub failed: usize,
    /// Already completed before this run.
    pub skipped: usize,
    /// Failed in an earlier run; not retried.
    pub previously_failed: usize,
}

impl RunReport {
    fn new() -> Self {
        Self {
            state: RunState::Finished,
            attempted: 0,
            completed: 0,
            failed: 0,
            skipped: 0,
            previously_failed: 0,
        }
    }
}

pub struct JobDriver<'a> {
    service: &'a dyn MediaService,
    ledger: &'a dyn LedgerStore,
    fetcher: Fetcher,
}

impl<'a> JobDriver<'a> {
    pub fn new(
        service: &'a dyn MediaService,
        ledger: &'a dyn LedgerStore,
        fetcher: Fetcher,
    ) -> Self {
        Self {
            service,
            ledger,
            fetcher,
        }
    }

    /// Run `job` to the end or until `cancel` fires. The ledger is saved after
    /// each task whose status changed and at no other time. A ledger write
    /// failure stops the run with an error.
    pub fn run(
        &self,
        job: &mut Job,
        cancel: &CancelToken,
        observer: &mut dyn Observer,
    ) -> Result<RunReport, LedgerError> {
        let mut report = RunReport::new();
        tracing::info!(
            "running job on server {} with {} task(s)",
            job.server_identity,
            job.tasks.len()
        );

        for index in 0..job.tasks.len() {
            match job.tasks[index].status {
                TaskStatus::Completed => {
                    report.skipped += 1;
                    observer.on_run(RunEvent::Skipped {
                        task: &job.tasks[index],
                    });
                    continue;
                }
                TaskStatus::Failed => {
                    report.previously_failed += 1;
                    observer.on_run(RunEvent::PreviouslyFailed {
                        task: &job.tasks[index],
                    });
                    continue;
                }
                TaskStatus::Pending => {}
            }

            if cancel.is_cancelled() {
                report.state = RunState::Interrupted;
                break;
            }
            report.attempted += 1;

            let outcome = match self.service.resolve(&job.server_identity, &job.tasks[index].id) {
                Ok(resolved) => {
                    let request = FetchRequest::for_episode(&resolved, &job.destination_folder);
                    match self.fetcher.fetch(&request, cancel, observer) {
                        Ok(outcome) => Some(outcome),
                        Err(Cancelled) => {
                            tracing::info!("interrupted during '{}'", job.tasks[index].label());
                            observer.on_run(RunEvent::Interrupted {
                                task: &job.tasks[index],
                            });
                            report.state = RunState::Interrupted;
                            break;
                        }
                    }
                }
                Err(error) => {
                    tracing::error!(
                        "could not resolve '{}' (id={}): {}",
                        job.tasks[index].label(),
                        job.tasks[index].id,
                        error
                    );
                    observer.on_run(RunEvent::ResolveFailed {
                        task: &job.tasks[index],
                        error: &error,
                    });
                    None
                }
            };

            let status = match &outcome {
                Some(o) if o.is_complete() => TaskStatus::Completed,
                _ => TaskStatus::Failed,
            };
            job.set_status(index, status)?;
            self.ledger.save(job)?;

            match status {
                TaskStatus::Completed => report.completed += 1,
                _ => report.failed += 1,
            }
            if let Some(outcome) = &outcome {
                if !outcome.is_complete() {
                    tracing::warn!("'{}' failed: {}", job.tasks[index].label(), outcome);
                }
                observer.on_run(RunEvent::TaskFinished {
                    task: &job.tasks[index],
                    outcome,
                });
            }
        }

        tracing::info!(
            "run {:?}: attempted={} completed={} failed={} skipped={}",
            report.state,
            report.attempted,
            report.completed,
            report.failed,
            report.skipped
        );
        Ok(report)
    }
}
