//! Progress and event reporting from the fetcher and the driver.
//!
//! Used to report transfer progress and per-task outcomes to the CLI;
//! nothing here affects correctness. Consumers can compute
//! rate = bytes_done / elapsed_secs and percent from `fraction()`.

use crate::fetcher::Outcome;
use crate::ledger::Task;
use crate::media::ResolveError;

/// Snapshot of one transfer (CLI-friendly).
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressStats {
    /// Bytes on disk for this file, including a resumed prefix.
    pub bytes_done: u64,
    /// Full size of the remote file when the response told us.
    pub total_bytes: Option<u64>,
    /// Elapsed time since this request started (seconds).
    pub elapsed_secs: f64,
    /// Bytes that were already on disk when the request started.
    pub resumed_from: u64,
}

impl ProgressStats {
    /// Transfer rate for this request in bytes per second (0 if elapsed is 0).
    pub fn bytes_per_sec(&self) -> f64 {
        if self.elapsed_secs <= 0.0 {
            return 0.0;
        }
        self.bytes_done.saturating_sub(self.resumed_from) as f64 / self.elapsed_secs
    }

    /// Fraction complete in [0.0, 1.0]; `None` when the total is unknown or zero.
    pub fn fraction(&self) -> Option<f64> {
        match self.total_bytes {
            Some(total) if total > 0 => Some((self.bytes_done as f64 / total as f64).min(1.0)),
            _ => None,
        }
    }

    pub fn percent(&self) -> Option<f64> {
        self.fraction().map(|f| f * 100.0)
    }
}

/// Fetcher-side events for one file.
#[derive(Debug)]
pub enum FetchEvent<'a> {
    /// Final file already on disk; nothing fetched.
    AlreadyPresent { file_name: &'a str },
    NoMedia { file_name: &'a str },
    Resuming { file_name: &'a str, offset: u64 },
    /// Server answered a ranged request without partial content; restarting at 0.
    RangeIgnored { file_name: &'a str, status: u32 },
    Started { file_name: &'a str },
    Progress { file_name: &'a str, stats: &'a ProgressStats },
    Finished { file_name: &'a str, bytes: u64 },
    /// Transfer stopped by the user; the partial file stays for the next run.
    Paused { file_name: &'a str, bytes_on_disk: u64 },
}

/// Driver-side events for one task.
#[derive(Debug)]
pub enum RunEvent<'a> {
    Skipped { task: &'a Task },
    PreviouslyFailed { task: &'a Task },
    ResolveFailed { task: &'a Task, error: &'a ResolveError },
    TaskFinished { task: &'a Task, outcome: &'a Outcome },
    Interrupted { task: &'a Task },
}

/// Receives fetch and run events. Every method defaults to a no-op.
pub trait Observer {
    fn on_fetch(&mut self, _event: FetchEvent<'_>) {}
    fn on_run(&mut self, _event: RunEvent<'_>) {}
}

/// Observer that ignores everything (tests, scripted use).
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl Observer for Silent {}
