//! Operator-facing output for a download run.

use plexdl_core::progress::{FetchEvent, Observer, RunEvent};
use std::io::Write;
use std::time::{Duration, Instant};

const PROGRESS_INTERVAL: Duration = Duration::from_millis(500);

/// Prints one line per event and a carriage-return progress line while bytes flow.
#[derive(Debug, Default)]
pub struct ConsoleObserver {
    last_progress: Option<Instant>,
    /// A `\r` progress line is open and needs a newline before the next message.
    line_open: bool,
}

impl ConsoleObserver {
    pub fn new() -> Self {
        Self::default()
    }

    fn line(&mut self, msg: &str) {
        if self.line_open {
            println!();
            self.line_open = false;
        }
        println!("{}", msg);
    }
}

impl Observer for ConsoleObserver {
    fn on_fetch(&mut self, event: FetchEvent<'_>) {
        match event {
            FetchEvent::AlreadyPresent { file_name } => {
                self.line(&format!("[SKIP] {} already exists.", file_name))
            }
            FetchEvent::NoMedia { file_name } => {
                self.line(&format!("[SKIP] No media for '{}'", file_name))
            }
            FetchEvent::Resuming { file_name, offset } => self.line(&format!(
                "[RESUME] {}: found partial with {} bytes, resuming.",
                file_name, offset
            )),
            FetchEvent::RangeIgnored { file_name, status } => self.line(&format!(
                "[RESUME] {}: server ignored the range (HTTP {}), starting over.",
                file_name, status
            )),
            FetchEvent::Started { file_name } => {
                self.last_progress = None;
                self.line(&format!("[DOWNLOADING] {}", file_name));
            }
            FetchEvent::Progress { file_name, stats } => {
                let now = Instant::now();
                let due = self
                    .last_progress
                    .map_or(true, |t| now.duration_since(t) >= PROGRESS_INTERVAL);
                let done = stats.total_bytes == Some(stats.bytes_done);
                if !(due || done) {
                    return;
                }
                self.last_progress = Some(now);
                let rate_mib = stats.bytes_per_sec() / 1_048_576.0;
                match stats.percent() {
                    Some(pct) => print!(
                        "\r  => {:.2}% of {}  {:.2} MiB/s  ",
                        pct, file_name, rate_mib
                    ),
                    None => print!(
                        "\r  => {:.1} MiB of {}  {:.2} MiB/s  ",
                        stats.bytes_done as f64 / 1_048_576.0,
                        file_name,
                        rate_mib
                    ),
                }
                let _ = std::io::stdout().flush();
                self.line_open = true;
            }
            FetchEvent::Finished { file_name, bytes } => {
                self.line(&format!("[DONE] {} ({} bytes)", file_name, bytes))
            }
            FetchEvent::Paused {
                file_name,
                bytes_on_disk,
            } => self.line(&format!(
                "[INTERRUPT] {} paused at {} bytes.",
                file_name, bytes_on_disk
            )),
        }
    }

    fn on_run(&mut self, event: RunEvent<'_>) {
        match event {
            RunEvent::Skipped { task } => {
                self.line(&format!("Skipping '{}', already completed.", task.label()))
            }
            RunEvent::PreviouslyFailed { task } => {
                self.line(&format!("Skipping '{}', failed in an earlier run.", task.label()))
            }
            RunEvent::ResolveFailed { task, error } => self.line(&format!(
                "[ERROR] Could not fetch episode '{}' => {}",
                task.label(),
                error
            )),
            RunEvent::TaskFinished { task, outcome } => {
                if !outcome.is_complete() {
                    self.line(&format!("[FAIL] {} => {}", task.label(), outcome));
                }
            }
            RunEvent::Interrupted { .. } => {
                self.line("[INTERRUPT] User cancelled. Partial progress saved.")
            }
        }
    }
}
