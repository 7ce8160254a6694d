//! `plexdl download` – create or resume a job, then run it.

use anyhow::{anyhow, bail, Context, Result};
use plexdl_core::config::{self, PlexdlConfig};
use plexdl_core::control::{self, CancelToken};
use plexdl_core::driver::{JobDriver, RunReport, RunState};
use plexdl_core::fetcher::Fetcher;
use plexdl_core::ledger::{Job, JobSummary, JsonLedger, LedgerStore};
use plexdl_core::plex::{PlexAccount, PlexServer};
use std::io::{self, BufRead, Write};
use std::path::Path;

use crate::cli::console::ConsoleObserver;
use crate::cli::prompt::Prompter;
use crate::cli::select;

/// How to treat a saved job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartMode {
    /// Ask when a job exists, otherwise create one.
    Ask,
    New,
    Resume,
}

impl StartMode {
    pub fn from_flags(new: bool, resume: bool) -> Self {
        match (new, resume) {
            (true, _) => StartMode::New,
            (_, true) => StartMode::Resume,
            _ => StartMode::Ask,
        }
    }
}

pub fn run_download(cfg: &PlexdlConfig, job_path: &Path, mode: StartMode) -> Result<()> {
    let mut p = Prompter::new(io::stdin().lock(), io::stdout());
    let token = ensure_token(cfg, &mut p)?;
    let account = PlexAccount::new(&token, &cfg.client_identifier, cfg.transfer.connect_timeout());
    let ledger = JsonLedger::new(job_path);

    let saved = ledger
        .load()
        .with_context(|| format!("load job {}", job_path.display()))?;
    let (mut job, server) = match choose_saved(saved, mode, &mut p)? {
        Some(job) => {
            let server = rebind(&account, &job)?;
            (job, server)
        }
        None => match select::create_job(&mut p, &account, &cfg.download_dir)? {
            Some((job, server)) => {
                ledger.save(&job)?;
                tracing::info!(
                    "created job with {} task(s) at {}",
                    job.tasks.len(),
                    ledger.path().display()
                );
                (job, server)
            }
            None => {
                p.say("No job available. Exiting.")?;
                return Ok(());
            }
        },
    };

    let cancel = CancelToken::new();
    if let Err(e) = control::install_interrupt_handler(&cancel) {
        tracing::warn!("could not install Ctrl+C handler: {}", e);
    }

    p.say(&format!(
        "\nStarting or continuing job with {} episode(s).",
        job.tasks.len()
    ))?;
    let driver = JobDriver::new(&server, &ledger, Fetcher::new(cfg.transfer.clone()));
    let report = driver.run(&mut job, &cancel, &mut ConsoleObserver::new())?;

    p.say(&run_summary(&report, &job.summary()))?;
    Ok(())
}

/// Closing line for a run: this run's counts, then the job totals.
fn run_summary(report: &RunReport, summary: &JobSummary) -> String {
    match report.state {
        RunState::Finished => format!(
            "All downloads attempted: {} this run ({} completed, {} failed). \
             Job: {} completed, {} failed, {} pending.",
            report.attempted,
            report.completed,
            report.failed,
            summary.completed,
            summary.failed,
            summary.pending
        ),
        RunState::Interrupted => format!(
            "Stopped after attempting {} task(s); {} pending. \
             Run `plexdl download --resume` to continue where this left off.",
            report.attempted, summary.pending
        ),
    }
}

/// Saved job to continue, or `None` to build a new one.
fn choose_saved<R: BufRead, W: Write>(
    saved: Option<Job>,
    mode: StartMode,
    p: &mut Prompter<R, W>,
) -> Result<Option<Job>> {
    match (saved, mode) {
        (_, StartMode::New) => Ok(None),
        (None, StartMode::Resume) => bail!("no saved job to resume"),
        (Some(job), StartMode::Resume) => Ok(Some(job)),
        (None, StartMode::Ask) => Ok(None),
        (Some(job), StartMode::Ask) => {
            p.say("A download job already exists! Resume (R) or create new (N)?")?;
            let answer = p.ask_or("Enter R or N [R]: ", "r")?;
            if answer.eq_ignore_ascii_case("n") {
                p.say("Starting a brand new job.")?;
                Ok(None)
            } else {
                p.say("Resuming existing download job.")?;
                Ok(Some(job))
            }
        }
    }
}

/// Reconnect to the server the job was created against.
fn rebind(account: &PlexAccount, job: &Job) -> Result<PlexServer> {
    account
        .find_server(&job.server_identity)?
        .ok_or_else(|| {
            anyhow!(
                "could not find the shared server with clientIdentifier={}",
                job.server_identity
            )
        })
}

/// Configured token, or one read from the operator and saved to the config file.
fn ensure_token<R: BufRead, W: Write>(
    cfg: &PlexdlConfig,
    p: &mut Prompter<R, W>,
) -> Result<String> {
    if let Some(token) = cfg.token() {
        return Ok(token.to_string());
    }
    p.say("No Plex token configured.")?;
    let token = p.ask("Enter your existing Plex token: ")?;
    if token.is_empty() {
        bail!("cannot proceed without a Plex token");
    }
    let path = config::config_path()?;
    let updated = PlexdlConfig {
        token: Some(token.clone()),
        ..cfg.clone()
    };
    config::save_at(&updated, &path)?;
    p.say(&format!("Saved token to {}.", path.display()))?;
    Ok(token)
}
