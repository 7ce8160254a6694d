//! CLI for plexdl, the resumable Plex shared-library downloader.

mod commands;
mod console;
mod prompt;
mod select;

use anyhow::Result;
use clap::{Parser, Subcommand};
use plexdl_core::config;
use std::path::PathBuf;

use commands::{run_discard, run_download, run_status, StartMode};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "plexdl")]
#[command(about = "plexdl: resumable downloads from shared Plex libraries", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Create a download job interactively, or continue the saved one.
    Download {
        /// Start a new job even if one is saved (replaces it).
        #[arg(long, conflicts_with = "resume")]
        new: bool,
        /// Continue the saved job without asking.
        #[arg(long)]
        resume: bool,
        /// Job ledger to use instead of the configured one.
        #[arg(long, value_name = "PATH")]
        job_file: Option<PathBuf>,
    },

    /// Show the saved job and the status of each episode.
    Status {
        #[arg(long, value_name = "PATH")]
        job_file: Option<PathBuf>,
    },

    /// Delete the saved job. Downloaded and partial files are left alone.
    Discard {
        #[arg(long, value_name = "PATH")]
        job_file: Option<PathBuf>,
    },
}

impl CliCommand {
    pub fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!(
            "loaded config (client_identifier={}, download_dir={})",
            cfg.client_identifier,
            cfg.download_dir.display()
        );

        let ledger_path = |over: Option<PathBuf>| match over {
            Some(p) => Ok(p),
            None => cfg.job_file_path(),
        };

        match cli.command {
            CliCommand::Download {
                new,
                resume,
                job_file,
            } => {
                let mode = StartMode::from_flags(new, resume);
                let path = ledger_path(job_file)?;
                run_download(&cfg, &path, mode)?;
            }
            CliCommand::Status { job_file } => run_status(&ledger_path(job_file)?)?,
            CliCommand::Discard { job_file } => run_discard(&ledger_path(job_file)?)?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
