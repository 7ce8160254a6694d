//! File-backed ledger store.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::{Job, LedgerError};

/// Where a job is persisted. The driver saves through this after every
/// status change; tests wrap it to count saves.
pub trait LedgerStore {
    /// `Ok(None)` when no job has been saved. A file that exists but does not
    /// parse or validate is an error, never silently dropped.
    fn load(&self) -> Result<Option<Job>, LedgerError>;
    fn save(&self, job: &Job) -> Result<(), LedgerError>;
    /// Delete the persisted job; a missing file is not an error.
    fn discard(&self) -> Result<(), LedgerError>;
}

/// Pretty-printed JSON ledger, e.g. `~/.local/state/plexdl/download_job.json`.
#[derive(Debug, Clone)]
pub struct JsonLedger {
    path: PathBuf,
}

impl JsonLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: io::Error) -> LedgerError {
        LedgerError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn staging_path(&self) -> PathBuf {
        let mut o = self.path.as_os_str().to_owned();
        o.push(".new");
        PathBuf::from(o)
    }
}

impl LedgerStore for JsonLedger {
    fn load(&self) -> Result<Option<Job>, LedgerError> {
        let bytes = match fs::read(&self.path) {
            Ok(b) => b,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_err(e)),
        };
        let job: Job = serde_json::from_slice(&bytes).map_err(|source| LedgerError::Parse {
            path: self.path.clone(),
            source,
        })?;
        job.validate()?;
        tracing::debug!(
            "loaded job with {} task(s) from {}",
            job.tasks.len(),
            self.path.display()
        );
        Ok(Some(job))
    }

    /// Write to a sibling file, fsync, then rename over the ledger so a crash
    /// mid-write leaves the previous version intact.
    fn save(&self, job: &Job) -> Result<(), LedgerError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
        }
        let json = serde_json::to_vec_pretty(job).map_err(|source| LedgerError::Parse {
            path: self.path.clone(),
            source,
        })?;
        let staging = self.staging_path();
        let write = || -> io::Result<()> {
            let mut f = fs::File::create(&staging)?;
            f.write_all(&json)?;
            f.write_all(b"\n")?;
            f.sync_all()?;
            fs::rename(&staging, &self.path)
        };
        write().map_err(|e| self.io_err(e))?;
        tracing::debug!("saved job to {}", self.path.display());
        Ok(())
    }

    fn discard(&self) -> Result<(), LedgerError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::info!("discarded job {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_err(e)),
        }
    }
}
