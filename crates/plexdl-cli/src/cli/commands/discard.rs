//! `plexdl discard` – delete the saved job.

use anyhow::Result;
use plexdl_core::ledger::{JsonLedger, LedgerStore};
use std::path::Path;

/// Removes the ledger only; downloaded and partial files stay where they are.
pub fn run_discard(job_path: &Path) -> Result<()> {
    if !job_path.exists() {
        println!("No saved job at {}.", job_path.display());
        return Ok(());
    }
    JsonLedger::new(job_path).discard()?;
    println!("Discarded job {}.", job_path.display());
    Ok(())
}
