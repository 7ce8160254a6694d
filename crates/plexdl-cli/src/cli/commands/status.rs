//! `plexdl status` – show the saved job.

use anyhow::{Context, Result};
use plexdl_core::ledger::{Job, JsonLedger, LedgerStore};
use std::path::Path;

pub fn run_status(job_path: &Path) -> Result<()> {
    let ledger = JsonLedger::new(job_path);
    let job = ledger
        .load()
        .with_context(|| format!("load job {}", job_path.display()))?;
    match job {
        None => println!("No saved job at {}.", job_path.display()),
        Some(job) => print!("{}", render(&job)),
    }
    Ok(())
}

fn render(job: &Job) -> String {
    let mut out = String::new();
    let server = job
        .server_name
        .as_deref()
        .map(|n| format!("{} ({})", n, job.server_identity))
        .unwrap_or_else(|| job.server_identity.to_string());
    out.push_str(&format!("Server:      {}\n", server));
    if let Some(library) = &job.library_name {
        out.push_str(&format!("Library:     {}\n", library));
    }
    if let Some(show) = &job.show_name {
        out.push_str(&format!("Show:        {}\n", show));
    }
    out.push_str(&format!("Destination: {}\n\n", job.destination_folder.display()));

    out.push_str(&format!("{:<4} {:<10} {:<10} {}\n", "#", "STATUS", "ID", "EPISODE"));
    for (i, t) in job.tasks.iter().enumerate() {
        out.push_str(&format!(
            "{:<4} {:<10} {:<10} {}\n",
            i + 1,
            t.status.as_str(),
            t.id,
            t.label()
        ));
    }
    let s = job.summary();
    out.push_str(&format!(
        "\n{} task(s): {} completed, {} failed, {} pending\n",
        s.total, s.completed, s.failed, s.pending
    ));
    out
}
