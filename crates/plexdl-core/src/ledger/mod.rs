//! Persistent job ledger (JSON file).
//!
//! Stores the ordered task list with per-task status, the server binding and
//! the destination folder. Rewritten whole after every status change so a
//! killed process loses at most the bytes of the in-flight task, which stay
//! resumable through the partial file.

pub mod store;
pub mod types;

pub use store::{JsonLedger, LedgerStore};
pub use types::*;

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("ledger I/O at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid ledger {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("ledger lists task id {0} more than once")]
    DuplicateTask(String),
    #[error("ledger contains a task with an empty id")]
    EmptyTaskId,
    #[error("no task at position {0}")]
    NoSuchTask(usize),
    #[error("task {id} cannot go from {from} to {to}")]
    InvalidTransition {
        id: String,
        from: TaskStatus,
        to: TaskStatus,
    },
}
