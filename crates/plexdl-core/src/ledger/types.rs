//! Types persisted in the job ledger.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

use super::LedgerError;
use crate::media::ServerIdentity;

/// Per-task status stored as a lowercase string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordering metadata; only used for filenames and display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceHints {
    pub season: u32,
    pub episode: u32,
}

impl fmt::Display for SequenceHints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{:02}E{:02}", self.season, self.episode)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Stable item id on the bound server (Plex ratingKey).
    pub id: String,
    pub display_name: String,
    pub sequence_hints: SequenceHints,
    pub status: TaskStatus,
}

impl Task {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        hints: SequenceHints,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            sequence_hints: hints,
            status: TaskStatus::Pending,
        }
    }

    /// `"S01E03 Title"`, or just the code when untitled.
    pub fn label(&self) -> String {
        if self.display_name.is_empty() {
            self.sequence_hints.to_string()
        } else {
            format!("{} {}", self.sequence_hints, self.display_name)
        }
    }
}

/// Counts by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobSummary {
    pub total: usize,
    pub pending: usize,
    pub completed: usize,
    pub failed: usize,
}

/// A download job: ordered tasks bound to one server and one destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub server_identity: ServerIdentity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_name: Option<String>,
    pub destination_folder: PathBuf,
    pub tasks: Vec<Task>,
}

impl Job {
    /// New job in selection order with every task `pending`.
    /// A repeated id keeps its first position.
    pub fn create(
        tasks: impl IntoIterator<Item = Task>,
        destination_folder: impl Into<PathBuf>,
        server_identity: ServerIdentity,
    ) -> Self {
        let mut seen = HashSet::new();
        let tasks = tasks
            .into_iter()
            .filter(|t| {
                let fresh = seen.insert(t.id.clone());
                if !fresh {
                    tracing::debug!("dropping repeated task id {}", t.id);
                }
                fresh
            })
            .map(|t| Task {
                status: TaskStatus::Pending,
                ..t
            })
            .collect();
        Self {
            server_identity,
            server_name: None,
            library_name: None,
            show_name: None,
            destination_folder: destination_folder.into(),
            tasks,
        }
    }

    /// Attach display-only names (server, library, show).
    pub fn with_labels(
        mut self,
        server_name: impl Into<String>,
        library_name: impl Into<String>,
        show_name: impl Into<String>,
    ) -> Self {
        self.server_name = Some(server_name.into());
        self.library_name = Some(library_name.into());
        self.show_name = Some(show_name.into());
        self
    }

    /// Record the result of task `index`. Only `pending` tasks may change.
    pub fn set_status(&mut self, index: usize, status: TaskStatus) -> Result<(), LedgerError> {
        let task = self
            .tasks
            .get_mut(index)
            .ok_or(LedgerError::NoSuchTask(index))?;
        if task.status != TaskStatus::Pending || status == TaskStatus::Pending {
            return Err(LedgerError::InvalidTransition {
                id: task.id.clone(),
                from: task.status,
                to: status,
            });
        }
        task.status = status;
        Ok(())
    }

    pub fn summary(&self) -> JobSummary {
        self.tasks.iter().fold(
            JobSummary {
                total: self.tasks.len(),
                ..JobSummary::default()
            },
            |mut s, t| {
                match t.status {
                    TaskStatus::Pending => s.pending += 1,
                    TaskStatus::Completed => s.completed += 1,
                    TaskStatus::Failed => s.failed += 1,
                }
                s
            },
        )
    }

    /// Structural checks applied to a loaded ledger.
    pub fn validate(&self) -> Result<(), LedgerError> {
        let mut seen = HashSet::new();
        for t in &self.tasks {
            if t.id.trim().is_empty() {
                return Err(LedgerError::EmptyTaskId);
            }
            if !seen.insert(t.id.as_str()) {
                return Err(LedgerError::DuplicateTask(t.id.clone()));
            }
        }
        Ok(())
    }
}
