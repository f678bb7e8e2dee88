//! Job records and their lifecycle.
//!
//! A [`Job`] is created `pending` at submission, moves to `running` when its
//! pipeline task starts, and ends in exactly one of `completed` or `failed`.
//! Terminal states are absorbing: [`Job::transition`] refuses to leave them.
use std::{collections::BTreeMap, fmt};

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of output lines kept on a completed job as a preview.
pub const PREVIEW_LINES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Running)
                | (Self::Running, Self::Completed)
                | (Self::Running, Self::Failed)
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(status)
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("illegal job transition {from} -> {to}")]
pub struct IllegalTransition {
    pub from: JobStatus,
    pub to: JobStatus,
}

/// What a successful pipeline leaves on its job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub result_preview: Vec<String>,
    pub partition_counts: BTreeMap<usize, usize>,
    pub output_file: String,
}

/// The orchestrator's record of one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: String,
    pub status: JobStatus,
    pub progress: String,
    pub result_preview: Option<Vec<String>>,
    pub partition_counts: Option<BTreeMap<usize, usize>>,
    pub output_file: Option<String>,
    pub error: Option<String>,
}

impl Job {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: JobStatus::Pending,
            progress: "Job created".to_string(),
            result_preview: None,
            partition_counts: None,
            output_file: None,
            error: None,
        }
    }

    /// Move to `next`, refusing any step outside
    /// pending → running → {completed | failed}.
    pub fn transition(&mut self, next: JobStatus) -> Result<(), IllegalTransition> {
        if !self.status.can_transition_to(next) {
            return Err(IllegalTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    pub fn start(&mut self) -> Result<(), IllegalTransition> {
        self.transition(JobStatus::Running)?;
        self.progress = "Job started".to_string();
        Ok(())
    }

    pub fn complete(&mut self, completion: Completion) -> Result<(), IllegalTransition> {
        self.transition(JobStatus::Completed)?;
        self.progress = "Job completed".to_string();
        self.result_preview = Some(completion.result_preview);
        self.partition_counts = Some(completion.partition_counts);
        self.output_file = Some(completion.output_file);
        Ok(())
    }

    pub fn fail(&mut self, error: impl Into<String>) -> Result<(), IllegalTransition> {
        self.transition(JobStatus::Failed)?;
        self.progress = "Job failed".to_string();
        self.error = Some(error.into());
        Ok(())
    }

    /// Update the progress note of a job that has not finished yet.
    pub fn note(&mut self, progress: impl Into<String>) {
        if !self.status.is_terminal() {
            self.progress = progress.into();
        }
    }
}

/// `job_` followed by the submission time at second resolution.
pub fn timestamp_id<Tz>(at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    format!("job_{}", at.format("%Y%m%d_%H%M%S"))
}

mod store;
pub use store::*;
