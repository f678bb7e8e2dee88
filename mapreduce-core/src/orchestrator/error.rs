//! Orchestrator error types.
//!
//! - [`ClientRequestError`]: the submission itself is unusable. Reported
//!   synchronously, before any job record exists.
//! - [`PhaseError`]: a worker call of the map, partition or reduce phase
//!   failed. Fatal to the job; the failing call is never retried.
//! - [`OutputError`]: a result query that cannot be answered.
//!
//! Failures of the optional aggregate step are not represented here: they are
//! logged and the unaggregated output is used instead.
use std::{fmt, path::PathBuf};

use thiserror::Error;

use crate::{algorithm::PluginContractError, client::CallError};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientRequestError {
    #[error("No {0} provided in job payload")]
    MissingField(&'static str),
    #[error(transparent)]
    UnknownAlgorithm(#[from] PluginContractError),
    #[error("numReducers must be at least 1")]
    NoReducers,
    #[error("numReducers is {requested} but only {available} reducerUrls were provided")]
    NotEnoughReducers { requested: usize, available: usize },
    #[error("Input file not found: {}", .0.display())]
    DatasetNotFound(PathBuf),
    #[error("Input path is not a file: {}", .0.display())]
    NotAFile(PathBuf),
    #[error("Input file cannot be read: {}: {reason}", .path.display())]
    DatasetUnreadable { path: PathBuf, reason: String },
    #[error("Input file is empty or contains only blank lines: {}", .0.display())]
    EmptyDataset(PathBuf),
}

/// The pipeline phase a worker call belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Map { mapper: usize },
    Partition,
    Reduce { reducer: usize },
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Map { mapper } => write!(f, "Mapper service {mapper}"),
            Self::Partition => f.write_str("Partitioner service"),
            Self::Reduce { reducer } => write!(f, "Reducer service {reducer}"),
        }
    }
}

/// A worker call that aborted its phase.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{phase} at {endpoint} {cause}")]
pub struct PhaseError {
    pub phase: Phase,
    pub endpoint: String,
    pub cause: CallError,
}

impl PhaseError {
    pub fn new(phase: Phase, endpoint: impl Into<String>, cause: CallError) -> Self {
        Self {
            phase,
            endpoint: endpoint.into(),
            cause,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OutputError {
    #[error("Job not found")]
    JobNotFound,
    #[error("Output file not found for this job")]
    NotReady,
    #[error("Output file does not exist")]
    Missing,
}
