//! Algorithm error types.
//!
//! Two flavors of failure are distinguished. A [`PluginContractError`] means
//! the requested algorithm cannot be used at all, which is the caller's fault
//! and is reported as a bad request. An [`ExecutionError`] means the algorithm
//! was found but one of its functions failed or panicked while running.
use thiserror::Error;

/// The requested plugin cannot satisfy the contract.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PluginContractError {
    #[error("unknown algorithm `{name}` (registered: {})", .registered.join(", "))]
    UnknownAlgorithm {
        name: String,
        registered: Vec<&'static str>,
    },
}

/// A plugin function failed while executing.
#[derive(Error, Debug)]
pub enum ExecutionError {
    /// The function returned an error.
    #[error("{0:#}")]
    Failed(anyhow::Error),
    /// The function panicked.
    #[error("algorithm panicked: {0}")]
    Panicked(String),
}
