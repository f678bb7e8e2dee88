//! Transport from the orchestrator to its workers.
//!
//! The orchestrator never talks to a worker directly; it goes through a
//! [`WorkerClient`], addressing each worker by its base URL. Two
//! implementations are provided:
//! - [`HttpWorkers`]: JSON over HTTP with a fixed per-call timeout. Used in
//!   deployments.
//! - [`InMemoryWorkers`]: runs the mapper, partitioner and reducer logic
//!   in-process. Useful for testing and debugging, as it exercises the full
//!   pipeline without sockets.
use async_trait::async_trait;
use thiserror::Error;

use crate::api::{
    MapRequest, MapResponse, PartitionRequest, PartitionResponse, ReduceRequest, ReduceResponse,
};

/// Why a worker call did not produce a usable response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CallError {
    /// The worker answered with a non-success status.
    #[error("failed with status {status}: {body}")]
    Status { status: u16, body: String },
    /// The worker could not be reached or did not answer in time.
    #[error("unreachable: {0}")]
    Transport(String),
    /// The worker answered with a body that is not the expected payload.
    #[error("returned an invalid response: {0}")]
    InvalidResponse(String),
}

/// Calls into the worker services.
#[async_trait]
pub trait WorkerClient: Send + Sync + 'static {
    async fn map(&self, endpoint: &str, request: MapRequest) -> Result<MapResponse, CallError>;

    async fn partition(
        &self,
        endpoint: &str,
        request: PartitionRequest,
    ) -> Result<PartitionResponse, CallError>;

    async fn reduce(
        &self,
        endpoint: &str,
        request: ReduceRequest,
    ) -> Result<ReduceResponse, CallError>;
}

mod http;
mod in_memory;
pub use http::HttpWorkers;
pub use in_memory::InMemoryWorkers;
