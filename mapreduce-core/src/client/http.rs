use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, instrument};

use super::{CallError, WorkerClient};
use crate::api::{
    MapRequest, MapResponse, PartitionRequest, PartitionResponse, ReduceRequest, ReduceResponse,
};

/// A [`WorkerClient`] speaking JSON over HTTP.
///
/// The underlying [`reqwest::Client`] pools connections, so one instance
/// should be shared by every job of an orchestrator.
#[derive(Debug, Clone)]
pub struct HttpWorkers {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpWorkers {
    /// Create a client whose every call fails after `timeout`.
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn post<Req, Resp>(
        &self,
        endpoint: &str,
        path: &str,
        request: &Req,
    ) -> Result<Resp, CallError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let url = format!("{}{path}", endpoint.trim_end_matches('/'));
        debug!(%url, "calling worker");

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|err| self.transport_error(err))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CallError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response.json::<Resp>().await.map_err(|err| {
            if err.is_timeout() {
                self.transport_error(err)
            } else {
                CallError::InvalidResponse(err.to_string())
            }
        })
    }

    fn transport_error(&self, err: reqwest::Error) -> CallError {
        if err.is_timeout() {
            CallError::Transport(format!("timed out after {:?}", self.timeout))
        } else {
            CallError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl WorkerClient for HttpWorkers {
    #[instrument(skip(self, request), fields(lines = request.data_lines.len()), level = "debug")]
    async fn map(&self, endpoint: &str, request: MapRequest) -> Result<MapResponse, CallError> {
        self.post(endpoint, "/map", &request).await
    }

    #[instrument(
        skip(self, request),
        fields(records = request.all_mapped_data.len()),
        level = "debug"
    )]
    async fn partition(
        &self,
        endpoint: &str,
        request: PartitionRequest,
    ) -> Result<PartitionResponse, CallError> {
        self.post(endpoint, "/partition", &request).await
    }

    #[instrument(
        skip(self, request),
        fields(records = request.partitioned_data.len()),
        level = "debug"
    )]
    async fn reduce(
        &self,
        endpoint: &str,
        request: ReduceRequest,
    ) -> Result<ReduceResponse, CallError> {
        self.post(endpoint, "/reduce", &request).await
    }
}
