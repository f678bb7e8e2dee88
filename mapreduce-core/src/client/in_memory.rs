use std::{collections::HashSet, marker::PhantomData};

use async_trait::async_trait;
use dashmap::DashMap;

use super::{CallError, WorkerClient};
use crate::{
    algorithm::AlgorithmKind,
    api::{
        ErrorBody, MapRequest, MapResponse, PartitionRequest, PartitionResponse, ReduceRequest,
        ReduceResponse,
    },
    mapper::map_chunk,
    partition::partition_records,
    reducer::reduce_partition,
    service::ServiceError,
};

/// A [`WorkerClient`] that runs every worker in-process.
///
/// Endpoints are only used as labels: every mapper, partitioner and reducer
/// URL is served by the same local logic. Failures are reported with the
/// status codes the HTTP services would answer with. Endpoints registered
/// with [`InMemoryWorkers::with_unreachable`] fail as if the worker were
/// down.
#[derive(Debug)]
pub struct InMemoryWorkers<K> {
    unreachable: HashSet<String>,
    calls: DashMap<String, usize>,
    _kind: PhantomData<fn() -> K>,
}

impl<K> Default for InMemoryWorkers<K> {
    fn default() -> Self {
        Self {
            unreachable: HashSet::new(),
            calls: DashMap::new(),
            _kind: PhantomData,
        }
    }
}

impl<K: AlgorithmKind> InMemoryWorkers<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call to `endpoint` fail with a transport error.
    pub fn with_unreachable(mut self, endpoint: impl Into<String>) -> Self {
        self.unreachable.insert(endpoint.into());
        self
    }

    /// Number of calls addressed to `endpoint` so far, failed ones included.
    pub fn calls(&self, endpoint: &str) -> usize {
        self.calls.get(endpoint).map(|count| *count).unwrap_or(0)
    }

    fn dial(&self, endpoint: &str) -> Result<(), CallError> {
        *self.calls.entry(endpoint.to_string()).or_insert(0) += 1;
        if self.unreachable.contains(endpoint) {
            return Err(CallError::Transport(format!(
                "connection to {endpoint} refused"
            )));
        }
        Ok(())
    }
}

fn rejected(err: impl Into<ServiceError>) -> CallError {
    let err = err.into();
    let body = ErrorBody {
        detail: err.to_string(),
    };
    CallError::Status {
        status: err.status().as_u16(),
        body: serde_json::to_string(&body).unwrap_or(body.detail),
    }
}

#[async_trait]
impl<K: AlgorithmKind> WorkerClient for InMemoryWorkers<K> {
    async fn map(&self, endpoint: &str, request: MapRequest) -> Result<MapResponse, CallError> {
        self.dial(endpoint)?;
        let mapped_data = map_chunk::<K>(&request.algorithm_path, request.data_lines)
            .await
            .map_err(rejected)?;
        Ok(MapResponse {
            total_records: mapped_data.len(),
            mapped_data,
        })
    }

    async fn partition(
        &self,
        endpoint: &str,
        request: PartitionRequest,
    ) -> Result<PartitionResponse, CallError> {
        self.dial(endpoint)?;
        partition_records(request.all_mapped_data, request.num_partitions).map_err(rejected)
    }

    async fn reduce(
        &self,
        endpoint: &str,
        request: ReduceRequest,
    ) -> Result<ReduceResponse, CallError> {
        self.dial(endpoint)?;
        let reduced_data = reduce_partition::<K>(&request.algorithm_path, request.partitioned_data)
            .await
            .map_err(rejected)?;
        Ok(ReduceResponse {
            total_records: reduced_data.len(),
            reduced_data,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::testing::TestAlgorithms;

    #[tokio::test]
    async fn it_reports_failures_like_the_services() {
        let workers = InMemoryWorkers::<TestAlgorithms>::new().with_unreachable("http://down");

        let err = workers
            .map(
                "http://m0",
                MapRequest {
                    algorithm_path: "missing".into(),
                    data_lines: vec!["a".into()],
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CallError::Status { status: 400, ref body } if body.contains("unknown algorithm")
        ));

        let err = workers
            .map(
                "http://m0",
                MapRequest {
                    algorithm_path: "count".into(),
                    data_lines: vec!["poison".into()],
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CallError::Status { status: 500, .. }));

        let err = workers
            .partition(
                "http://down",
                PartitionRequest {
                    all_mapped_data: vec![],
                    num_partitions: 1,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CallError::Transport(_)));

        assert_eq!(workers.calls("http://m0"), 2);
        assert_eq!(workers.calls("http://down"), 1);
        assert_eq!(workers.calls("http://never"), 0);
    }

    #[tokio::test]
    async fn it_runs_each_phase_in_process() {
        let workers = InMemoryWorkers::<TestAlgorithms>::new();

        let mapped = workers
            .map(
                "http://m0",
                MapRequest {
                    algorithm_path: "count".into(),
                    data_lines: vec!["a b a".into()],
                },
            )
            .await
            .unwrap();
        assert_eq!(mapped.total_records, 3);

        let assignment = workers
            .partition(
                "http://p",
                PartitionRequest {
                    all_mapped_data: mapped.mapped_data,
                    num_partitions: 1,
                },
            )
            .await
            .unwrap();
        assert_eq!(assignment.partition_counts.get(&0), Some(&3));

        let reduced = workers
            .reduce(
                "http://r0",
                ReduceRequest {
                    algorithm_path: "count".into(),
                    partitioned_data: vec!["a\t1".into(), "a\t1".into(), "b\t1".into()],
                },
            )
            .await
            .unwrap();
        assert_eq!(reduced.reduced_data, vec!["a\t2", "b\t1"]);
    }
}
