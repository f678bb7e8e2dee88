use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};

use super::{health, JsonBody, ServiceError};
use crate::{
    algorithm::AlgorithmKind,
    api::{JobCreated, JobOutput, JobRequest, JobView},
    client::WorkerClient,
    job::JobStore,
    orchestrator::Orchestrator,
};

/// The orchestrator service, answering for the jobs of `orchestrator`.
pub fn router<K, C, S>(orchestrator: Orchestrator<K, C, S>) -> Router
where
    K: AlgorithmKind,
    C: WorkerClient,
    S: JobStore,
{
    Router::new()
        .route("/jobs", post(create_job::<K, C, S>))
        .route("/jobs/{job_id}", get(job_status::<K, C, S>))
        .route("/jobs/{job_id}/output", get(job_output::<K, C, S>))
        .route("/health", health("orchestrator"))
        .with_state(orchestrator)
}

async fn create_job<K, C, S>(
    State(orchestrator): State<Orchestrator<K, C, S>>,
    JsonBody(request): JsonBody<JobRequest>,
) -> Result<Json<JobCreated>, ServiceError>
where
    K: AlgorithmKind,
    C: WorkerClient,
    S: JobStore,
{
    Ok(Json(orchestrator.create_job(request).await?))
}

async fn job_status<K, C, S>(
    State(orchestrator): State<Orchestrator<K, C, S>>,
    Path(job_id): Path<String>,
) -> Result<Json<JobView>, ServiceError>
where
    K: AlgorithmKind,
    C: WorkerClient,
    S: JobStore,
{
    orchestrator
        .status(&job_id)
        .map(Json)
        .ok_or(ServiceError::JobNotFound)
}

async fn job_output<K, C, S>(
    State(orchestrator): State<Orchestrator<K, C, S>>,
    Path(job_id): Path<String>,
) -> Result<Json<JobOutput>, ServiceError>
where
    K: AlgorithmKind,
    C: WorkerClient,
    S: JobStore,
{
    Ok(Json(orchestrator.output(&job_id).await?))
}
