//! JSON payloads exchanged between the services.
//!
//! Field names are camelCase on the wire. The `algorithmPath` field of mapper
//! and reducer requests carries the name under which the algorithm is
//! registered in the services' [`AlgorithmKind`](crate::algorithm::AlgorithmKind).
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use crate::partition::PartitionAssignment as PartitionResponse;
use crate::job::{Job, JobStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapRequest {
    pub algorithm_path: String,
    pub data_lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapResponse {
    pub mapped_data: Vec<String>,
    pub total_records: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitionRequest {
    pub all_mapped_data: Vec<String>,
    pub num_partitions: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReduceRequest {
    pub algorithm_path: String,
    pub partitioned_data: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReduceResponse {
    pub reduced_data: Vec<String>,
    pub total_records: usize,
}

/// A job submission.
///
/// Every field is optional on the wire so that missing fields are reported
/// by submission validation as a client error rather than as a
/// deserialization failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRequest {
    pub algorithm: Option<String>,
    pub input_file: Option<String>,
    pub num_reducers: Option<usize>,
    pub mapper_urls: Option<Vec<String>>,
    pub reducer_urls: Option<Vec<String>>,
    pub partitioner_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobCreated {
    pub job_id: String,
    pub status: JobStatus,
    pub message: String,
}

/// The externally visible state of a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobView {
    pub job_id: String,
    pub status: JobStatus,
    pub progress: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_preview: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition_counts: Option<BTreeMap<usize, usize>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&Job> for JobView {
    fn from(job: &Job) -> Self {
        Self {
            job_id: job.id.clone(),
            status: job.status,
            progress: job.progress.clone(),
            result_preview: job.result_preview.clone(),
            partition_counts: job.partition_counts.clone(),
            error: job.error.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobOutput {
    pub job_id: String,
    pub file_name: String,
    pub output: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    pub service: String,
}

impl Health {
    pub fn healthy(service: &str) -> Self {
        Self {
            status: "healthy".to_string(),
            service: service.to_string(),
        }
    }
}

/// Body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}
