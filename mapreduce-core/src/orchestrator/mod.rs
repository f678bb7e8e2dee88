//! Job coordination.
//!
//! The [`Orchestrator`] accepts job submissions, runs one background pipeline
//! per job and answers status and output queries. A pipeline executes the
//! phases below strictly one after the other; every call of a phase has
//! returned before the next phase starts.
//!
//! 1. **Map**: the dataset is split into one contiguous chunk per mapper and
//!    every chunk is mapped concurrently.
//! 2. **Partition**: the concatenated mapper output is bucketed into
//!    `numReducers` partitions by a single partitioner call. Before that call
//!    the orchestrator stably sorts the records by key, so that each reducer
//!    sees every key as one contiguous run. `--preserve-emission-order`
//!    (`Settings::sort_by_key = false`) skips the sort and forwards records in
//!    mapper emission order.
//! 3. **Reduce**: partition `i` is reduced by reducer `i`, all concurrently.
//! 4. **Aggregate**: the reducer outputs, concatenated in reducer order, are
//!    passed through the algorithm's optional aggregate step. Failures there
//!    are logged and the concatenation is kept.
//! 5. **Persist**: the final lines are written to the job's output artifact.
//!
//! Any failing worker call fails the job with a [`PhaseError`] that names the
//! phase and endpoint. Nothing is retried.
use std::{marker::PhantomData, path::PathBuf, sync::Arc};

use anyhow::Result;
use chrono::Local;
use futures::future::join_all;
use tracing::{debug, error, info, instrument, warn};

use crate::{
    algorithm::{execute_blocking, resolve, AlgorithmKind},
    api::{
        JobCreated, JobOutput, JobRequest, JobView, MapRequest, PartitionRequest, ReduceRequest,
    },
    client::{CallError, HttpWorkers, WorkerClient},
    config::OrchestratorConfig,
    job::{
        timestamp_id, Completion, IllegalTransition, InMemoryJobStore, Job, JobStatus, JobStore,
        PREVIEW_LINES,
    },
    output::OutputDir,
    partition::PartitionAssignment,
    record::key_of,
};

mod chunk;
mod error;
mod ingest;
pub use chunk::split_chunks;
pub use error::*;
pub use ingest::{load, resolve_path, Dataset};

/// Orchestrator settings that do not depend on the worker transport.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Directory relative `inputFile` paths are resolved against.
    pub data_dir: PathBuf,
    /// Directory output artifacts are written to.
    pub output_dir: PathBuf,
    /// Stably sort mapped records by key before partitioning.
    pub sort_by_key: bool,
}

impl From<&OrchestratorConfig> for Settings {
    fn from(config: &OrchestratorConfig) -> Self {
        Self {
            data_dir: config.data_dir.clone(),
            output_dir: config.output_dir.clone(),
            sort_by_key: !config.preserve_emission_order,
        }
    }
}

struct Inner<C, S> {
    workers: C,
    store: S,
    output: OutputDir,
    data_dir: PathBuf,
    sort_by_key: bool,
}

/// Coordinates jobs over the algorithms registered in `K`, reaching workers
/// through `C` and keeping job records in `S`.
pub struct Orchestrator<K, C, S = InMemoryJobStore> {
    inner: Arc<Inner<C, S>>,
    _kind: PhantomData<fn() -> K>,
}

impl<K, C, S> Clone for Orchestrator<K, C, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            _kind: PhantomData,
        }
    }
}

/// A submission that passed validation and ingest.
#[derive(Debug)]
struct Plan<K> {
    algorithm: K,
    dataset: Dataset,
    num_reducers: usize,
    mapper_urls: Vec<String>,
    reducer_urls: Vec<String>,
    partitioner_url: String,
}

impl<K: AlgorithmKind> Orchestrator<K, HttpWorkers, InMemoryJobStore> {
    /// An orchestrator reaching its workers over HTTP, keeping jobs in memory.
    pub fn from_config(config: &OrchestratorConfig) -> Result<Self> {
        let workers = HttpWorkers::new(config.worker_timeout())?;
        let orchestrator = Self::new(workers, InMemoryJobStore::new(), config.into());
        info!(
            worker_timeout = ?orchestrator.workers().timeout(),
            output_dir = %orchestrator.inner.output.root().display(),
            sort_by_key = orchestrator.inner.sort_by_key,
            "orchestrator configured"
        );
        Ok(orchestrator)
    }
}

impl<K, C, S> Orchestrator<K, C, S>
where
    K: AlgorithmKind,
    C: WorkerClient,
    S: JobStore,
{
    pub fn new(workers: C, store: S, settings: Settings) -> Self {
        Self {
            inner: Arc::new(Inner {
                workers,
                store,
                output: OutputDir::new(settings.output_dir),
                data_dir: settings.data_dir,
                sort_by_key: settings.sort_by_key,
            }),
            _kind: PhantomData,
        }
    }

    pub fn workers(&self) -> &C {
        &self.inner.workers
    }

    pub fn store(&self) -> &S {
        &self.inner.store
    }

    /// Validate and ingest a submission, register it as a `pending` job and
    /// start its pipeline in the background.
    ///
    /// Returns as soon as the job is registered. Nothing is registered when
    /// the submission is rejected.
    #[instrument(skip_all, fields(algorithm = request.algorithm.as_deref()))]
    pub async fn create_job(&self, request: JobRequest) -> Result<JobCreated, ClientRequestError> {
        let plan = self.plan(request).await?;
        let job_id = self.register();
        info!(
            %job_id,
            input = %plan.dataset.path.display(),
            lines = plan.dataset.lines.len(),
            mappers = plan.mapper_urls.len(),
            reducers = plan.num_reducers,
            "job queued"
        );

        tokio::spawn(self.clone().run(job_id.clone(), plan));

        Ok(JobCreated {
            job_id,
            status: JobStatus::Pending,
            message: "Job queued".to_string(),
        })
    }

    pub fn status(&self, job_id: &str) -> Option<JobView> {
        self.inner.store.get(job_id).map(|job| JobView::from(&job))
    }

    /// The content of a completed job's output artifact.
    pub async fn output(&self, job_id: &str) -> Result<JobOutput, OutputError> {
        let job = self
            .inner
            .store
            .get(job_id)
            .ok_or(OutputError::JobNotFound)?;
        let file_name = job.output_file.ok_or(OutputError::NotReady)?;
        let output = self.inner.output.read(&file_name).await.map_err(|err| {
            warn!(%job_id, %file_name, "{err:#}");
            OutputError::Missing
        })?;

        Ok(JobOutput {
            job_id: job.id,
            file_name,
            output,
        })
    }

    async fn plan(&self, request: JobRequest) -> Result<Plan<K>, ClientRequestError> {
        let JobRequest {
            algorithm,
            input_file,
            num_reducers,
            mapper_urls,
            reducer_urls,
            partitioner_url,
        } = request;

        let algorithm = algorithm
            .filter(|name| !name.is_empty())
            .ok_or(ClientRequestError::MissingField("algorithm"))?;
        let algorithm = resolve::<K>(&algorithm)?;

        let input_file = input_file
            .filter(|file| !file.is_empty())
            .ok_or(ClientRequestError::MissingField("inputFile"))?;

        let num_reducers = num_reducers.ok_or(ClientRequestError::MissingField("numReducers"))?;
        if num_reducers == 0 {
            return Err(ClientRequestError::NoReducers);
        }

        let mapper_urls = mapper_urls
            .filter(|urls| !urls.is_empty())
            .ok_or(ClientRequestError::MissingField("mapperUrls"))?;

        let mut reducer_urls = reducer_urls.unwrap_or_default();
        if reducer_urls.len() < num_reducers {
            return Err(ClientRequestError::NotEnoughReducers {
                requested: num_reducers,
                available: reducer_urls.len(),
            });
        }
        reducer_urls.truncate(num_reducers);

        let partitioner_url = partitioner_url
            .filter(|url| !url.is_empty())
            .ok_or(ClientRequestError::MissingField("partitionerUrl"))?;

        let dataset = ingest::load(&self.inner.data_dir, &input_file).await?;

        Ok(Plan {
            algorithm,
            dataset,
            num_reducers,
            mapper_urls,
            reducer_urls,
            partitioner_url,
        })
    }

    /// Register a fresh `pending` job, suffixing the timestamp id when it is
    /// already taken.
    fn register(&self) -> String {
        let base = timestamp_id(&Local::now());
        let mut job = Job::new(base.clone());
        let mut attempt = 1;
        loop {
            let id = job.id.clone();
            match self.inner.store.insert_new(job) {
                Ok(()) => return id,
                Err(taken) => {
                    attempt += 1;
                    job = taken;
                    job.id = format!("{base}_{attempt}");
                }
            }
        }
    }

    fn transition(
        &self,
        job_id: &str,
        f: impl FnOnce(&mut Job) -> Result<(), IllegalTransition>,
    ) -> bool {
        match self.inner.store.update(job_id, f) {
            Some(Ok(())) => true,
            Some(Err(err)) => {
                error!(%job_id, %err, "job record rejected the transition");
                false
            }
            None => {
                error!(%job_id, "job record disappeared");
                false
            }
        }
    }

    fn note(&self, job_id: &str, progress: String) {
        debug!(%job_id, %progress);
        self.inner.store.update(job_id, |job| job.note(progress));
    }

    /// Drive one job to a terminal state.
    #[instrument(skip(self, plan), fields(algorithm = plan.algorithm.name()))]
    async fn run(self, job_id: String, plan: Plan<K>) {
        if !self.transition(&job_id, Job::start) {
            return;
        }
        info!("job started");

        let pipeline = tokio::spawn({
            let this = self.clone();
            let job_id = job_id.clone();
            async move { this.pipeline(&job_id, plan).await }
        });

        match pipeline.await {
            Ok(Ok(completion)) => {
                let output_file = completion.output_file.clone();
                if self.transition(&job_id, |job| job.complete(completion)) {
                    info!(%output_file, "job completed");
                }
            }
            Ok(Err(err)) => {
                let message = format!("{err:#}");
                error!(error = %message, "job failed");
                self.transition(&job_id, |job| job.fail(message));
            }
            Err(err) => {
                let message = format!("pipeline task failed: {err}");
                error!(error = %message, "job failed");
                self.transition(&job_id, |job| job.fail(message));
            }
        }
    }

    async fn pipeline(&self, job_id: &str, plan: Plan<K>) -> Result<Completion> {
        let Plan {
            algorithm,
            dataset,
            num_reducers,
            mapper_urls,
            reducer_urls,
            partitioner_url,
        } = plan;
        let algorithm_path = algorithm.name();

        self.note(
            job_id,
            format!(
                "Mapping {} lines on {} mappers",
                dataset.lines.len(),
                mapper_urls.len()
            ),
        );
        let mut mapped = self
            .map_phase(algorithm_path, &dataset.lines, &mapper_urls)
            .await?;
        drop(dataset);

        if self.inner.sort_by_key {
            mapped.sort_by(|a, b| key_of(a).cmp(&key_of(b)));
        }

        self.note(
            job_id,
            format!(
                "Partitioning {} records into {num_reducers} partitions",
                mapped.len()
            ),
        );
        let mut assignment = self
            .partition_phase(&partitioner_url, mapped, num_reducers)
            .await?;

        self.note(
            job_id,
            format!("Reducing {} records on {num_reducers} reducers", assignment.total()),
        );
        let reduced = self
            .reduce_phase(algorithm_path, &reducer_urls, &mut assignment)
            .await?;

        self.note(job_id, format!("Aggregating {} reduced lines", reduced.len()));
        let lines = aggregate(algorithm, reduced).await;

        self.note(job_id, format!("Writing {} output lines", lines.len()));
        let output_file = self.inner.output.write(job_id, &lines).await?;

        Ok(Completion {
            result_preview: lines.iter().take(PREVIEW_LINES).cloned().collect(),
            partition_counts: assignment.partition_counts,
            output_file,
        })
    }

    async fn map_phase(
        &self,
        algorithm_path: &str,
        lines: &[String],
        mapper_urls: &[String],
    ) -> Result<Vec<String>, PhaseError> {
        let chunks = split_chunks(lines, mapper_urls.len());
        let calls = mapper_urls.iter().zip(chunks).map(|(url, chunk)| {
            self.inner.workers.map(
                url,
                MapRequest {
                    algorithm_path: algorithm_path.to_string(),
                    data_lines: chunk.to_vec(),
                },
            )
        });
        let responses = join_all(calls).await;

        let mut mapped = Vec::new();
        for (mapper, (url, response)) in mapper_urls.iter().zip(responses).enumerate() {
            let response =
                response.map_err(|err| PhaseError::new(Phase::Map { mapper }, url.as_str(), err))?;
            mapped.extend(response.mapped_data);
        }
        Ok(mapped)
    }

    async fn partition_phase(
        &self,
        partitioner_url: &str,
        records: Vec<String>,
        num_partitions: usize,
    ) -> Result<PartitionAssignment, PhaseError> {
        let request = PartitionRequest {
            all_mapped_data: records,
            num_partitions,
        };
        let fail = |err| PhaseError::new(Phase::Partition, partitioner_url, err);

        let assignment = self
            .inner
            .workers
            .partition(partitioner_url, request)
            .await
            .map_err(fail)?;

        if let Some(index) = assignment
            .partitions
            .keys()
            .chain(assignment.partition_counts.keys())
            .find(|index| **index >= num_partitions)
        {
            return Err(fail(CallError::InvalidResponse(format!(
                "partition index {index} is out of range for {num_partitions} partitions"
            ))));
        }
        Ok(assignment)
    }

    async fn reduce_phase(
        &self,
        algorithm_path: &str,
        reducer_urls: &[String],
        assignment: &mut PartitionAssignment,
    ) -> Result<Vec<String>, PhaseError> {
        let requests: Vec<_> = (0..reducer_urls.len())
            .map(|index| ReduceRequest {
                algorithm_path: algorithm_path.to_string(),
                partitioned_data: assignment.take(index),
            })
            .collect();
        let calls = reducer_urls
            .iter()
            .zip(requests)
            .map(|(url, request)| self.inner.workers.reduce(url, request));
        let responses = join_all(calls).await;

        let mut reduced = Vec::new();
        for (reducer, (url, response)) in reducer_urls.iter().zip(responses).enumerate() {
            let response = response
                .map_err(|err| PhaseError::new(Phase::Reduce { reducer }, url.as_str(), err))?;
            reduced.extend(response.reduced_data);
        }
        Ok(reduced)
    }
}

/// Apply the optional aggregate step, keeping `reduced` when it is not
/// defined or does not succeed.
async fn aggregate<K: AlgorithmKind>(algorithm: K, reduced: Vec<String>) -> Vec<String> {
    let reduced = Arc::new(reduced);
    let input = Arc::clone(&reduced);
    let outcome = execute_blocking(move || algorithm.aggregate(&input).transpose()).await;

    let fallback = |reduced: Arc<Vec<String>>| {
        Arc::try_unwrap(reduced).unwrap_or_else(|shared| (*shared).clone())
    };
    match outcome {
        Ok(Some(lines)) => lines,
        Ok(None) => fallback(reduced),
        Err(err) => {
            warn!(
                algorithm = algorithm.name(),
                %err,
                "aggregate failed, keeping the reduced output"
            );
            fallback(reduced)
        }
    }
}
