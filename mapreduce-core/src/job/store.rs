use dashmap::{mapref::entry::Entry, DashMap};

use super::Job;

/// Storage for job records.
///
/// Implementations must make each method atomic with respect to a single job
/// id. Records of different jobs are independent.
pub trait JobStore: Send + Sync + 'static {
    /// Register a job whose id is not taken yet. The job is handed back if the
    /// id is already registered.
    fn insert_new(&self, job: Job) -> Result<(), Job>;

    /// A snapshot of the job with the given id.
    fn get(&self, id: &str) -> Option<Job>;

    /// Apply `f` to the job with the given id under its entry lock.
    fn update<R>(&self, id: &str, f: impl FnOnce(&mut Job) -> R) -> Option<R>;
}

/// A [`JobStore`] that keeps every record in memory for the lifetime of the
/// process.
#[derive(Debug, Default)]
pub struct InMemoryJobStore {
    jobs: DashMap<String, Job>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

impl JobStore for InMemoryJobStore {
    fn insert_new(&self, job: Job) -> Result<(), Job> {
        match self.jobs.entry(job.id.clone()) {
            Entry::Occupied(_) => Err(job),
            Entry::Vacant(entry) => {
                entry.insert(job);
                Ok(())
            }
        }
    }

    fn get(&self, id: &str) -> Option<Job> {
        self.jobs.get(id).map(|job| job.clone())
    }

    fn update<R>(&self, id: &str, f: impl FnOnce(&mut Job) -> R) -> Option<R> {
        self.jobs.get_mut(id).map(|mut job| f(&mut job))
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use super::*;
    use crate::job::JobStatus;

    #[test]
    fn it_refuses_duplicate_ids() {
        let store = InMemoryJobStore::new();
        assert!(store.insert_new(Job::new("job_1")).is_ok());

        let mut duplicate = Job::new("job_1");
        duplicate.progress = "second".into();
        let rejected = store.insert_new(duplicate).unwrap_err();
        assert_eq!(rejected.progress, "second");
        assert_eq!(store.get("job_1").unwrap().progress, "Job created");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn it_updates_in_place() {
        let store = InMemoryJobStore::new();
        store.insert_new(Job::new("job_1")).unwrap();

        let started = store.update("job_1", |job| job.start()).unwrap();
        assert!(started.is_ok());
        assert_eq!(store.get("job_1").unwrap().status, JobStatus::Running);
        assert!(store.update("job_2", |job| job.start()).is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn it_accepts_concurrent_writers_on_distinct_jobs() {
        let store = Arc::new(InMemoryJobStore::new());
        let handles: Vec<_> = (0..64)
            .map(|index| {
                let store = store.clone();
                tokio::spawn(async move {
                    let id = format!("job_{index}");
                    store.insert_new(Job::new(&id)).unwrap();
                    store.update(&id, |job| job.start()).unwrap().unwrap();
                    store.update(&id, |job| job.note(format!("step {index}")));
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.len(), 64);
        for index in 0..64 {
            let job = store.get(&format!("job_{index}")).unwrap();
            assert_eq!(job.status, JobStatus::Running);
            assert_eq!(job.progress, format!("step {index}"));
        }
    }
}
