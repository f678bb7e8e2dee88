//! Algorithms served by the bundled orchestrator and worker binaries.
use mapreduce::algorithm_derive::AlgorithmKind;

mod friendrec;
mod wordcount;
pub use friendrec::FriendRecommendation;
pub use wordcount::WordCount;

#[derive(AlgorithmKind, Debug, Clone, Copy)]
pub enum Algorithms {
    #[algorithm(name = "friendrec")]
    FriendRecommendation(FriendRecommendation),
    #[algorithm(name = "wordcount")]
    WordCount(WordCount),
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use mapreduce::{
        algorithm::AlgorithmKind,
        api::JobRequest,
        client::InMemoryWorkers,
        job::{InMemoryJobStore, JobStatus},
        orchestrator::{Orchestrator, Settings},
    };

    use super::*;

    #[test]
    fn it_registers_every_algorithm() {
        assert_eq!(Algorithms::names(), &["friendrec", "wordcount"]);
        assert!(matches!(
            Algorithms::resolve("friendrec"),
            Some(Algorithms::FriendRecommendation(_))
        ));
        assert!(Algorithms::resolve("friendrec.py").is_none());
    }

    #[tokio::test]
    async fn it_runs_friend_recommendation_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("friends.txt"),
            "1\t2 3 4\n2\t1 3\n3\t1 2 5\n\n4\t1\n5\t3\n",
        )
        .unwrap();

        let orchestrator: Orchestrator<Algorithms, InMemoryWorkers<Algorithms>> = Orchestrator::new(
            InMemoryWorkers::new(),
            InMemoryJobStore::new(),
            Settings {
                data_dir: dir.path().to_path_buf(),
                output_dir: dir.path().join("output"),
                sort_by_key: true,
            },
        );

        let created = orchestrator
            .create_job(JobRequest {
                algorithm: Some("friendrec".into()),
                input_file: Some("friends.txt".into()),
                num_reducers: Some(1),
                mapper_urls: Some(vec!["http://m0".into(), "http://m1".into()]),
                reducer_urls: Some(vec!["http://r0".into()]),
                partitioner_url: Some("http://p".into()),
            })
            .await
            .unwrap();

        let mut status = orchestrator.status(&created.job_id).unwrap();
        for _ in 0..500 {
            if status.status.is_terminal() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
            status = orchestrator.status(&created.job_id).unwrap();
        }

        assert_eq!(status.status, JobStatus::Completed, "{status:?}");
        assert_eq!(
            status.result_preview.unwrap(),
            vec![
                "1\t(5,1)",
                "5\t(1,1),(2,1)",
                "2\t(4,1),(5,1)",
                "4\t(2,1),(3,1)",
                "3\t(4,1)",
            ]
        );
    }
}
