//! Reduce phase logic.
//!
//! Records are grouped by run-length over the order received: consecutive
//! records sharing a key form one group, and a key change flushes the pending
//! group through `reduce`. There is no global sort here, so a key whose
//! records arrive non-adjacently is reduced once per run. The orchestrator
//! sorts mapped records by key before partitioning unless told otherwise.
use anyhow::Context;
use thiserror::Error;
use tracing::debug;

use crate::{
    algorithm::{execute_blocking, resolve, AlgorithmKind, ExecutionError, PluginContractError},
    record::MappedRecord,
};

#[derive(Error, Debug)]
pub enum ReducerError {
    #[error("Reducer error: {0}")]
    Contract(#[from] PluginContractError),
    #[error("Reducer error: {0}")]
    Execution(#[from] ExecutionError),
}

/// A key and the values of one contiguous run of records carrying it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRun {
    pub key: String,
    pub values: Vec<String>,
}

/// Split records into runs of identical consecutive keys.
///
/// Blank records and records without a delimiter are skipped.
pub fn group_runs<'a, I>(records: I) -> Vec<KeyRun>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut runs: Vec<KeyRun> = Vec::new();

    for record in records {
        if record.trim().is_empty() {
            continue;
        }
        let Some(MappedRecord { key, value }) = MappedRecord::parse(record) else {
            continue;
        };

        match runs.last_mut() {
            Some(current) if current.key == key => current.values.push(value),
            _ => runs.push(KeyRun {
                key,
                values: vec![value],
            }),
        }
    }

    runs
}

/// Reduce one partition with the algorithm registered as `algorithm` in `K`.
pub async fn reduce_partition<K: AlgorithmKind>(
    algorithm: &str,
    records: Vec<String>,
) -> Result<Vec<String>, ReducerError> {
    let algorithm = resolve::<K>(algorithm)?;
    let runs = group_runs(&records);
    debug!(
        algorithm = algorithm.name(),
        records = records.len(),
        runs = runs.len(),
        "reducing partition"
    );

    let output = execute_blocking(move || {
        let mut output = Vec::new();
        for KeyRun { key, values } in runs {
            let reduced = algorithm
                .reduce(&key, values)
                .with_context(|| format!("reduce failed for key {key:?}"))?;
            if let Some(lines) = reduced {
                output.extend(lines);
            }
        }
        Ok(output)
    })
    .await?;

    Ok(output)
}

#[cfg(test)]
mod test {
    use anyhow::{bail, Result};

    use super::*;
    use crate::algorithm::{Algorithm, Emitter};
    use crate::algorithm_derive::AlgorithmKind;

    #[derive(Debug, Default, Clone, Copy)]
    struct Sum;

    impl Algorithm for Sum {
        fn map(&self, _line: &str, _emit: &mut Emitter) -> Result<()> {
            Ok(())
        }

        fn reduce(&self, key: &str, values: Vec<String>) -> Result<Option<Vec<String>>> {
            if key == "skip" {
                return Ok(None);
            }
            if key == "bad" {
                bail!("cannot reduce");
            }
            let mut total = 0i64;
            for value in values {
                total += value.parse::<i64>()?;
            }
            Ok(Some(vec![format!("{key}\t{total}")]))
        }
    }

    #[derive(AlgorithmKind, Debug, Clone, Copy)]
    #[mapreduce(internal)]
    enum TestAlgorithms {
        Sum(Sum),
    }

    fn records(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|line| line.to_string()).collect()
    }

    #[test]
    fn it_groups_consecutive_keys() {
        let input = records(&["a\t1", "a\t2", "", "b\t3", "malformed", "b\t4"]);
        assert_eq!(
            group_runs(&input),
            vec![
                KeyRun {
                    key: "a".into(),
                    values: vec!["1".into(), "2".into()]
                },
                KeyRun {
                    key: "b".into(),
                    values: vec!["3".into(), "4".into()]
                },
            ]
        );
    }

    #[test]
    fn it_splits_non_adjacent_keys_into_separate_runs() {
        let input = records(&["a\t1", "b\t1", "a\t1"]);
        let keys: Vec<_> = group_runs(&input).into_iter().map(|run| run.key).collect();
        assert_eq!(keys, vec!["a", "b", "a"]);
    }

    #[tokio::test]
    async fn it_reduces_each_run() {
        let output =
            reduce_partition::<TestAlgorithms>("sum", records(&["a\t1", "a\t2", "skip\t1", "b\t5"]))
                .await
                .unwrap();
        assert_eq!(output, vec!["a\t3", "b\t5"]);
    }

    #[tokio::test]
    async fn it_reduces_fragmented_keys_once_per_run() {
        let output = reduce_partition::<TestAlgorithms>("sum", records(&["a\t1", "b\t1", "a\t1"]))
            .await
            .unwrap();
        assert_eq!(output, vec!["a\t1", "b\t1", "a\t1"]);
    }

    #[tokio::test]
    async fn it_reduces_empty_partitions_to_nothing() {
        let output = reduce_partition::<TestAlgorithms>("sum", Vec::new())
            .await
            .unwrap();
        assert!(output.is_empty());
    }

    #[tokio::test]
    async fn it_fails_when_reduce_fails() {
        let err = reduce_partition::<TestAlgorithms>("sum", records(&["a\t1", "bad\t1"]))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("reduce failed for key \"bad\""));

        let err = reduce_partition::<TestAlgorithms>("nope", Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ReducerError::Contract(_)));
    }
}
