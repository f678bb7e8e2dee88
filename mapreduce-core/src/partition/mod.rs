//! Deterministic key-to-partition assignment.
//!
//! Every record is routed by the MD5 digest of its key, read as a big-endian
//! 128-bit integer and reduced modulo the partition count. The function is
//! pure, so identical keys land in the same partition within a job, across
//! jobs, and across processes.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::record::key_of;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PartitionerError {
    #[error("numPartitions must be at least 1")]
    NoPartitions,
}

/// Records bucketed by partition index, with per-partition sizes.
///
/// Every index in `0..n` is present in both maps, including empty partitions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitionAssignment {
    pub partitions: BTreeMap<usize, Vec<String>>,
    pub partition_counts: BTreeMap<usize, usize>,
}

impl PartitionAssignment {
    /// The records of partition `index`, empty if the index is absent.
    pub fn records(&self, index: usize) -> &[String] {
        self.partitions
            .get(&index)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Take the records of partition `index`, leaving it empty.
    pub fn take(&mut self, index: usize) -> Vec<String> {
        self.partitions
            .get_mut(&index)
            .map(std::mem::take)
            .unwrap_or_default()
    }

    pub fn total(&self) -> usize {
        self.partition_counts.values().sum()
    }
}

/// The partition a key belongs to, for `num_partitions >= 1`.
pub fn partition_index(key: &str, num_partitions: usize) -> usize {
    let digest = md5::compute(key.as_bytes());
    (u128::from_be_bytes(digest.0) % num_partitions as u128) as usize
}

/// The partition a serialized record belongs to.
///
/// Records without a delimiter fall back to partition 0.
pub fn partition_of(record: &str, num_partitions: usize) -> usize {
    key_of(record)
        .map(|key| partition_index(key, num_partitions))
        .unwrap_or(0)
}

/// Bucket every record by its hashed key, preserving arrival order within
/// each bucket. Blank records are dropped.
pub fn partition_records<I, S>(
    records: I,
    num_partitions: usize,
) -> Result<PartitionAssignment, PartitionerError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    if num_partitions == 0 {
        return Err(PartitionerError::NoPartitions);
    }

    let mut partitions: BTreeMap<usize, Vec<String>> =
        (0..num_partitions).map(|index| (index, Vec::new())).collect();

    for record in records {
        let record = record.into();
        if record.trim().is_empty() {
            continue;
        }
        let index = partition_of(&record, num_partitions);
        partitions.entry(index).or_default().push(record);
    }

    let partition_counts = partitions
        .iter()
        .map(|(index, records)| (*index, records.len()))
        .collect();

    Ok(PartitionAssignment {
        partitions,
        partition_counts,
    })
}
