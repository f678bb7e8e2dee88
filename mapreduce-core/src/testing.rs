//! Algorithms shared by the crate's tests.
use anyhow::{bail, Result};

use crate::algorithm::{Algorithm, Emitter};
use crate::algorithm_derive::AlgorithmKind;

fn count_words(line: &str, emit: &mut Emitter) -> Result<()> {
    for word in line.split_whitespace() {
        if word == "poison" {
            bail!("poisoned input");
        }
        emit.emit(word, 1);
    }
    Ok(())
}

fn sum_counts(key: &str, values: Vec<String>) -> Result<Option<Vec<String>>> {
    let mut total = 0u64;
    for value in values {
        total += value.parse::<u64>()?;
    }
    Ok(Some(vec![format!("{key}\t{total}")]))
}

/// Word count without an aggregate step.
#[derive(Debug, Default, Clone, Copy)]
pub struct Count;

impl Algorithm for Count {
    fn map(&self, line: &str, emit: &mut Emitter) -> Result<()> {
        count_words(line, emit)
    }

    fn reduce(&self, key: &str, values: Vec<String>) -> Result<Option<Vec<String>>> {
        sum_counts(key, values)
    }
}

/// Word count whose aggregate sorts the final lines.
#[derive(Debug, Default, Clone, Copy)]
pub struct SortedCount;

impl Algorithm for SortedCount {
    fn map(&self, line: &str, emit: &mut Emitter) -> Result<()> {
        count_words(line, emit)
    }

    fn reduce(&self, key: &str, values: Vec<String>) -> Result<Option<Vec<String>>> {
        sum_counts(key, values)
    }

    fn aggregate(&self, lines: &[String]) -> Option<Result<Vec<String>>> {
        let mut lines = lines.to_vec();
        lines.sort();
        Some(Ok(lines))
    }
}

/// Word count whose aggregate always panics.
#[derive(Debug, Default, Clone, Copy)]
pub struct BrokenAggregate;

impl Algorithm for BrokenAggregate {
    fn map(&self, line: &str, emit: &mut Emitter) -> Result<()> {
        count_words(line, emit)
    }

    fn reduce(&self, key: &str, values: Vec<String>) -> Result<Option<Vec<String>>> {
        sum_counts(key, values)
    }

    fn aggregate(&self, _lines: &[String]) -> Option<Result<Vec<String>>> {
        panic!("aggregate exploded")
    }
}

#[derive(AlgorithmKind, Debug, Clone, Copy)]
#[mapreduce(internal)]
pub enum TestAlgorithms {
    Count(Count),
    #[algorithm(name = "sorted-count")]
    SortedCount(SortedCount),
    #[algorithm(name = "broken-aggregate")]
    BrokenAggregate(BrokenAggregate),
}
