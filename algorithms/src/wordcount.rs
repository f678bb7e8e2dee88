use anyhow::{Context, Result};
use mapreduce::algorithm::{Algorithm, Emitter};

/// Case-insensitive word count. Words are maximal runs of alphanumeric
/// characters.
#[derive(Debug, Default, Clone, Copy)]
pub struct WordCount;

impl Algorithm for WordCount {
    fn map(&self, line: &str, emit: &mut Emitter) -> Result<()> {
        for word in line
            .split(|c: char| !c.is_alphanumeric())
            .filter(|word| !word.is_empty())
        {
            emit.emit(word.to_lowercase(), 1);
        }
        Ok(())
    }

    fn reduce(&self, key: &str, values: Vec<String>) -> Result<Option<Vec<String>>> {
        let mut total = 0u64;
        for value in &values {
            total += value
                .parse::<u64>()
                .with_context(|| format!("invalid count {value:?} for {key:?}"))?;
        }
        Ok(Some(vec![format!("{key}\t{total}")]))
    }
}
