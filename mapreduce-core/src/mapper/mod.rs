//! Map phase logic.
//!
//! A mapper applies the algorithm's `map` to every non-blank line of its chunk
//! and concatenates the emissions in line order. A single failing line fails
//! the whole chunk; no partial results are returned.
use anyhow::Context;
use thiserror::Error;
use tracing::debug;

use crate::algorithm::{
    execute_blocking, resolve, AlgorithmKind, Emitter, ExecutionError, PluginContractError,
};

#[derive(Error, Debug)]
pub enum MapperError {
    #[error("Mapper error: {0}")]
    Contract(#[from] PluginContractError),
    #[error("Mapper error: {0}")]
    Execution(#[from] ExecutionError),
}

/// Map a chunk of lines with the algorithm registered as `algorithm` in `K`.
pub async fn map_chunk<K: AlgorithmKind>(
    algorithm: &str,
    lines: Vec<String>,
) -> Result<Vec<String>, MapperError> {
    let algorithm = resolve::<K>(algorithm)?;
    debug!(algorithm = algorithm.name(), lines = lines.len(), "mapping chunk");

    let records = execute_blocking(move || {
        let mut emit = Emitter::new();
        for (index, line) in lines.iter().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            algorithm
                .map(line, &mut emit)
                .with_context(|| format!("map failed on line {}: {line:?}", index + 1))?;
        }
        Ok(emit.into_records())
    })
    .await?;

    Ok(records)
}
