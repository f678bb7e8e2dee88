use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use tokio::fs;

use super::ClientRequestError;

/// The non-blank, trimmed lines of an input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    pub path: PathBuf,
    pub lines: Vec<String>,
}

/// Resolve `input_file` against `data_dir` unless it is absolute.
pub fn resolve_path(data_dir: &Path, input_file: &str) -> PathBuf {
    let input = Path::new(input_file);
    if input.is_absolute() {
        input.to_path_buf()
    } else {
        data_dir.join(input)
    }
}

/// Read a dataset, rejecting missing files, non-files and files without a
/// single non-blank line.
pub async fn load(data_dir: &Path, input_file: &str) -> Result<Dataset, ClientRequestError> {
    let path = resolve_path(data_dir, input_file);

    let metadata = match fs::metadata(&path).await {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Err(ClientRequestError::DatasetNotFound(path))
        }
        Err(err) => {
            return Err(ClientRequestError::DatasetUnreadable {
                path,
                reason: err.to_string(),
            })
        }
    };
    if !metadata.is_file() {
        return Err(ClientRequestError::NotAFile(path));
    }

    let contents = fs::read_to_string(&path)
        .await
        .map_err(|err| ClientRequestError::DatasetUnreadable {
            path: path.clone(),
            reason: err.to_string(),
        })?;

    let lines: Vec<String> = contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();
    if lines.is_empty() {
        return Err(ClientRequestError::EmptyDataset(path));
    }

    Ok(Dataset { path, lines })
}
