//! Persistence of final job output.
//!
//! Each completed job owns one artifact, `output_<jobId>.txt`, holding the
//! final result lines one per line.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::{fs, io::AsyncWriteExt};

/// A directory holding job output artifacts.
#[derive(Debug, Clone)]
pub struct OutputDir {
    root: PathBuf,
}

impl OutputDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The artifact name for a job.
    pub fn file_name(job_id: &str) -> String {
        format!("output_{job_id}.txt")
    }

    pub fn path_of(&self, file_name: &str) -> PathBuf {
        self.root.join(file_name)
    }

    /// Write the final lines of a job, returning the artifact's file name.
    pub async fn write(&self, job_id: &str, lines: &[String]) -> Result<String> {
        fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("cannot create output directory {}", self.root.display()))?;

        let file_name = Self::file_name(job_id);
        let path = self.path_of(&file_name);
        let mut file = fs::File::create(&path)
            .await
            .with_context(|| format!("cannot create output file {}", path.display()))?;

        let mut contents = String::with_capacity(lines.iter().map(|line| line.len() + 1).sum());
        for line in lines {
            contents.push_str(line);
            contents.push('\n');
        }
        file.write_all(contents.as_bytes()).await?;
        file.flush().await?;

        Ok(file_name)
    }

    /// Read an artifact back as a single string.
    pub async fn read(&self, file_name: &str) -> Result<String> {
        let path = self.path_of(file_name);
        fs::read_to_string(&path)
            .await
            .with_context(|| format!("cannot read output file {}", path.display()))
    }
}
