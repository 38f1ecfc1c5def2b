//! Manual retry log: workspace ids whose retrain trigger failed.
//!
//! Plain text, one id per line, append-only across runs. The file is
//! opened and closed on every record so nothing is buffered between
//! workspaces.

use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

use crate::error::Result;

/// Default file name, resolved against the working directory.
pub const RETRY_LOG_FILE: &str = "retrain_manually.txt";

#[derive(Debug, Clone)]
pub struct RetryLog {
    path: PathBuf,
}

impl RetryLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one workspace id. Creates the file if needed.
    pub async fn record(&self, workspace_id: &str) -> Result<()> {
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(format!("{workspace_id}\n").as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

impl Default for RetryLog {
    fn default() -> Self {
        Self::new(RETRY_LOG_FILE)
    }
}
