//! Plain copy for processes that can already write the hosts file.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{ElevationStrategy, StagedFile};
use crate::error::BlockError;

#[derive(Debug)]
pub struct DirectCopy {
    staging_dir: PathBuf,
}

impl DirectCopy {
    pub fn new(staging_dir: PathBuf) -> Self {
        Self { staging_dir }
    }
}

#[async_trait]
impl ElevationStrategy for DirectCopy {
    fn name(&self) -> &'static str {
        "direct-copy"
    }

    async fn commit(&self, target: &Path, content: &str) -> Result<(), BlockError> {
        let staged = StagedFile::write(&self.staging_dir, content).await?;
        let result = tokio::fs::copy(staged.path(), target).await;
        staged.discard().await;
        result.map(|_| ()).map_err(|e| {
            BlockError::ElevationDenied(format!("cannot write {}: {e}", target.display()))
        })
    }
}
