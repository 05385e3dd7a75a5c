//! Linux and other Unix desktops: try the graphical sudo helpers in order.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use super::{path_arg, sh_quote, CommandRunner, CommandSpec, ElevationStrategy, StagedFile};
use crate::error::BlockError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElevationHelper {
    Pkexec,
    Gksudo,
    Kdesudo,
}

impl ElevationHelper {
    pub const DEFAULT_ORDER: [ElevationHelper; 3] = [
        ElevationHelper::Pkexec,
        ElevationHelper::Gksudo,
        ElevationHelper::Kdesudo,
    ];

    pub fn program(self) -> &'static str {
        match self {
            ElevationHelper::Pkexec => "pkexec",
            ElevationHelper::Gksudo => "gksudo",
            ElevationHelper::Kdesudo => "kdesudo",
        }
    }

    /// Command that copies `src` over `dst` through this helper.
    pub fn copy_command(self, src: &Path, dst: &Path) -> CommandSpec {
        match self {
            ElevationHelper::Pkexec => {
                CommandSpec::new("pkexec", ["cp".to_string(), path_arg(src), path_arg(dst)])
            }
            // gksudo and kdesudo take the whole command line as one argument.
            ElevationHelper::Gksudo | ElevationHelper::Kdesudo => CommandSpec::new(
                self.program(),
                [format!(
                    "cp {} {}",
                    sh_quote(&path_arg(src)),
                    sh_quote(&path_arg(dst))
                )],
            ),
        }
    }
}

impl fmt::Display for ElevationHelper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program())
    }
}

/// Stages the content once, then attempts the privileged copy with each
/// helper until one succeeds.
///
/// Every attempt copies the complete staged file, so a failed attempt leaves
/// nothing for the next one to build on.
#[derive(Debug)]
pub struct HelperChain {
    runner: Arc<dyn CommandRunner>,
    staging_dir: PathBuf,
    helpers: Vec<ElevationHelper>,
}

impl HelperChain {
    pub fn new(runner: Arc<dyn CommandRunner>, staging_dir: PathBuf) -> Self {
        Self::with_helpers(runner, staging_dir, ElevationHelper::DEFAULT_ORDER.to_vec())
    }

    pub fn with_helpers(
        runner: Arc<dyn CommandRunner>,
        staging_dir: PathBuf,
        helpers: Vec<ElevationHelper>,
    ) -> Self {
        Self {
            runner,
            staging_dir,
            helpers,
        }
    }
}

#[async_trait]
impl ElevationStrategy for HelperChain {
    fn name(&self) -> &'static str {
        "helper-chain"
    }

    async fn commit(&self, target: &Path, content: &str) -> Result<(), BlockError> {
        let staged = StagedFile::write(&self.staging_dir, content).await?;

        let mut failures = Vec::with_capacity(self.helpers.len());
        for helper in &self.helpers {
            let command = helper.copy_command(staged.path(), target);
            match self.runner.run(&command).await {
                Ok(()) => {
                    tracing::info!(%helper, "hosts file copied with elevated rights");
                    staged.discard().await;
                    return Ok(());
                }
                Err(e) => {
                    tracing::debug!(%helper, error = %e, "elevation helper failed");
                    failures.push(e.to_string());
                }
            }
        }

        staged.discard().await;
        let tried = self
            .helpers
            .iter()
            .map(|h| h.program())
            .collect::<Vec<_>>()
            .join("/");
        Err(BlockError::NoElevationMethodAvailable(format!(
            "tried {tried}: {}",
            failures.join("; ")
        )))
    }
}
