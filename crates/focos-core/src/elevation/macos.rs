//! macOS: `do shell script ... with administrator privileges`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use super::{path_arg, sh_quote, CommandRunner, CommandSpec, ElevationStrategy, StagedFile};
use crate::error::BlockError;

/// Stages the content and asks `osascript` for a single privileged `cp`.
/// The staged file is removed here once the copy returns.
#[derive(Debug)]
pub struct AdministratorShell {
    runner: Arc<dyn CommandRunner>,
    staging_dir: PathBuf,
}

impl AdministratorShell {
    pub fn new(runner: Arc<dyn CommandRunner>, staging_dir: PathBuf) -> Self {
        Self {
            runner,
            staging_dir,
        }
    }
}

#[async_trait]
impl ElevationStrategy for AdministratorShell {
    fn name(&self) -> &'static str {
        "administrator-shell"
    }

    async fn commit(&self, target: &Path, content: &str) -> Result<(), BlockError> {
        let staged = StagedFile::write(&self.staging_dir, content).await?;
        let result = self.runner.run(&privileged_copy(staged.path(), target)).await;
        staged.discard().await;
        result.map_err(|e| BlockError::ElevationDenied(e.to_string()))
    }
}

fn applescript_string(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

fn privileged_copy(staged: &Path, target: &Path) -> CommandSpec {
    let shell = format!(
        "cp {} {}",
        sh_quote(&path_arg(staged)),
        sh_quote(&path_arg(target))
    );
    let script = format!(
        "do shell script {} with administrator privileges",
        applescript_string(&shell)
    );
    CommandSpec::new("osascript", ["-e", script.as_str()])
}
