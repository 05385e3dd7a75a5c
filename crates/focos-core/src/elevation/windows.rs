//! Windows: one UAC prompt that runs a copy-and-delete script.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use super::{
    path_arg, remove_if_exists, write_private, CommandRunner, CommandSpec, ElevationStrategy,
    StagedFile,
};
use crate::error::BlockError;

/// Stages the content, then launches a single elevated PowerShell that copies
/// the staged file over the hosts file and deletes it.
#[derive(Debug)]
pub struct AdminPromptCopy {
    runner: Arc<dyn CommandRunner>,
    staging_dir: PathBuf,
}

impl AdminPromptCopy {
    pub fn new(runner: Arc<dyn CommandRunner>, staging_dir: PathBuf) -> Self {
        Self {
            runner,
            staging_dir,
        }
    }
}

#[async_trait]
impl ElevationStrategy for AdminPromptCopy {
    fn name(&self) -> &'static str {
        "admin-prompt-copy"
    }

    async fn commit(&self, target: &Path, content: &str) -> Result<(), BlockError> {
        let staged = StagedFile::write(&self.staging_dir, content).await?;

        let script_path = self
            .staging_dir
            .join(format!("focos-{}.ps1", Uuid::new_v4()));
        let script = copy_script(staged.path(), target);
        if let Err(source) = write_private(&script_path, script.as_bytes()).await {
            staged.discard().await;
            return Err(BlockError::Staging {
                path: script_path,
                source,
            });
        }

        let result = self.runner.run(&elevated_launch(&script_path)).await;

        remove_if_exists(&script_path).await;
        // The elevated script deletes the staged file itself; this only
        // matters when the prompt was refused.
        staged.discard().await;

        result.map_err(|e| BlockError::ElevationDenied(e.to_string()))
    }
}

fn ps_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

fn copy_script(staged: &Path, target: &Path) -> String {
    format!(
        "$ErrorActionPreference = 'Stop'\r\n\
         $src = {}\r\n\
         $dst = {}\r\n\
         Copy-Item -LiteralPath $src -Destination $dst -Force\r\n\
         Remove-Item -LiteralPath $src -Force\r\n",
        ps_quote(&path_arg(staged)),
        ps_quote(&path_arg(target)),
    )
}

fn elevated_launch(script: &Path) -> CommandSpec {
    let inner = format!(
        "-NoProfile -ExecutionPolicy Bypass -File \"{}\"",
        path_arg(script)
    );
    let command = format!(
        "$p = Start-Process -FilePath powershell -ArgumentList {} -Verb RunAs -Wait -PassThru; exit $p.ExitCode",
        ps_quote(&inner)
    );
    CommandSpec::new(
        "powershell",
        ["-NoProfile", "-ExecutionPolicy", "Bypass", "-Command", command.as_str()],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elevation::fake::RecordingRunner;

    #[test]
    fn script_copies_then_deletes() {
        let script = copy_script(Path::new(r"C:\Temp\focos-1.tmp"), Path::new(r"C:\Windows\System32\drivers\etc\hosts"));
        let copy = script.find("Copy-Item").unwrap();
        let remove = script.find("Remove-Item").unwrap();
        assert!(copy < remove);
        assert!(script.contains(r"$src = 'C:\Temp\focos-1.tmp'"));
        assert!(script.contains(r"$dst = 'C:\Windows\System32\drivers\etc\hosts'"));
    }

    #[test]
    fn quotes_are_doubled() {
        assert_eq!(ps_quote(r"C:\Users\O'Brien\x.tmp"), r"'C:\Users\O''Brien\x.tmp'");
    }

    #[test]
    fn launch_requests_runas_once_and_propagates_exit_code() {
        let cmd = elevated_launch(Path::new(r"C:\Temp\focos-1.ps1"));
        assert_eq!(cmd.program, "powershell");
        let command = cmd.args.last().unwrap();
        assert_eq!(command.matches("-Verb RunAs").count(), 1);
        assert!(command.contains("-Wait -PassThru"));
        assert!(command.ends_with("exit $p.ExitCode"));
        assert!(command.contains(r#"-File "C:\Temp\focos-1.ps1""#));
    }

    #[tokio::test]
    async fn refused_prompt_leaves_no_temporary_files() {
        let dir = tempfile::tempdir().unwrap();
        let hosts = dir.path().join("hosts");
        std::fs::write(&hosts, "original\n").unwrap();
        let staging = dir.path().join("staging");
        std::fs::create_dir(&staging).unwrap();

        let runner = Arc::new(RecordingRunner::with_outcomes(vec![Err(
            "The operation was canceled by the user.".into(),
        )]));
        let strategy = AdminPromptCopy::new(runner.clone(), staging.clone());

        let err = strategy.commit(&hosts, "new\n").await.unwrap_err();
        assert!(matches!(err, BlockError::ElevationDenied(ref d) if d.contains("canceled")));
        assert_eq!(runner.calls().len(), 1);
        assert_eq!(std::fs::read_to_string(&hosts).unwrap(), "original\n");
        assert_eq!(std::fs::read_dir(&staging).unwrap().count(), 0);
    }
}
