//! Child process seam.
//!
//! Every external program focos launches (elevation helpers, DNS flush
//! commands, the elevation check) goes through [`CommandRunner`], so tests can
//! substitute a recording fake.

use std::fmt;
use std::process::Stdio;

use async_trait::async_trait;
use thiserror::Error;

/// A program and its arguments, passed to the OS without a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new<P, I, A>(program: P, args: I) -> Self
    where
        P: Into<String>,
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// A command that could not be spawned or exited unsuccessfully.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("`{program}` failed: {detail}")]
pub struct CommandFailure {
    pub program: String,
    pub detail: String,
}

#[async_trait]
pub trait CommandRunner: Send + Sync + fmt::Debug {
    /// Run `command` to completion. Succeeds only on a zero exit status.
    async fn run(&self, command: &CommandSpec) -> Result<(), CommandFailure>;
}

/// Runs commands as real child processes on the tokio runtime.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, command: &CommandSpec) -> Result<(), CommandFailure> {
        tracing::debug!(%command, "spawning");
        let output = tokio::process::Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| CommandFailure {
                program: command.program.clone(),
                detail: e.to_string(),
            })?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        let detail = if stderr.is_empty() {
            output.status.to_string()
        } else {
            format!("{}: {stderr}", output.status)
        };
        Err(CommandFailure {
            program: command.program.clone(),
            detail,
        })
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Records every command and answers from a script of outcomes.
    /// Once the script runs out, every command succeeds.
    #[derive(Debug, Default)]
    pub struct RecordingRunner {
        pub calls: Mutex<Vec<CommandSpec>>,
        outcomes: Mutex<VecDeque<Result<(), String>>>,
    }

    impl RecordingRunner {
        pub fn with_outcomes(outcomes: Vec<Result<(), String>>) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                outcomes: Mutex::new(outcomes.into()),
            }
        }

        pub fn calls(&self) -> Vec<CommandSpec> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CommandRunner for RecordingRunner {
        async fn run(&self, command: &CommandSpec) -> Result<(), CommandFailure> {
            self.calls.lock().unwrap().push(command.clone());
            match self.outcomes.lock().unwrap().pop_front() {
                Some(Err(detail)) => Err(CommandFailure {
                    program: command.program.clone(),
                    detail,
                }),
                _ => Ok(()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_joins_program_and_args() {
        let cmd = CommandSpec::new("pkexec", ["cp", "/tmp/a", "/etc/hosts"]);
        assert_eq!(cmd.to_string(), "pkexec cp /tmp/a /etc/hosts");
    }

    #[tokio::test]
    async fn missing_program_is_a_failure() {
        let cmd = CommandSpec::new("focos-definitely-not-a-real-program", Vec::<String>::new());
        let err = SystemRunner.run(&cmd).await.unwrap_err();
        assert_eq!(err.program, "focos-definitely-not-a-real-program");
        assert!(!err.detail.is_empty());
    }
}
