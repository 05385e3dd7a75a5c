//! Privileged commit of the hosts file.
//!
//! Each operating system family gets one [`ElevationStrategy`]. A strategy
//! receives the complete new hosts content, stages it in a private temporary
//! file and copies that file over the real hosts path with elevated rights.
//! The real file is only touched by that final copy, so a refused prompt or a
//! failed helper leaves it exactly as it was.
//!
//! | Platform | Strategy | Mechanism |
//! |----------|----------|-----------|
//! | Windows  | [`AdminPromptCopy`] | `Start-Process -Verb RunAs` running a copy script |
//! | macOS    | [`AdministratorShell`] | `osascript ... with administrator privileges` |
//! | Linux    | [`HelperChain`] | first of `pkexec`, `gksudo`, `kdesudo` that works |
//! | any      | [`DirectCopy`] | plain copy, for processes that already have rights |

mod command;
mod direct;
mod linux;
mod macos;
mod windows;

#[cfg(test)]
pub(crate) use command::fake;
pub use command::{CommandFailure, CommandRunner, CommandSpec, SystemRunner};
pub use direct::DirectCopy;
pub use linux::{ElevationHelper, HelperChain};
pub use macos::AdministratorShell;
pub use windows::AdminPromptCopy;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::error::BlockError;

/// Operating system family, detected once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Windows,
    MacOs,
    Linux,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Linux
        }
    }

    /// Location of the system hosts file.
    pub fn default_hosts_path(self) -> PathBuf {
        match self {
            Platform::Windows => {
                let root = std::env::var_os("SystemRoot")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(r"C:\Windows"));
                root.join("System32").join("drivers").join("etc").join("hosts")
            }
            Platform::MacOs | Platform::Linux => PathBuf::from("/etc/hosts"),
        }
    }
}

/// How the hosts file gets written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElevationMode {
    /// Use the platform's elevation strategy.
    #[default]
    Auto,
    /// Copy without asking for rights.
    Direct,
}

#[async_trait]
pub trait ElevationStrategy: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    /// Replace `target` with `content`. The target is left untouched on error.
    async fn commit(&self, target: &Path, content: &str) -> Result<(), BlockError>;
}

/// Pick the strategy for `platform`.
pub fn strategy_for(
    platform: Platform,
    mode: ElevationMode,
    runner: Arc<dyn CommandRunner>,
    staging_dir: PathBuf,
) -> Box<dyn ElevationStrategy> {
    match (mode, platform) {
        (ElevationMode::Direct, _) => Box::new(DirectCopy::new(staging_dir)),
        (ElevationMode::Auto, Platform::Windows) => {
            Box::new(AdminPromptCopy::new(runner, staging_dir))
        }
        (ElevationMode::Auto, Platform::MacOs) => {
            Box::new(AdministratorShell::new(runner, staging_dir))
        }
        (ElevationMode::Auto, Platform::Linux) => Box::new(HelperChain::new(runner, staging_dir)),
    }
}

/// Whether the current process already holds administrator rights.
///
/// Only Windows has a distinguishable elevated mode worth probing; every other
/// platform reports `true`.
pub async fn is_elevated(platform: Platform, runner: &dyn CommandRunner) -> bool {
    match platform {
        Platform::Windows => runner
            .run(&CommandSpec::new("net", ["session"]))
            .await
            .is_ok(),
        Platform::MacOs | Platform::Linux => true,
    }
}

/// New hosts content written to a private temporary file.
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
}

impl StagedFile {
    /// Write `content` to a fresh `focos-<uuid>.tmp` in `dir`.
    pub async fn write(dir: &Path, content: &str) -> Result<Self, BlockError> {
        let path = dir.join(format!("focos-{}.tmp", Uuid::new_v4()));
        write_private(&path, content.as_bytes())
            .await
            .map_err(|source| BlockError::Staging {
                path: path.clone(),
                source,
            })?;
        tracing::debug!(path = %path.display(), bytes = content.len(), "staged hosts content");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the staged file if it still exists.
    pub async fn discard(self) {
        remove_if_exists(&self.path).await;
    }
}

/// Create `path` exclusively (owner-only on Unix) and write `bytes`.
pub(crate) async fn write_private(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);
    let mut file = options.open(path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    Ok(())
}

pub(crate) async fn remove_if_exists(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "could not remove temporary file"),
    }
}

/// Quote `s` for a POSIX shell.
pub(crate) fn sh_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

pub(crate) fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
