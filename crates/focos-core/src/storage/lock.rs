//! Runtime marker for a confirmed strict session.
//!
//! A strict session in one process must also hold against `focos block` and
//! `focos unblock` run from another. While the session is active its process
//! keeps `strict.lock` in the data directory; every other command that would
//! rewrite the hosts file checks it first. The lock carries its own end time,
//! so a session whose process was killed stops locking once its countdown
//! would have ended.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::ConfigError;

const LOCK_FILE: &str = "strict.lock";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrictLock {
    /// When the strict countdown ends.
    pub until: DateTime<Utc>,
    /// Process running the session.
    pub pid: u32,
    pub domains: Vec<String>,
}

impl StrictLock {
    /// Lock for this process, ending `remaining_secs` from now.
    pub fn new(remaining_secs: u64, domains: Vec<String>) -> Self {
        let secs = remaining_secs.min(u64::from(u32::MAX)) as i64;
        Self {
            until: Utc::now() + Duration::seconds(secs),
            pid: std::process::id(),
            domains,
        }
    }

    /// `<data_dir>/strict.lock`.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be resolved.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join(LOCK_FILE))
    }

    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.until > now
    }

    /// The live lock in the data directory, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock file exists but cannot be read or parsed.
    /// An unreadable lock is never treated as absent.
    pub fn active() -> Result<Option<Self>, ConfigError> {
        Self::active_at(&Self::path()?)
    }

    /// Like [`StrictLock::active`] for an explicit file. An expired lock is
    /// deleted and reported as absent.
    pub fn active_at(path: &Path) -> Result<Option<Self>, ConfigError> {
        let load_failed = |message: String| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(load_failed(e.to_string())),
        };
        let lock: Self = serde_json::from_str(&content).map_err(|e| load_failed(e.to_string()))?;

        if lock.is_live_at(Utc::now()) {
            return Ok(Some(lock));
        }
        tracing::debug!(path = %path.display(), until = %lock.until, pid = lock.pid, "removing expired strict lock");
        if let Err(e) = std::fs::remove_file(path) {
            tracing::warn!(path = %path.display(), error = %e, "expired strict lock not removed");
        }
        Ok(None)
    }

    /// Write the lock to the data directory and keep it until the guard drops.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock cannot be written.
    pub fn hold(&self) -> Result<HeldLock, ConfigError> {
        self.hold_at(Self::path()?)
    }

    pub fn hold_at(&self, path: PathBuf) -> Result<HeldLock, ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.clone(),
            message,
        };
        let content = serde_json::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| save_failed(e.to_string()))?;
        }
        std::fs::write(&path, content).map_err(|e| save_failed(e.to_string()))?;
        tracing::info!(path = %path.display(), until = %self.until, "strict lock held");
        Ok(HeldLock { path })
    }
}

/// Removes the lock file when dropped.
#[derive(Debug)]
pub struct HeldLock {
    path: PathBuf,
}

impl HeldLock {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for HeldLock {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::info!(path = %self.path.display(), "strict lock released"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %self.path.display(), error = %e, "strict lock not removed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn domains() -> Vec<String> {
        vec!["reddit.com".to_string()]
    }

    #[test]
    fn missing_lock_is_inactive() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(StrictLock::active_at(&dir.path().join(LOCK_FILE)).unwrap(), None);
    }

    #[test]
    fn held_lock_is_active_until_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(LOCK_FILE);
        let lock = StrictLock::new(1800, domains());

        let held = lock.hold_at(path.clone()).unwrap();
        assert_eq!(held.path(), path.as_path());
        assert_eq!(StrictLock::active_at(&path).unwrap(), Some(lock));

        drop(held);
        assert!(!path.exists());
        assert_eq!(StrictLock::active_at(&path).unwrap(), None);
    }

    #[test]
    fn expired_lock_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(LOCK_FILE);
        let lock = StrictLock {
            until: Utc::now() - Duration::seconds(5),
            pid: 1,
            domains: domains(),
        };
        std::fs::write(&path, serde_json::to_string(&lock).unwrap()).unwrap();

        assert_eq!(StrictLock::active_at(&path).unwrap(), None);
        assert!(!path.exists());
    }

    #[test]
    fn unreadable_lock_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(LOCK_FILE);
        std::fs::write(&path, "not a lock").unwrap();
        assert!(matches!(
            StrictLock::active_at(&path),
            Err(ConfigError::LoadFailed { .. })
        ));
        assert!(path.exists());
    }

    #[test]
    fn liveness_follows_end_time() {
        let lock = StrictLock::new(60, domains());
        assert!(lock.is_live_at(Utc::now()));
        assert!(!lock.is_live_at(lock.until));
    }
}
