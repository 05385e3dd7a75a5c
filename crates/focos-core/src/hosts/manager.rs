//! Hosts block manager.
//!
//! Pipeline for every request:
//!
//! ```text
//! read hosts -> strip managed block -> (encode new block) -> commit via elevation -> flush DNS
//! ```
//!
//! Writes are serialized by an in-flight guard: a second request waits until
//! the first one's elevation prompt has been answered.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::marker;
use super::Blocker;
use crate::dns::DnsFlusher;
use crate::domain::normalize_all;
use crate::elevation::{self, CommandRunner, ElevationStrategy, Platform, SystemRunner};
use crate::error::BlockError;
use crate::storage::HostsConfig;

#[derive(Debug)]
pub struct HostsBlockManager {
    hosts_path: PathBuf,
    strategy: Box<dyn ElevationStrategy>,
    flusher: Option<DnsFlusher>,
    in_flight: Mutex<()>,
}

impl HostsBlockManager {
    /// Manager writing `hosts_path` through `strategy`, without DNS flushing.
    pub fn new(hosts_path: PathBuf, strategy: Box<dyn ElevationStrategy>) -> Self {
        Self {
            hosts_path,
            strategy,
            flusher: None,
            in_flight: Mutex::new(()),
        }
    }

    pub fn with_dns_flusher(mut self, flusher: DnsFlusher) -> Self {
        self.flusher = Some(flusher);
        self
    }

    /// Manager for the running platform, configured from `config`.
    pub fn from_config(config: &HostsConfig) -> Self {
        Self::for_platform(Platform::current(), config, Arc::new(SystemRunner))
    }

    pub fn for_platform(
        platform: Platform,
        config: &HostsConfig,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        let hosts_path = config
            .path
            .clone()
            .unwrap_or_else(|| platform.default_hosts_path());
        let staging_dir = config
            .temp_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir);
        let strategy =
            elevation::strategy_for(platform, config.elevation, runner.clone(), staging_dir);

        let manager = Self::new(hosts_path, strategy);
        if config.flush_dns {
            manager.with_dns_flusher(DnsFlusher::new(platform, runner))
        } else {
            manager
        }
    }

    pub fn hosts_path(&self) -> &Path {
        &self.hosts_path
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Replace the managed block with redirects for `domains`.
    ///
    /// Fails with [`BlockError::EmptyInput`] before touching the file when no
    /// usable domain remains after normalization.
    pub async fn apply<S: AsRef<str> + Sync>(&self, domains: &[S]) -> Result<(), BlockError> {
        let domains = normalize_all(domains);
        if domains.is_empty() {
            return Err(BlockError::EmptyInput);
        }

        let _guard = self.in_flight.lock().await;
        let current = self.read_current().await?;
        let base = marker::strip(&current)?;
        let block = marker::encode(&domains);
        let trimmed = base.trim_end();
        let next = if trimmed.is_empty() {
            block
        } else {
            format!("{trimmed}\n{block}")
        };

        if next == current {
            tracing::debug!(domains = domains.len(), "managed block already up to date");
            return Ok(());
        }

        self.commit(&next).await?;
        tracing::info!(
            domains = domains.len(),
            path = %self.hosts_path.display(),
            "blocked sites"
        );
        Ok(())
    }

    /// Remove the managed block. A no-op when there is none.
    pub async fn clear(&self) -> Result<(), BlockError> {
        let _guard = self.in_flight.lock().await;
        let current = self.read_current().await?;
        if !marker::contains_block(&current)? {
            tracing::debug!("no managed block present");
            return Ok(());
        }

        let base = marker::strip(&current)?;
        let trimmed = base.trim_end();
        let next = if trimmed.is_empty() {
            String::new()
        } else {
            format!("{trimmed}\n")
        };

        self.commit(&next).await?;
        tracing::info!(path = %self.hosts_path.display(), "unblocked sites");
        Ok(())
    }

    /// Domains recorded in the current managed block, if any.
    pub async fn current_block(&self) -> Result<Option<Vec<String>>, BlockError> {
        let current = self.read_current().await?;
        marker::extract(&current)
    }

    async fn read_current(&self) -> Result<String, BlockError> {
        match tokio::fs::read_to_string(&self.hosts_path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(BlockError::Io(e)),
        }
    }

    async fn commit(&self, content: &str) -> Result<(), BlockError> {
        tracing::debug!(strategy = self.strategy.name(), "committing hosts file");
        self.strategy.commit(&self.hosts_path, content).await?;

        if let Some(flusher) = &self.flusher {
            if let Err(e) = flusher.flush().await {
                tracing::warn!(error = %e, "ignoring DNS cache flush failure");
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Blocker for HostsBlockManager {
    async fn apply(&self, domains: &[String]) -> Result<(), BlockError> {
        HostsBlockManager::apply(self, domains).await
    }

    async fn clear(&self) -> Result<(), BlockError> {
        HostsBlockManager::clear(self).await
    }
}
