//! Best-effort DNS cache invalidation.
//!
//! After the hosts file changes, the OS resolver may keep serving cached
//! answers until their TTL runs out. Flushing makes a new block take effect
//! immediately. Nothing here is required for correctness: callers receive a
//! [`FlushError`] and are expected to log it and move on.

use std::sync::Arc;

use crate::elevation::{CommandRunner, CommandSpec, Platform};
use crate::error::FlushError;

#[derive(Debug, Clone)]
pub struct DnsFlusher {
    platform: Platform,
    runner: Arc<dyn CommandRunner>,
}

impl DnsFlusher {
    pub fn new(platform: Platform, runner: Arc<dyn CommandRunner>) -> Self {
        Self { platform, runner }
    }

    /// Commands tried for `platform`, each independently of the others.
    pub fn commands(platform: Platform) -> Vec<CommandSpec> {
        match platform {
            Platform::Windows => vec![CommandSpec::new("ipconfig", ["/flushdns"])],
            Platform::MacOs => vec![
                CommandSpec::new("dscacheutil", ["-flushcache"]),
                CommandSpec::new("killall", ["-HUP", "mDNSResponder"]),
            ],
            Platform::Linux => vec![
                CommandSpec::new("resolvectl", ["flush-caches"]),
                CommandSpec::new("systemd-resolve", ["--flush-caches"]),
                CommandSpec::new("service", ["nscd", "restart"]),
            ],
        }
    }

    /// Run every flush command. Fails only if none of them succeeded.
    pub async fn flush(&self) -> Result<(), FlushError> {
        let mut failures = Vec::new();
        let mut flushed = false;
        for command in Self::commands(self.platform) {
            match self.runner.run(&command).await {
                Ok(()) => flushed = true,
                Err(e) => failures.push(e.to_string()),
            }
        }

        if flushed {
            tracing::debug!(platform = ?self.platform, "DNS cache flushed");
            Ok(())
        } else {
            Err(FlushError { failures })
        }
    }
}
