mod config;
mod lock;

pub use config::{Config, HostsConfig, LoggingConfig, NotificationsConfig};
pub use lock::{HeldLock, StrictLock};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/focos[-dev]/` based on FOCOS_ENV.
///
/// Set FOCOS_ENV=dev to use development data directory. FOCOS_CONFIG_DIR
/// replaces the whole path.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("FOCOS_CONFIG_DIR") {
        Some(explicit) if !explicit.is_empty() => PathBuf::from(explicit),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("FOCOS_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("focos-dev")
            } else {
                base_dir.join("focos")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::NoConfigDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
