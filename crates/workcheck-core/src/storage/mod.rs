mod config;

pub use config::{CheckinConfig, Config, LogConfig, NotificationsConfig, RandomConfig};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the workcheck data directory, creating it if needed.
///
/// `WORKCHECK_CONFIG_DIR` wins when set. Otherwise `~/.config/workcheck[-dev]/`
/// based on WORKCHECK_ENV (set WORKCHECK_ENV=dev for the development
/// directory).
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("WORKCHECK_CONFIG_DIR") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("WORKCHECK_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("workcheck-dev")
            } else {
                base_dir.join("workcheck")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
