use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::request::{FixedInterval, NoRetry, RetryOn, RetryPolicy, DEFAULT_TOTAL_TIME_WAIT};

/// Default retry behavior for client requests (`[request]` in config.toml).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestConfig {
    /// Total time budget for waits between attempts, in milliseconds.
    pub total_wait_ms: u64,
    /// Wait between attempts in milliseconds. When absent, failed attempts are not retried.
    #[serde(default)]
    pub wait_interval_ms: Option<u64>,
    /// Which failures are retried: "any" (default) or "server_errors".
    #[serde(default)]
    pub retry_on: RetryOn,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            total_wait_ms: DEFAULT_TOTAL_TIME_WAIT.as_millis() as u64,
            wait_interval_ms: None,
            retry_on: RetryOn::Any,
        }
    }
}

impl RequestConfig {
    /// Build the retry policy this section describes.
    pub fn policy(&self) -> Box<dyn RetryPolicy + Send + Sync> {
        match self.wait_interval_ms {
            Some(interval) if interval > 0 => Box::new(
                FixedInterval::new(
                    Duration::from_millis(interval),
                    Duration::from_millis(self.total_wait_ms),
                )
                .retry_on(self.retry_on),
            ),
            _ => Box::new(NoRetry),
        }
    }
}

/// Global configuration loaded from `~/.config/cfops/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CfopsConfig {
    /// Retry defaults; built-in values are used when the section is missing.
    #[serde(default)]
    pub request: RequestConfig,
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("cfops")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<CfopsConfig> {
    load_or_init_at(&config_path()?)
}

/// Like [`load_or_init`] for an explicit path.
pub fn load_or_init_at(path: &Path) -> Result<CfopsConfig> {
    if !path.exists() {
        let default_cfg = CfopsConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml).with_context(|| format!("write {}", path.display()))?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: CfopsConfig =
        toml::from_str(&data).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}
