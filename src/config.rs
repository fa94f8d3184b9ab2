use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{NoticeError, Result};

/// Environment variable naming the configuration file
pub const CONFIG_ENV: &str = "AFISS_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "afiss.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sky_map: SkyMapConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SkyMapConfig {
    /// Whole-request deadline for a sky-map download
    pub timeout_seconds: u64,
    pub connect_timeout_seconds: u64,
    /// Downloads larger than this are rejected
    pub max_bytes: u64,
    pub user_agent: String,
    /// Where downloads are staged; the system temp dir when unset
    pub staging_dir: Option<PathBuf>,
}

impl Default for SkyMapConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 60,
            connect_timeout_seconds: 10,
            max_bytes: 256 * 1024 * 1024,
            user_agent: concat!("afiss_ingest/", env!("CARGO_PKG_VERSION")).to_string(),
            staging_dir: None,
        }
    }
}

impl SkyMapConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }
}

impl Config {
    /// Load from `path`, or from `$AFISS_CONFIG` / `afiss.toml` when no path is
    /// given. A missing file yields the defaults; an unreadable or invalid one
    /// is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => std::env::var(CONFIG_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH)),
        };

        if !path.exists() {
            debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Config::default());
        }

        let config_content = fs::read_to_string(&path).map_err(|e| {
            NoticeError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        let config = Self::from_toml(&config_content)?;
        info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.sky_map.timeout_seconds == 0 {
            return Err(NoticeError::Config(
                "sky_map.timeout_seconds must be positive".to_string(),
            ));
        }
        if self.sky_map.max_bytes == 0 {
            return Err(NoticeError::Config("sky_map.max_bytes must be positive".to_string()));
        }
        Ok(())
    }
}
