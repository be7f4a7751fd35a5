use serde::{Deserialize, Serialize};
use splice_editor::SessionConfig;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_NAME: &str = "splice.config.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("defaultRate must be positive, got {0}")]
    InvalidRate(f64),
}

/// Splice configuration file format
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Address the server listens on
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Name recorded as `created_by` on checkpoints
    #[serde(default = "default_author_name")]
    pub author_name: String,

    /// How often a disconnected client pings the server
    #[serde(default = "default_reconnect_interval_ms")]
    pub reconnect_interval_ms: u64,

    /// Server used by `push` / `pull`; defaults to `http://<bind>`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_url: Option<String>,

    /// Rate given to newly created timelines
    #[serde(default = "default_rate")]
    pub default_rate: f64,
}

fn default_bind() -> String {
    "127.0.0.1:4870".to_string()
}

fn default_author_name() -> String {
    "splice".to_string()
}

fn default_reconnect_interval_ms() -> u64 {
    5000
}

fn default_rate() -> f64 {
    24.0
}

impl Config {
    /// Load `splice.config.json` from a directory, or defaults if absent
    pub fn load(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join(DEFAULT_CONFIG_NAME);
        if path.exists() {
            Self::load_file(&path)
        } else {
            Ok(Config::default())
        }
    }

    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        if !(config.default_rate.is_finite() && config.default_rate > 0.0) {
            return Err(ConfigError::InvalidRate(config.default_rate));
        }
        Ok(config)
    }

    pub fn reconnect_interval(&self) -> Duration {
        Duration::from_millis(self.reconnect_interval_ms)
    }

    /// Settings for client sessions opened against this workspace
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            reconnect_interval: self.reconnect_interval(),
        }
    }

    pub fn remote_url(&self) -> String {
        match &self.remote_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("http://{}", self.bind),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            author_name: default_author_name(),
            reconnect_interval_ms: default_reconnect_interval_ms(),
            remote_url: None,
            default_rate: default_rate(),
        }
    }
}
