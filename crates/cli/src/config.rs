//! CLI settings.
//!
//! Read from `DEEP_CONFIG_PATH` when set, otherwise `~/.config/deep/config.json` on most
//! platforms. A missing or malformed file yields the defaults.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use deep_engine::RenderMode;
use deep_util::expand_tilde;
use dirs_next::config_dir;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Environment variable overriding the config file path.
pub const CONFIG_PATH_ENV: &str = "DEEP_CONFIG_PATH";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CliConfig {
    /// Mode used by `render` when `--mode` is omitted.
    pub default_mode: RenderMode,
    /// List hidden widgets in `visible` output.
    pub show_hidden: bool,
    /// Exit non-zero when `validate` reports issues.
    pub fail_on_issues: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            default_mode: RenderMode::Edit,
            show_hidden: false,
            fail_on_issues: true,
        }
    }
}

impl CliConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&default_config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(config) => Ok(config),
                Err(error) => {
                    warn!(path = %path.display(), error = %error, "Failed to parse config file; using defaults");
                    Ok(Self::default())
                }
            },
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

pub fn default_config_path() -> PathBuf {
    if let Ok(path) = env::var(CONFIG_PATH_ENV)
        && !path.trim().is_empty()
    {
        return expand_tilde(&path);
    }

    config_dir().unwrap_or_else(|| PathBuf::from(".")).join("deep").join("config.json")
}
