use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::scanner::parse_size;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub analyze: AnalyzeConfig,
}

/// Defaults for the analyze command; command-line flags take precedence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzeConfig {
    /// Minimum size to list, e.g. "1MB"
    pub threshold: String,
    /// Number of rows shown
    pub top: i64,
    /// Only consider hidden files and directories
    pub only_hidden: bool,
    /// Follow symbolic links while scanning
    pub follow_symlinks: bool,
    /// Skip /proc, /dev, /sys and /run below the scan root
    pub skip_virtual_fs: bool,
}

impl Default for AnalyzeConfig {
    fn default() -> Self {
        Self {
            threshold: "1MB".to_string(),
            top: 20,
            only_hidden: false,
            follow_symlinks: true,
            skip_virtual_fs: true,
        }
    }
}

impl AnalyzeConfig {
    /// Threshold in bytes. Valid once the config has passed [`Config::validate`].
    pub fn threshold_bytes(&self) -> Option<u64> {
        parse_size(&self.threshold)
    }
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, the per-user config file is
    /// read if present and defaults are used otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(p) => p,
                None => return Ok(Self::default()),
            },
        };

        let content = fs::read_to_string(&path).map_err(|source| ConfigError::ReadError {
            path: path.clone(),
            source,
        })?;

        let config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ParseError {
                path: path.clone(),
                source,
            })?;

        config.validate()?;
        tracing::debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    /// `$XDG_CONFIG_HOME/disk-cleaner/config.toml` or the platform equivalent.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("disk-cleaner").join("config.toml"))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.analyze.threshold_bytes().is_none() {
            return Err(ConfigError::Invalid(format!(
                "analyze.threshold '{}' is not a valid size",
                self.analyze.threshold
            )));
        }
        Ok(())
    }
}
