//! Application configuration.

use crate::template::Locals;

use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{fs, io};

use serde::Deserialize;
use serde_json::{Map, Value};

/// Settings applied with [`Gantry::configure`](crate::Gantry::configure).
///
/// ```toml
/// hang_timeout_secs = 10
/// views = "views"
/// method_not_allowed = true
///
/// [globals]
/// siteName = "ROUX Meetups"
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// How long a request may go without any unit advancing the
    /// middleware chain before it fails with `504 Gateway Timeout`.
    pub hang_timeout_secs: u64,

    /// Directory templates are loaded from.
    pub views: Option<PathBuf>,

    /// Extension appended to template ids when loading from `views`.
    pub view_extension: String,

    /// Respond `405 Method Not Allowed` when a path matches
    /// routes for other methods only.
    pub method_not_allowed: bool,

    /// Process-wide template variables.
    pub globals: Map<String, Value>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            hang_timeout_secs: 30,
            views: None,
            view_extension: "html".to_owned(),
            method_not_allowed: false,
            globals: Map::new(),
        }
    }
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] io::Error),
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl Config {
    /// Parse and validate configuration from TOML text.
    pub fn from_toml(text: &str) -> Result<Config, ConfigError> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
        let text = fs::read_to_string(path)?;
        Config::from_toml(&text)
    }

    /// The hang timeout as a [`Duration`].
    pub fn hang_timeout(&self) -> Duration {
        Duration::from_secs(self.hang_timeout_secs)
    }

    /// The process-wide template variables.
    pub fn globals(&self) -> Locals {
        Locals::from(self.globals.clone())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.hang_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "hang_timeout_secs must be greater than zero".to_owned(),
            ));
        }

        Ok(())
    }
}
