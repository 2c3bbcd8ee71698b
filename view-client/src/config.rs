//! Configuration loading for arrayview-client.
//!
//! Configuration is loaded from TOML. Every section and field is optional.

use arrayview_core::AutoLoadPolicy;
use serde::Deserialize;
use std::path::PathBuf;

/// Root configuration for an `ArrayLoaderController`.
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
pub struct ControllerConfig {
    /// Region layout configuration.
    #[serde(default)]
    pub layout: LayoutConfig,
    /// Automatic loading configuration.
    #[serde(default)]
    pub autoload: AutoLoadConfig,
    /// Pull-to-refresh configuration.
    #[serde(default)]
    pub pull: PullConfig,
    /// Engine task configuration.
    #[serde(default)]
    pub engine: EngineConfig,
}

/// Region layout configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LayoutConfig {
    /// Show the header region (default: false).
    #[serde(default = "default_header")]
    pub header: bool,
}

/// Automatic loading configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AutoLoadConfig {
    /// Load the first page when an empty loader is attached (default: true).
    #[serde(default = "default_load_on_attach")]
    pub load_on_attach: bool,
    /// Retry a failed next page when its error item scrolls into view
    /// (default: false).
    #[serde(default = "default_retry_failed_on_scroll")]
    pub retry_failed_on_scroll: bool,
}

/// Pull-to-refresh configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PullConfig {
    /// Distance the user must pull to trigger the pull action (default: 44.0).
    #[serde(default = "default_required_amount")]
    pub required_amount: f32,
}

/// Engine task configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EngineConfig {
    /// Capacity of the outcome broadcast channel (default: 64). Slow
    /// observers that fall further behind miss outcomes.
    #[serde(default = "default_outcome_buffer")]
    pub outcome_buffer: usize,
}

fn default_header() -> bool {
    false
}

fn default_load_on_attach() -> bool {
    true
}

fn default_retry_failed_on_scroll() -> bool {
    false
}

fn default_required_amount() -> f32 {
    44.0
}

fn default_outcome_buffer() -> usize {
    64
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            header: default_header(),
        }
    }
}

impl Default for AutoLoadConfig {
    fn default() -> Self {
        Self {
            load_on_attach: default_load_on_attach(),
            retry_failed_on_scroll: default_retry_failed_on_scroll(),
        }
    }
}

impl Default for PullConfig {
    fn default() -> Self {
        Self {
            required_amount: default_required_amount(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            outcome_buffer: default_outcome_buffer(),
        }
    }
}

impl From<&AutoLoadConfig> for AutoLoadPolicy {
    fn from(config: &AutoLoadConfig) -> Self {
        Self {
            load_on_attach: config.load_on_attach,
            retry_failed_on_scroll: config.retry_failed_on_scroll,
        }
    }
}

impl ControllerConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            origin: path.display().to_string(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string cannot be parsed or validated.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::ParseError {
            origin: "<string>".to_string(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges that the TOML types cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = self.pull.required_amount;
        if !required.is_finite() || required <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "pull.required_amount must be finite and positive, got {}",
                required
            )));
        }
        if self.engine.outcome_buffer == 0 {
            return Err(ConfigError::Invalid(
                "engine.outcome_buffer must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// The auto-load policy these settings describe.
    pub fn auto_load_policy(&self) -> AutoLoadPolicy {
        AutoLoadPolicy::from(&self.autoload)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration.
    #[error("failed to parse config {origin}: {source}")]
    ParseError {
        /// Where the configuration came from (file path or `<string>`).
        origin: String,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
    /// A value is out of range.
    #[error("invalid config: {0}")]
    Invalid(String),
}
