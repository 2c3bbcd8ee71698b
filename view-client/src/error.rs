//! Client error type.

use thiserror::Error;

use crate::config::ConfigError;

/// Client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The engine task is no longer running.
    #[error("engine stopped")]
    EngineStopped,

    /// Configuration error.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}
