//! Common error types for dermal

use thiserror::Error;

/// Common result type for dermal operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the dermal service and client
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// TOML configuration file could not be parsed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}
