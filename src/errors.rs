// src/errors.rs

//! Errors for the configuration layer.
//!
//! Engine code reports through `anyhow` with context; only config loading
//! needs callers to tell failure kinds apart.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdwatchError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, AdwatchError>;
