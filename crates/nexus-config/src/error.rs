//! Configuration errors

use std::path::PathBuf;

use thiserror::Error;

/// Configuration loading and validation errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file exists but could not be read
    #[error("Failed to read config file {path}: {message}")]
    Read {
        /// Config file path
        path: PathBuf,
        /// I/O error text
        message: String,
    },

    /// Config file is not valid TOML for [`crate::NexusConfig`]
    #[error("Failed to parse config file {path}: {message}")]
    Parse {
        /// Config file path
        path: PathBuf,
        /// TOML error text
        message: String,
    },

    /// Root could not be created or is not a directory
    #[error("Invalid document root {path}: {reason}")]
    InvalidRoot {
        /// Configured root
        path: PathBuf,
        /// What went wrong
        reason: String,
    },

    /// Bundle name not offered by this build
    #[error("Unknown bundle '{name}' (available: {available})")]
    UnknownBundle {
        /// Requested name
        name: String,
        /// Comma-separated list of valid names
        available: String,
    },
}
