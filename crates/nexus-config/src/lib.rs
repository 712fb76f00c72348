//! # Nexus Configuration
//!
//! Layered process configuration for the document backend. Sources are
//! applied in increasing precedence:
//!
//! 1. Built-in defaults ([`NexusConfig::default`])
//! 2. A TOML file (explicit `--config` path, else `~/.config/nexus/config.toml`)
//! 3. Environment variables (`NEXUS_ROOT`, `NEXUS_BUNDLES`, `NEXUS_LOG`)
//! 4. Command-line overrides ([`NexusConfig::with_overrides`])
//!
//! ```rust,no_run
//! use nexus_config::NexusConfig;
//!
//! let mut config = NexusConfig::load(None)?;
//! config.apply_env();
//! let root = config.ensure_root()?;
//! # Ok::<(), nexus_config::ConfigError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod components;
mod error;
mod loader;

pub use components::{LoggingConfig, OutputFormat, QueryConfig};
pub use error::ConfigError;
pub use loader::{parse_bundle_list, NexusConfig, DEFAULT_BUNDLES};
