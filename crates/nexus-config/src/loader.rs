//! Config file loading and override layering

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::components::{LoggingConfig, QueryConfig};
use crate::error::ConfigError;

/// Bundles enabled when nothing else is configured
pub const DEFAULT_BUNDLES: &[&str] = &["vault"];

const ENV_ROOT: &str = "NEXUS_ROOT";
const ENV_BUNDLES: &str = "NEXUS_BUNDLES";
const ENV_LOG: &str = "NEXUS_LOG";

/// Top-level process configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NexusConfig {
    /// Directory that holds all documents
    pub root: PathBuf,
    /// Bundle names to load, in load order
    pub bundles: Vec<String>,
    /// Logging settings
    pub logging: LoggingConfig,
    /// Query engine defaults
    pub query: QueryConfig,
}

impl Default for NexusConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("vault"),
            bundles: DEFAULT_BUNDLES.iter().map(|s| s.to_string()).collect(),
            logging: LoggingConfig::default(),
            query: QueryConfig::default(),
        }
    }
}

impl NexusConfig {
    /// `~/.config/nexus/config.toml` on Linux, the platform equivalent elsewhere
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("nexus").join("config.toml"))
    }

    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, the default path is used if
    /// present, otherwise built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load_file(path);
        }

        match Self::default_path() {
            Some(path) if path.is_file() => Self::load_file(&path),
            _ => {
                debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Parse a TOML config file
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let mut config = Self::from_toml_str(&content).map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })?;

        // Relative roots are resolved against the config file's directory
        if config.root.is_relative() {
            if let Some(parent) = path.parent() {
                config.root = parent.join(&config.root);
            }
        }

        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, String> {
        let mut config: Self = toml::from_str(content).map_err(|e| e.to_string())?;
        config.bundles = normalize_bundles(config.bundles.iter().map(String::as_str));
        Ok(config)
    }

    /// Apply `NEXUS_*` variables from the process environment
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply `NEXUS_*` variables using a custom lookup
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(root) = lookup(ENV_ROOT).filter(|v| !v.trim().is_empty()) {
            self.root = PathBuf::from(root.trim());
        }
        if let Some(bundles) = lookup(ENV_BUNDLES)
            .map(|v| parse_bundle_list(&v))
            .filter(|b| !b.is_empty())
        {
            self.bundles = bundles;
        }
        if let Some(level) = lookup(ENV_LOG).filter(|v| !v.trim().is_empty()) {
            self.logging.level = level.trim().to_string();
        }
    }

    /// Apply command-line overrides, which win over every other source
    pub fn with_overrides(mut self, root: Option<PathBuf>, bundles: Option<Vec<String>>) -> Self {
        if let Some(root) = root {
            self.root = root;
        }
        if let Some(bundles) = bundles {
            self.bundles = normalize_bundles(bundles.iter().map(String::as_str));
        }
        self
    }

    /// Reject bundle names that are not in `available`
    pub fn validate_bundles(&self, available: &[&str]) -> Result<(), ConfigError> {
        for name in &self.bundles {
            if !available.contains(&name.as_str()) {
                return Err(ConfigError::UnknownBundle {
                    name: name.clone(),
                    available: available.join(", "),
                });
            }
        }
        Ok(())
    }

    /// Create the document root if missing and return it
    pub fn ensure_root(&self) -> Result<PathBuf, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidRoot {
            path: self.root.clone(),
            reason,
        };

        if self.root.exists() && !self.root.is_dir() {
            return Err(invalid("not a directory".to_string()));
        }

        std::fs::create_dir_all(&self.root).map_err(|e| invalid(e.to_string()))?;
        Ok(self.root.clone())
    }
}

/// Split a comma-separated bundle list, lowercasing and dropping duplicates
pub fn parse_bundle_list(raw: &str) -> Vec<String> {
    normalize_bundles(raw.split(','))
}

fn normalize_bundles<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for name in names {
        let name = name.trim().to_lowercase();
        if !name.is_empty() && !out.contains(&name) {
            out.push(name);
        }
    }
    out
}
