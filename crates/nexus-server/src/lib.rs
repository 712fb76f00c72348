//! # Nexus Server
//!
//! Process wiring for the `nexus-server` binary: configuration layering,
//! logging, bundle selection and the stdio transport.

#![warn(clippy::all)]

pub mod cli;
pub mod transport;

use std::sync::Arc;

use anyhow::{Context, Result};
use nexus_config::NexusConfig;
use nexus_core::DocumentStore;
use nexus_plugins::{Bundle, PluginHost};
use nexus_tools::{builtin_bundle, Vault, BUILTIN_BUNDLES};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

/// Defaults, then the config file, then `NEXUS_*` variables, then flags
pub fn resolve_config(cli: &Cli) -> Result<NexusConfig> {
    let mut config = NexusConfig::load(cli.config.as_deref())?;
    config.apply_env();
    let config = config.with_overrides(cli.root.clone(), cli.bundles.clone());
    config.validate_bundles(BUILTIN_BUNDLES)?;
    Ok(config)
}

/// Install the stderr subscriber; stdout is reserved for responses
pub fn init_logging(config: &NexusConfig, verbosity: Option<&str>) {
    let directive = verbosity.unwrap_or(config.logging.level.as_str());
    let filter = EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(config.logging.ansi)
        .init();
}

/// Open the store and start the configured bundles
pub async fn build_host(config: &NexusConfig) -> Result<PluginHost> {
    let root = config.ensure_root()?;
    let store = DocumentStore::open(&root)
        .await
        .with_context(|| format!("Failed to open document root {}", root.display()))?;
    let vault = Vault::new(store, config.query.clone());

    let bundles: Vec<(String, Arc<dyn Bundle>)> = config
        .bundles
        .iter()
        .filter_map(|name| builtin_bundle(name, &vault).map(|bundle| (name.clone(), bundle)))
        .collect();

    let mut host = PluginHost::new();
    host.start(bundles).await?;
    info!(
        "Started bundles [{}] at {}",
        host.bundle_names().join(", "),
        root.display()
    );
    Ok(host)
}
